//! Tipos de erro para o crate supabase

use thiserror::Error;

/// Erros do cliente PostgREST
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// Erro de requisição HTTP
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Erro da API (status code não-2xx)
    #[error("Supabase API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Erro de parsing JSON
    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Erro de configuração (URL ou chave ausente)
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl SupabaseError {
    /// Status HTTP retornado pela API, quando houver
    pub fn status(&self) -> Option<u16> {
        match self {
            SupabaseError::ApiError { status, .. } => Some(*status),
            SupabaseError::HttpError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Tipo Result padrão para o crate
pub type Result<T> = std::result::Result<T, SupabaseError>;
