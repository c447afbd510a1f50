//! Cliente HTTP para a API REST (PostgREST) do Supabase

use crate::error::{Result, SupabaseError};
use crate::query::Query;
use reqwest::{Client as HttpClient, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Cliente para as tabelas expostas pelo PostgREST
///
/// Usa a chave `service_role`; as credenciais ficam no próprio cliente (passado
/// explicitamente para quem precisa), nunca em estado global.
#[derive(Clone)]
pub struct SupabaseClient {
    http_client: HttpClient,
    base_url: String,
    service_key: String,
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base_url", &self.base_url)
            .field("service_key", &"<redacted>")
            .finish()
    }
}

impl SupabaseClient {
    /// Cria um novo cliente
    ///
    /// # Timeouts
    ///
    /// - Total: 30s
    /// - Connect: 5s
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Result<Self> {
        Self::with_timeouts(base_url, service_key, 30, 5)
    }

    /// Cria um novo cliente com timeouts customizados
    pub fn with_timeouts(
        base_url: impl Into<String>,
        service_key: impl Into<String>,
        total_timeout_secs: u64,
        connect_timeout_secs: u64,
    ) -> Result<Self> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        let service_key = service_key.into();

        if base_url.is_empty() {
            return Err(SupabaseError::ConfigError("SUPABASE_URL não configurado".to_string()));
        }
        if service_key.trim().is_empty() {
            return Err(SupabaseError::ConfigError("SERVICE_ROLE_KEY não configurado".to_string()));
        }

        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(total_timeout_secs))
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .build()
            .map_err(|e| SupabaseError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
            service_key,
        })
    }

    /// URL base do projeto (sem `/rest/v1`)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn table_url(&self, table: &str, query: &Query) -> String {
        let query_string = query.to_string();
        if query_string.is_empty() {
            format!("{}/rest/v1/{}", self.base_url, table)
        } else {
            format!("{}/rest/v1/{}?{}", self.base_url, table, query_string)
        }
    }

    /// `GET /rest/v1/{table}` com os filtros da query
    pub async fn select<T: DeserializeOwned>(&self, table: &str, query: &Query) -> Result<Vec<T>> {
        let url = self.table_url(table, query);

        tracing::debug!("GET {}", url);

        let response = self
            .http_client
            .get(&url)
            .header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
            .header("Accept", "application/json")
            .send()
            .await?;

        let response = self.handle_response(response).await?;
        let rows = response.json().await?;
        Ok(rows)
    }

    /// `PATCH /rest/v1/{table}` nas linhas que casam com a query
    ///
    /// Retorna as linhas atualizadas (`Prefer: return=representation`). Vetor vazio
    /// significa que nenhum registro casou com os filtros.
    pub async fn update<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query,
        body: &Value,
    ) -> Result<Vec<T>> {
        if query.filters().is_empty() {
            return Err(SupabaseError::ConfigError(format!(
                "Refusing unfiltered update on table '{}'",
                table
            )));
        }

        let url = self.table_url(table, query);

        tracing::debug!("PATCH {} with body: {}", url, serde_json::to_string(body).unwrap_or_default());

        let response = self
            .http_client
            .patch(&url)
            .header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
            .header("Content-Type", "application/json")
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;

        let response = self.handle_response(response).await?;
        let rows = response.json().await?;
        Ok(rows)
    }

    /// Trata a resposta HTTP, convertendo status não-2xx em [`SupabaseError::ApiError`]
    async fn handle_response(&self, response: Response) -> Result<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let status_code = status.as_u16();
        let error_body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());

        tracing::error!("Supabase API error ({}): {}", status_code, error_body);

        // PostgREST responde {code, message, details, hint}
        let message = if let Ok(json) = serde_json::from_str::<Value>(&error_body) {
            json.get("message")
                .or_else(|| json.get("error"))
                .or_else(|| json.get("hint"))
                .or_else(|| json.get("details"))
                .and_then(|v| v.as_str())
                .unwrap_or(&error_body)
                .to_string()
        } else {
            error_body
        };

        Err(SupabaseError::ApiError {
            status: status_code,
            message,
        })
    }
}
