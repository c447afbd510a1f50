use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    StoreError(String),
    ConfigError(String),
    JsonError(serde_json::Error),
    ValidationError(String),
    NotFound(String),
    Conflict(String),
    InternalError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::StoreError(msg) => write!(f, "Store error: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::JsonError(err) => write!(f, "JSON error: {}", err),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::JsonError(err)
    }
}

impl From<supabase::SupabaseError> for AppError {
    fn from(err: supabase::SupabaseError) -> Self {
        match err {
            supabase::SupabaseError::ConfigError(msg) => AppError::ConfigError(msg),
            supabase::SupabaseError::ApiError { message, .. } => AppError::StoreError(message),
            other => AppError::StoreError(other.to_string()),
        }
    }
}

impl AppError {
    /// Mensagem sem o prefixo da variante
    pub fn message(&self) -> String {
        match self {
            AppError::StoreError(msg)
            | AppError::ConfigError(msg)
            | AppError::ValidationError(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::InternalError(msg) => msg.clone(),
            AppError::JsonError(err) => err.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::StoreError(_) => StatusCode::BAD_GATEWAY,
            AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::JsonError(_) => StatusCode::BAD_REQUEST,
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({
            "error": self.message(),
            "status": status.as_u16()
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supabase_errors_map_to_store_error() {
        let err: AppError = supabase::SupabaseError::ApiError {
            status: 500,
            message: "boom".to_string(),
        }
        .into();
        assert!(matches!(err, AppError::StoreError(_)));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.message(), "boom");
        assert_eq!(err.to_string(), "Store error: boom");
    }

    #[test]
    fn test_message_has_no_prefix() {
        assert_eq!(AppError::StoreError("upstream down".into()).message(), "upstream down");
        assert_eq!(AppError::NotFound("lead l-1".into()).message(), "lead l-1");

        let config: AppError = supabase::SupabaseError::ConfigError("SUPABASE_URL ausente".into()).into();
        assert!(matches!(config, AppError::ConfigError(_)));
        assert_eq!(config.message(), "SUPABASE_URL ausente");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::ValidationError("x".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
