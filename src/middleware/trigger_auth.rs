//! Middleware de autenticação para os gatilhos do job
//!
//! Protege `/verificar-prazos` e `/leads/*` (chamados pelo cron do Supabase ou pelo
//! painel). A chave vem no header `X-Trigger-Key` ou em `Authorization: Bearer <key>`.

use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub const TRIGGER_KEY_HEADER: &str = "x-trigger-key";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerAccess {
    Granted,
    /// Chave configurada mas ausente/errada na requisição
    Denied,
    /// Sem chave configurada em desenvolvimento: libera com warning
    OpenInDevelopment,
    /// Sem chave configurada em produção: bloqueia
    Misconfigured,
}

/// Decide o acesso a partir da chave esperada, da chave recebida e do ambiente
pub fn authorize(expected: Option<&str>, provided: Option<&str>, is_production: bool) -> TriggerAccess {
    match (expected.filter(|key| !key.is_empty()), provided, is_production) {
        (Some(expected), Some(provided), _) if expected == provided => TriggerAccess::Granted,
        (Some(_), _, _) => TriggerAccess::Denied,
        (None, _, false) => TriggerAccess::OpenInDevelopment,
        (None, _, true) => TriggerAccess::Misconfigured,
    }
}

/// Chave enviada pelo chamador (`X-Trigger-Key` tem precedência sobre Bearer)
pub fn provided_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(TRIGGER_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
        })
        .map(str::trim)
}

/// Middleware que requer `TRIGGER_API_KEY` para disparar o job
///
/// - Em desenvolvimento: se `TRIGGER_API_KEY` não estiver configurado, permite acesso (warning no log)
/// - Em produção (`RUST_ENV=production`): se não estiver configurado, bloqueia (503)
pub async fn require_trigger_key(
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let expected_key = std::env::var("TRIGGER_API_KEY").ok();
    let is_production = std::env::var("RUST_ENV")
        .unwrap_or_else(|_| "development".to_string())
        == "production";

    match authorize(expected_key.as_deref(), provided_key(&headers), is_production) {
        TriggerAccess::Granted => {
            tracing::debug!("✅ Trigger access granted");
            Ok(next.run(request).await)
        }
        TriggerAccess::Denied => {
            tracing::warn!(
                "❌ Trigger access denied - invalid or missing X-Trigger-Key for {}",
                request.uri().path()
            );
            Err(unauthorized_response())
        }
        TriggerAccess::OpenInDevelopment => {
            tracing::warn!(
                "⚠️  TRIGGER_API_KEY not configured - allowing access in development mode"
            );
            Ok(next.run(request).await)
        }
        TriggerAccess::Misconfigured => {
            tracing::error!("🚨 TRIGGER_API_KEY not configured in production! Blocking trigger.");
            Err(service_unavailable_response())
        }
    }
}

fn unauthorized_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "Unauthorized",
            "message": "Missing or invalid X-Trigger-Key header",
            "hint": "Send X-Trigger-Key or Authorization: Bearer with the trigger key"
        })),
    )
        .into_response()
}

fn service_unavailable_response() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({
            "error": "Service Unavailable",
            "message": "TRIGGER_API_KEY not configured on server",
        })),
    )
        .into_response()
}
