use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use std::sync::Arc;
use tokio::time::Instant;

use verificar_prazos::utils::logging::*;
use verificar_prazos::AppState;

/// Dispara uma verificação completa de prazos.
///
/// Chamado pelo cron externo (pg_cron / Cloud Scheduler). O corpo da requisição é
/// ignorado. Falha fatal (empresas ou vendedores inacessíveis) responde 500 em texto puro.
pub async fn handle_verificar_prazos(State(state): State<Arc<AppState>>) -> Response {
    let start_time = Instant::now();
    log_request_received("/verificar-prazos", "POST");

    match state.scans.run_once().await {
        Ok(report) => {
            log_request_processed("/verificar-prazos", 200, start_time.elapsed().as_millis() as u64);
            (StatusCode::OK, Json(json!({ "message": report.message() }))).into_response()
        }
        Err(e) => {
            log_error(&format!("❌ Verificação de prazos falhou: {}", e));
            log_request_processed("/verificar-prazos", 500, start_time.elapsed().as_millis() as u64);
            (StatusCode::INTERNAL_SERVER_ERROR, e.message()).into_response()
        }
    }
}
