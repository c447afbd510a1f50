use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use verificar_prazos::utils::logging::*;
use verificar_prazos::AppState;

pub async fn health_check() -> Json<Value> {
    log_health_check();

    Json(json!({
        "status": "healthy",
        "service": "verificar-prazos",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

pub async fn ready_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    let store_status = match state.store.ping().await {
        Ok(()) => "connected",
        Err(e) => {
            log_warning(&format!("⚠️ Store indisponível: {}", e));
            "disconnected"
        }
    };

    let ready = store_status == "connected";
    let response = json!({
        "ready": ready,
        "service": "verificar-prazos",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "dependencies": {
            "store": {
                "backend": state.store.backend_name(),
                "status": store_status
            }
        }
    });

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

pub async fn status_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let scans = state.scans.status().await;

    Json(json!({
        "service": "verificar-prazos",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "store": state.store.backend_name(),
        "scanner": {
            "salesperson_role": state.settings.scanner.salesperson_role,
            "concurrency": state.settings.scanner.concurrency,
            "interval_seconds": state.settings.scanner.interval_seconds,
            "scheduler_running": scans.scheduler_running,
            "runs": scans.runs,
            "last_report": scans.last_report,
            "last_error": scans.last_error,
            "last_error_at": scans.last_error_at
        }
    }))
}
