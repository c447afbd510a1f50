//! Job verificar-prazos
//!
//! - Gatilho HTTP `/verificar-prazos` (cron externo) e agendador interno opcional
//! - Regras de prazo por vendedor (primeiro contato / primeiro feedback)
//! - Remanejamento condicional no dono atual, auditado em `details`

use anyhow::Context;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use verificar_prazos::{
    build_store, config::Settings, middleware as app_middleware, services::SystemClock,
    utils::logging::*, AppState,
};

mod handlers;

use handlers::{
    handle_reassign_lead, handle_verificar_prazos, health_check, ready_check, status_check,
};

/// Rotas da aplicação (gatilhos protegidos por `TRIGGER_API_KEY`)
pub fn app_router(state: Arc<AppState>) -> Router {
    let public = Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .route("/status", get(status_check))
        .with_state(state.clone());

    let triggers = Router::new()
        .route("/verificar-prazos", post(handle_verificar_prazos).get(handle_verificar_prazos))
        .route("/leads/:id/reassign", post(handle_reassign_lead))
        .layer(middleware::from_fn(app_middleware::require_trigger_key))
        .with_state(state);

    public.merge(triggers).layer(TraceLayer::new_for_http())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 🔧 Carregar variáveis de ambiente do arquivo .env (se existir)
    let dotenv_loaded = dotenvy::dotenv().is_ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if dotenv_loaded {
        tracing::info!("✅ Arquivo .env carregado com sucesso");
    } else {
        tracing::debug!("Arquivo .env não encontrado - usando variáveis de ambiente do sistema");
    }

    let settings = Settings::new().context("Failed to load settings")?;
    log_config_loaded(&std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string()));

    let store = build_store(&settings).context("Failed to initialize lead store")?;
    let state = Arc::new(AppState::new(settings.clone(), store, Arc::new(SystemClock)));

    let scheduler = state.scans.start(settings.scanner.interval_seconds).await;
    if scheduler.is_none() {
        log_info("ℹ️ Agendador interno desabilitado - aguardando gatilho em /verificar-prazos");
    }

    let app = app_router(state.clone());

    let port = settings.server.port;
    let listener = TcpListener::bind(format!("{}:{}", settings.server.host, port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;

    log_server_startup(port);
    log_server_ready(port);

    // Graceful shutdown com signal handling
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    state.scans.stop().await;
    log_info("🛑 Server shut down gracefully");
    Ok(())
}

/// Signal handler para graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log_error(&format!("Failed to install Ctrl+C handler: {}", e));
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log_error(&format!("Failed to install SIGTERM handler: {}", e));
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log_info("🛑 Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            log_info("🛑 Received SIGTERM, shutting down gracefully...");
        }
    }
}
