use tracing::{debug, error, info, warn};

pub fn log_request_received(endpoint: &str, method: &str) {
    info!("Request received: {} {}", method, endpoint);
}

pub fn log_request_processed(endpoint: &str, status: u16, duration_ms: u64) {
    info!("Request processed: {} - Status: {} - Duration: {}ms",
          endpoint, status, duration_ms);
}

pub fn log_config_loaded(env: &str) {
    info!("Configuration loaded successfully for environment: {}", env);
}

pub fn log_server_startup(port: u16) {
    info!("🚀 verificar-prazos server starting on port {}", port);
}

pub fn log_server_ready(port: u16) {
    info!("✅ Server ready and listening on http://0.0.0.0:{}", port);
}

pub fn log_health_check() {
    debug!("Health check requested");
}

pub fn log_scan_started(run_id: &str, salespeople: usize, companies: usize) {
    info!("⏱️ Verificação de prazos iniciada (run {}): {} vendedores em {} empresas",
          run_id, salespeople, companies);
}

pub fn log_scan_finished(run_id: &str, reassigned: usize, conflicts: usize, failures: usize, duration_ms: i64) {
    info!("✅ Verificação de prazos concluída (run {}): {} remanejados, {} conflitos, {} falhas em {}ms",
          run_id, reassigned, conflicts, failures, duration_ms);
}

pub fn log_scan_failed(error: &str) {
    error!("❌ Verificação de prazos abortada: {}", error);
}

pub fn log_lead_reassigned(lead_id: &str, from: &str, to: &str, reason: &str) {
    info!("🔀 Lead {} remanejado de {} para {} ({})", lead_id, from, to, reason);
}

pub fn log_lead_owner_changed(lead_id: &str, expected_owner: &str) {
    warn!("⚠️ Lead {} não pertence mais a {} - remanejamento ignorado", lead_id, expected_owner);
}

pub fn log_lead_query_error(salesperson_id: &str, rule: &str, error: &str) {
    error!("Error fetching overdue {} leads for salesperson {}: {}", rule, salesperson_id, error);
}

pub fn log_lead_update_error(lead_id: &str, rule: &str, error: &str) {
    error!("Error reassigning {} lead {}: {}", rule, lead_id, error);
}

pub fn log_stage_not_configured(company_id: &str, stage_name: &str, closest: Option<&str>) {
    match closest {
        Some(candidate) => info!(
            "Etapa '{}' não configurada na empresa {} (nome parecido encontrado: '{}')",
            stage_name, company_id, candidate
        ),
        None => info!("Etapa '{}' não configurada na empresa {}", stage_name, company_id),
    }
}

pub fn log_invalid_settings(salesperson_id: &str, error: &str) {
    warn!("⚠️ prospect_ai_settings inválido para vendedor {}: {}", salesperson_id, error);
}

pub fn log_info(message: &str) {
    info!("{}", message);
}

pub fn log_error(message: &str) {
    error!("{}", message);
}

pub fn log_warning(message: &str) {
    warn!("{}", message);
}
