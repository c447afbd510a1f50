//! Coordenação das execuções do job
//!
//! O gatilho HTTP e o agendador interno passam pelo mesmo [`ScanCoordinator`]: as
//! execuções são serializadas por um mutex, então duas verificações nunca rodam ao
//! mesmo tempo neste processo. O último relatório fica guardado para o `/status`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::services::deadline_scanner::{DeadlineScanner, ScanReport};
use crate::utils::logging::*;
use crate::utils::AppResult;

/// Resumo para o `/status`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanStatus {
    pub runs: u64,
    pub last_report: Option<ScanReport>,
    pub last_error: Option<String>,
    pub last_error_at: Option<DateTime<Utc>>,
    pub scheduler_running: bool,
}

#[derive(Clone)]
pub struct ScanCoordinator {
    scanner: Arc<DeadlineScanner>,
    run_lock: Arc<Mutex<()>>,
    status: Arc<RwLock<ScanStatus>>,
    running: Arc<RwLock<bool>>,
    /// Incrementada a cada start/stop; um loop só roda enquanto a sua geração é a atual
    generation: Arc<AtomicU64>,
}

impl ScanCoordinator {
    pub fn new(scanner: Arc<DeadlineScanner>) -> Self {
        Self {
            scanner,
            run_lock: Arc::new(Mutex::new(())),
            status: Arc::new(RwLock::new(ScanStatus::default())),
            running: Arc::new(RwLock::new(false)),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn scanner(&self) -> &Arc<DeadlineScanner> {
        &self.scanner
    }

    /// Executa uma verificação completa, esperando a anterior terminar
    pub async fn run_once(&self) -> AppResult<ScanReport> {
        let _guard = self.run_lock.lock().await;

        let result = self.scanner.run().await;

        let mut status = self.status.write().await;
        status.runs += 1;
        match &result {
            Ok(report) => {
                status.last_report = Some(report.clone());
                status.last_error = None;
                status.last_error_at = None;
            }
            Err(e) => {
                status.last_error = Some(e.to_string());
                status.last_error_at = Some(Utc::now());
            }
        }

        result
    }

    pub async fn status(&self) -> ScanStatus {
        let mut status = self.status.read().await.clone();
        status.scheduler_running = *self.running.read().await;
        status
    }

    /// Inicia o agendador interno. `None` quando o intervalo é 0 ou ele já está rodando.
    pub async fn start(&self, interval_seconds: u64) -> Option<JoinHandle<()>> {
        if interval_seconds == 0 {
            return None;
        }

        let mut running = self.running.write().await;
        if *running {
            log_warning("⚠️ Agendador de prazos já está rodando");
            return None;
        }
        *running = true;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        drop(running);

        let coordinator = self.clone();

        Some(tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(interval_seconds));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            log_info(&format!(
                "⏰ Agendador de prazos iniciado (a cada {}s)",
                interval_seconds
            ));

            loop {
                ticker.tick().await;

                if !coordinator.is_current(generation).await {
                    break;
                }

                if let Err(e) = coordinator.run_once().await {
                    log_error(&format!("❌ Verificação agendada falhou: {}", e));
                }
            }

            log_info("⏹️ Agendador de prazos parado");
        }))
    }

    pub async fn stop(&self) {
        let mut running = self.running.write().await;
        *running = false;
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    async fn is_current(&self, generation: u64) -> bool {
        let running = self.running.read().await;
        *running && self.generation.load(Ordering::SeqCst) == generation
    }
}
