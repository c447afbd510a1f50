// Biblioteca do job verificar-prazos
// Expõe módulos para uso em testes e no binário

pub mod config;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use std::sync::Arc;

use config::{Settings, StoreBackend};
use services::{
    Clock, DeadlineScanner, InMemoryLeadStore, LeadStore, ScanCoordinator, SupabaseLeadStore,
};
use utils::logging::log_info;
use utils::AppResult;

// AppState é definido aqui para ser compartilhado
#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub store: Arc<dyn LeadStore>,
    pub clock: Arc<dyn Clock>,
    pub scans: ScanCoordinator,
}

impl AppState {
    pub fn new(settings: Settings, store: Arc<dyn LeadStore>, clock: Arc<dyn Clock>) -> Self {
        let scanner = DeadlineScanner::new(store.clone(), clock.clone(), settings.scanner.clone());
        Self {
            scans: ScanCoordinator::new(Arc::new(scanner)),
            settings,
            store,
            clock,
        }
    }
}

/// Cria o store configurado em `store.backend`
pub fn build_store(settings: &Settings) -> AppResult<Arc<dyn LeadStore>> {
    match settings.store.backend {
        StoreBackend::Supabase => {
            let store = SupabaseLeadStore::from_settings(&settings.supabase)?;
            log_info(&format!("🗄️ Store: Supabase ({})", settings.supabase.url));
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            let store = match settings.store.seed_file.as_deref() {
                Some(path) => {
                    log_info(&format!("🧪 Store: memória, seed {}", path));
                    InMemoryLeadStore::from_seed_file(path)?
                }
                None => {
                    log_info("🧪 Store: memória (vazio)");
                    InMemoryLeadStore::new()
                }
            };
            Ok(Arc::new(store))
        }
    }
}
