use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub supabase: SupabaseSettings,
    pub store: StoreSettings,
    pub scanner: ScannerSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct SupabaseSettings {
    pub url: String,
    pub service_role_key: String,
    pub timeout_seconds: u64,
    pub connect_timeout_seconds: u64,
    pub tables: TableNames,
}

impl Default for SupabaseSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            service_role_key: String::new(),
            timeout_seconds: 30,
            connect_timeout_seconds: 5,
            tables: TableNames::default(),
        }
    }
}

// Nunca imprimir a service_role key nos logs
impl fmt::Debug for SupabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseSettings")
            .field("url", &self.url)
            .field("service_role_key", &if self.service_role_key.is_empty() { "<empty>" } else { "<redacted>" })
            .field("timeout_seconds", &self.timeout_seconds)
            .field("connect_timeout_seconds", &self.connect_timeout_seconds)
            .field("tables", &self.tables)
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct TableNames {
    pub companies: String,
    pub team_members: String,
    pub leads: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            companies: "companies".to_string(),
            team_members: "team_members".to_string(),
            leads: "prospectai".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Supabase,
    Memory,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    /// Seed JSON do backend em memória (desenvolvimento local)
    pub seed_file: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ScannerSettings {
    /// Só membros com este papel são verificados (e entram no pool de remanejamento)
    pub salesperson_role: String,
    /// Quantos vendedores são avaliados em paralelo
    pub concurrency: usize,
    /// Intervalo do agendador interno; 0 desabilita
    pub interval_seconds: u64,
    pub stages: StageNames,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self {
            salesperson_role: "Vendedor".to_string(),
            concurrency: 4,
            interval_seconds: 0,
            stages: StageNames::default(),
        }
    }
}

/// Nomes exatos das etapas do pipeline usadas pelas regras
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct StageNames {
    pub initial_contact: String,
    pub first_feedback: String,
    pub reassigned: String,
}

impl Default for StageNames {
    fn default() -> Self {
        Self {
            initial_contact: "Novos Leads".to_string(),
            first_feedback: "Primeira Tentativa".to_string(),
            reassigned: "Remanejados".to_string(),
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            // Arquivo de configuração base
            .add_source(File::with_name("config/default").required(false))
            // Arquivo específico do ambiente
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(Environment::with_prefix("VERIFICAR_PRAZOS").separator("__"));

        let builder = apply_env_overrides(builder, |name| std::env::var(name).ok())?;

        builder.build()?.try_deserialize()
    }
}

/// Variáveis de ambiente do Supabase (mesmos nomes da Edge Function) têm precedência
/// sobre os arquivos. Valores são strings opacas.
fn apply_env_overrides<F>(
    mut builder: ConfigBuilder<DefaultState>,
    lookup: F,
) -> Result<ConfigBuilder<DefaultState>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("SUPABASE_URL") {
        builder = builder.set_override("supabase.url", url)?;
    }

    let key = lookup("SERVICE_ROLE_KEY").or_else(|| lookup("SUPABASE_SERVICE_ROLE_KEY"));
    if let Some(key) = key {
        builder = builder.set_override("supabase.service_role_key", key)?;
    }

    // Cloud Run / containers informam a porta via PORT
    if let Some(port) = lookup("PORT").and_then(|p| p.parse::<u16>().ok()) {
        builder = builder.set_override("server.port", i64::from(port))?;
    }

    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn build_with(env: &[(&str, &str)]) -> Settings {
        let env: HashMap<String, String> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let builder = apply_env_overrides(Config::builder(), |name| env.get(name).cloned()).unwrap();
        builder.build().unwrap().try_deserialize().unwrap()
    }

    #[test]
    fn test_defaults_without_any_source() {
        let settings = build_with(&[]);
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.supabase.tables.leads, "prospectai");
        assert_eq!(settings.scanner.salesperson_role, "Vendedor");
        assert_eq!(settings.scanner.stages.initial_contact, "Novos Leads");
        assert_eq!(settings.scanner.stages.first_feedback, "Primeira Tentativa");
        assert_eq!(settings.store.backend, StoreBackend::Supabase);
        assert_eq!(settings.scanner.interval_seconds, 0);
    }

    #[test]
    fn test_supabase_env_overrides() {
        let settings = build_with(&[
            ("SUPABASE_URL", "https://abc.supabase.co"),
            ("SERVICE_ROLE_KEY", "service-key"),
            ("PORT", "9090"),
        ]);
        assert_eq!(settings.supabase.url, "https://abc.supabase.co");
        assert_eq!(settings.supabase.service_role_key, "service-key");
        assert_eq!(settings.server.port, 9090);
    }

    #[test]
    fn test_service_role_key_fallback_name() {
        let settings = build_with(&[("SUPABASE_SERVICE_ROLE_KEY", "fallback-key")]);
        assert_eq!(settings.supabase.service_role_key, "fallback-key");
    }

    #[test]
    fn test_debug_never_prints_key() {
        let settings = build_with(&[("SERVICE_ROLE_KEY", "super-secret")]);
        let debug = format!("{:?}", settings);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
