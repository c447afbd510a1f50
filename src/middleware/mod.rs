//! Middleware layer para o Axum router
//!
//! - Autenticação dos gatilhos do job (`/verificar-prazos`, `/leads/*`)

pub mod trigger_auth;

pub use trigger_auth::require_trigger_key;
