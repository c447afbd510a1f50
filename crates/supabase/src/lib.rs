//! Cliente PostgREST do Supabase
//!
//! Cobre apenas o que o job de prazos precisa da API REST do Supabase:
//!
//! - **select**: `GET /rest/v1/{tabela}?select=...&coluna=op.valor`
//! - **update**: `PATCH /rest/v1/{tabela}?filtros` com `Prefer: return=representation`
//!
//! A chave usada é a `service_role` (acesso elevado, ignora RLS). Ela é enviada tanto
//! em `apikey` quanto em `Authorization: Bearer`.
//!
//! # Exemplo Básico
//!
//! ```rust,ignore
//! use supabase::{Query, SupabaseClient};
//!
//! let client = SupabaseClient::new(
//!     std::env::var("SUPABASE_URL")?,
//!     std::env::var("SERVICE_ROLE_KEY")?,
//! )?;
//!
//! let query = Query::new().select("id, pipeline_stages");
//! let companies: Vec<serde_json::Value> = client.select("companies", &query).await?;
//! ```

pub mod client;
pub mod error;
pub mod query;

pub use client::SupabaseClient;
pub use error::{Result, SupabaseError};
pub use query::{Filter, Query};
