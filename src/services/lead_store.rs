//! Porta de acesso ao row store (companies, team_members, prospectai)
//!
//! O scanner só conhece este trait. Em produção quem implementa é o
//! [`SupabaseLeadStore`](super::supabase_store::SupabaseLeadStore); nos testes e no
//! modo local, o [`InMemoryLeadStore`](super::memory_store::InMemoryLeadStore).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::models::{CompanyRecord, LeadClock, LeadRecord, SalespersonRecord};
use crate::utils::AppResult;

/// Filtro de leads atrasados de um vendedor em uma etapa
#[derive(Debug, Clone, PartialEq)]
pub struct OverdueLeadQuery {
    pub salesperson_id: String,
    pub stage_id: String,
    pub clock: LeadClock,
    /// Só leads com o relógio estritamente anterior a este instante
    pub before: DateTime<Utc>,
    /// `feedback` nulo ou lista vazia
    pub require_no_feedback: bool,
}

impl OverdueLeadQuery {
    /// Mesmo predicado aplicado em memória
    pub fn matches(&self, lead: &LeadRecord) -> bool {
        lead.salesperson_id.as_deref() == Some(self.salesperson_id.as_str())
            && lead.stage_id.as_deref() == Some(self.stage_id.as_str())
            && lead.timestamp(self.clock).map_or(false, |ts| ts < self.before)
            && (!self.require_no_feedback || !lead.has_feedback())
    }
}

/// Escrita condicional de remanejamento: só aplica se o lead ainda pertence a
/// `expected_owner` (compare-and-swap no dono).
#[derive(Debug, Clone, PartialEq)]
pub struct LeadReassignment {
    pub lead_id: String,
    pub expected_owner: String,
    pub new_owner: String,
    /// Etapa de destino (remanejamento manual move para "Remanejados")
    pub new_stage_id: Option<String>,
    /// `details` completo já mesclado
    pub details: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReassignOutcome {
    /// Dono e details gravados
    Applied,
    /// Outro processo mudou o dono antes; nada foi gravado
    OwnerChanged,
    /// Lead não existe mais
    NotFound,
}

#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Nome do backend (para /status)
    fn backend_name(&self) -> &'static str;

    /// Verifica se o store responde
    async fn ping(&self) -> AppResult<()>;

    async fn list_companies(&self) -> AppResult<Vec<CompanyRecord>>;

    async fn get_company(&self, company_id: &str) -> AppResult<Option<CompanyRecord>>;

    async fn list_salespeople(&self, role: &str) -> AppResult<Vec<SalespersonRecord>>;

    async fn find_overdue_leads(&self, query: &OverdueLeadQuery) -> AppResult<Vec<LeadRecord>>;

    async fn get_lead(&self, lead_id: &str) -> AppResult<Option<LeadRecord>>;

    async fn reassign_lead(&self, change: &LeadReassignment) -> AppResult<ReassignOutcome>;
}
