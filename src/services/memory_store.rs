//! [`LeadStore`] em memória
//!
//! Implementa os mesmos predicados do PostgREST. Usado nos testes e no modo local
//! (`store.backend = "memory"`, opcionalmente semeado por um arquivo JSON). Permite
//! injetar falhas por vendedor (consulta) e por lead (escrita).

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use tokio::sync::RwLock;

use crate::models::{CompanyRecord, LeadRecord, SalespersonRecord};
use crate::services::lead_store::{LeadReassignment, LeadStore, OverdueLeadQuery, ReassignOutcome};
use crate::utils::{AppError, AppResult};

#[derive(Debug, Clone, Deserialize)]
struct TeamMember {
    #[serde(flatten)]
    record: SalespersonRecord,
    role: String,
}

/// Formato do arquivo de seed: `{companies: [], team_members: [{.., role}], leads: []}`
#[derive(Debug, Default, Deserialize)]
struct Seed {
    #[serde(default)]
    companies: Vec<CompanyRecord>,
    #[serde(default)]
    team_members: Vec<TeamMember>,
    #[serde(default)]
    leads: Vec<LeadRecord>,
}

#[derive(Debug, Default)]
struct MemoryState {
    companies: BTreeMap<String, CompanyRecord>,
    team_members: Vec<TeamMember>,
    leads: BTreeMap<String, LeadRecord>,
    failing_queries: HashSet<String>,
    failing_updates: HashSet<String>,
    fail_companies: bool,
    fail_salespeople: bool,
    update_count: usize,
}

#[derive(Debug, Default)]
pub struct InMemoryLeadStore {
    state: RwLock<MemoryState>,
}

impl InMemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Carrega um seed JSON (mesmo formato das linhas do Supabase)
    pub fn from_seed(seed: Value) -> AppResult<Self> {
        let seed: Seed = serde_json::from_value(seed)?;
        let state = MemoryState {
            companies: seed.companies.into_iter().map(|c| (c.id.clone(), c)).collect(),
            team_members: seed.team_members,
            leads: seed.leads.into_iter().map(|l| (l.id.clone(), l)).collect(),
            ..Default::default()
        };
        Ok(Self {
            state: RwLock::new(state),
        })
    }

    pub fn from_seed_file(path: &str) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AppError::ConfigError(format!("Failed to read seed file '{}': {}", path, e)))?;
        let seed: Value = serde_json::from_str(&raw)?;
        Self::from_seed(seed)
    }

    pub async fn insert_company(&self, company: CompanyRecord) {
        self.state.write().await.companies.insert(company.id.clone(), company);
    }

    pub async fn insert_team_member(&self, record: SalespersonRecord, role: &str) {
        self.state.write().await.team_members.push(TeamMember {
            record,
            role: role.to_string(),
        });
    }

    /// Insere ou substitui um lead
    pub async fn insert_lead(&self, lead: LeadRecord) {
        self.state.write().await.leads.insert(lead.id.clone(), lead);
    }

    pub async fn lead(&self, lead_id: &str) -> Option<LeadRecord> {
        self.state.read().await.leads.get(lead_id).cloned()
    }

    pub async fn leads(&self) -> Vec<LeadRecord> {
        self.state.read().await.leads.values().cloned().collect()
    }

    /// Quantas escritas foram aplicadas desde a criação
    pub async fn update_count(&self) -> usize {
        self.state.read().await.update_count
    }

    pub async fn fail_queries_for(&self, salesperson_id: &str) {
        self.state.write().await.failing_queries.insert(salesperson_id.to_string());
    }

    pub async fn fail_updates_for(&self, lead_id: &str) {
        self.state.write().await.failing_updates.insert(lead_id.to_string());
    }

    pub async fn fail_company_load(&self) {
        self.state.write().await.fail_companies = true;
    }

    pub async fn fail_salespeople_load(&self) {
        self.state.write().await.fail_salespeople = true;
    }

    /// Desliga todas as falhas injetadas
    pub async fn clear_failures(&self) {
        let mut state = self.state.write().await;
        state.failing_queries.clear();
        state.failing_updates.clear();
        state.fail_companies = false;
        state.fail_salespeople = false;
    }
}

#[async_trait]
impl LeadStore for InMemoryLeadStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn list_companies(&self) -> AppResult<Vec<CompanyRecord>> {
        let state = self.state.read().await;
        if state.fail_companies {
            return Err(AppError::StoreError("companies unavailable".to_string()));
        }
        Ok(state.companies.values().cloned().collect())
    }

    async fn get_company(&self, company_id: &str) -> AppResult<Option<CompanyRecord>> {
        Ok(self.state.read().await.companies.get(company_id).cloned())
    }

    async fn list_salespeople(&self, role: &str) -> AppResult<Vec<SalespersonRecord>> {
        let state = self.state.read().await;
        if state.fail_salespeople {
            return Err(AppError::StoreError("team_members unavailable".to_string()));
        }
        Ok(state
            .team_members
            .iter()
            .filter(|member| member.role == role)
            .map(|member| member.record.clone())
            .collect())
    }

    async fn find_overdue_leads(&self, query: &OverdueLeadQuery) -> AppResult<Vec<LeadRecord>> {
        let state = self.state.read().await;
        if state.failing_queries.contains(&query.salesperson_id) {
            return Err(AppError::StoreError(format!(
                "query failed for salesperson {}",
                query.salesperson_id
            )));
        }
        Ok(state
            .leads
            .values()
            .filter(|lead| query.matches(lead))
            .cloned()
            .collect())
    }

    async fn get_lead(&self, lead_id: &str) -> AppResult<Option<LeadRecord>> {
        Ok(self.lead(lead_id).await)
    }

    async fn reassign_lead(&self, change: &LeadReassignment) -> AppResult<ReassignOutcome> {
        let mut state = self.state.write().await;
        if state.failing_updates.contains(&change.lead_id) {
            return Err(AppError::StoreError(format!("update failed for lead {}", change.lead_id)));
        }

        let Some(lead) = state.leads.get_mut(&change.lead_id) else {
            return Ok(ReassignOutcome::NotFound);
        };

        if lead.salesperson_id.as_deref() != Some(change.expected_owner.as_str()) {
            return Ok(ReassignOutcome::OwnerChanged);
        }

        lead.salesperson_id = Some(change.new_owner.clone());
        lead.details = Some(Value::Object(change.details.clone()));
        if let Some(stage_id) = &change.new_stage_id {
            lead.stage_id = Some(stage_id.clone());
        }
        state.update_count += 1;

        Ok(ReassignOutcome::Applied)
    }
}
