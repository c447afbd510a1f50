//! Remanejamento manual de um lead (operação do gestor)
//!
//! Move o lead para outro vendedor da mesma empresa e para a etapa "Remanejados".
//! A escrita é condicional no dono atual, como no job automático: se alguém mudou o
//! dono no meio do caminho, a operação falha com conflito em vez de sobrescrever.

use serde::Serialize;

use crate::config::ScannerSettings;
use crate::models::{iso8601, ReassignmentAudit, WellKnownStage};
use crate::services::clock::Clock;
use crate::services::lead_store::{LeadReassignment, LeadStore, ReassignOutcome};
use crate::services::stage_directory::{StageDirectory, StageLookup};
use crate::utils::logging::*;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct ManualReassignRequest {
    pub lead_id: String,
    pub new_salesperson_id: String,
    /// Dono que o gestor viu na tela; quando informado, precisa bater com o atual
    pub expected_salesperson_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManualReassignResult {
    pub lead_id: String,
    pub from: String,
    pub to: String,
    pub stage_id: String,
    pub reassigned_at: String,
}

pub async fn reassign_manually(
    store: &dyn LeadStore,
    clock: &dyn Clock,
    settings: &ScannerSettings,
    request: &ManualReassignRequest,
) -> AppResult<ManualReassignResult> {
    let new_owner = request.new_salesperson_id.trim();
    if new_owner.is_empty() {
        return Err(AppError::ValidationError("new_salesperson_id is required".to_string()));
    }

    let lead = store
        .get_lead(&request.lead_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Lead {} not found", request.lead_id)))?;

    let current_owner = lead.salesperson_id.clone().unwrap_or_default();

    if let Some(expected) = request.expected_salesperson_id.as_deref() {
        if expected != current_owner {
            return Err(AppError::Conflict(format!(
                "Lead {} is now owned by {}",
                lead.id, current_owner
            )));
        }
    }

    if new_owner == current_owner {
        return Err(AppError::ValidationError(format!(
            "Lead {} already belongs to {}",
            lead.id, new_owner
        )));
    }

    let company_id = lead
        .company_id
        .clone()
        .ok_or_else(|| AppError::ValidationError(format!("Lead {} has no company", lead.id)))?;

    let salespeople = store.list_salespeople(&settings.salesperson_role).await?;
    let target_in_company = salespeople
        .iter()
        .any(|sp| sp.id == new_owner && sp.company_id.as_deref() == Some(company_id.as_str()));
    if !target_in_company {
        return Err(AppError::ValidationError(format!(
            "{} is not a {} of company {}",
            new_owner, settings.salesperson_role, company_id
        )));
    }

    let company = store
        .get_company(&company_id)
        .await?
        .ok_or_else(|| AppError::ValidationError(format!("Company {} not found", company_id)))?;

    let stage_id = StageDirectory::build(&company, &settings.stages)
        .and_then(|directory| match directory.resolve(WellKnownStage::Remanejados) {
            StageLookup::Found(stage) => Some(stage.id.clone()),
            StageLookup::NotConfigured => {
                directory.report_missing(&[WellKnownStage::Remanejados]);
                None
            }
        })
        .ok_or_else(|| {
            AppError::ValidationError(format!(
                "Company {} has no '{}' stage",
                company_id,
                WellKnownStage::Remanejados.name(&settings.stages)
            ))
        })?;

    let at = clock.now();
    let audit = ReassignmentAudit::manual(&current_owner, new_owner, at);
    let change = LeadReassignment {
        lead_id: lead.id.clone(),
        expected_owner: current_owner.clone(),
        new_owner: new_owner.to_string(),
        new_stage_id: Some(stage_id.clone()),
        details: audit.merge_into(lead.details.as_ref()),
    };

    match store.reassign_lead(&change).await? {
        ReassignOutcome::Applied => {
            log_lead_reassigned(&lead.id, &current_owner, new_owner, "manual");
            Ok(ManualReassignResult {
                lead_id: lead.id,
                from: current_owner,
                to: new_owner.to_string(),
                stage_id,
                reassigned_at: iso8601(at),
            })
        }
        ReassignOutcome::OwnerChanged => {
            log_lead_owner_changed(&lead.id, &current_owner);
            Err(AppError::Conflict(format!("Lead {} changed owner concurrently", lead.id)))
        }
        ReassignOutcome::NotFound => Err(AppError::NotFound(format!("Lead {} not found", lead.id))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CompanyRecord, LeadRecord, PipelineStage, SalespersonRecord};
    use crate::services::clock::FixedClock;
    use crate::services::memory_store::InMemoryLeadStore;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn stage(id: &str, name: &str) -> PipelineStage {
        PipelineStage {
            id: id.to_string(),
            name: name.to_string(),
            stage_order: 0,
            is_fixed: true,
            is_enabled: true,
        }
    }

    async fn store() -> InMemoryLeadStore {
        let store = InMemoryLeadStore::new();
        store
            .insert_company(CompanyRecord::new(
                "c-1",
                vec![stage("s-novos", "Novos Leads"), stage("s-rem", "Remanejados")],
            ))
            .await;
        store
            .insert_company(CompanyRecord::new("c-2", vec![stage("s2-novos", "Novos Leads")]))
            .await;
        for (id, company) in [("sp-a", "c-1"), ("sp-b", "c-1"), ("sp-x", "c-2"), ("sp-y", "c-2")] {
            store
                .insert_team_member(SalespersonRecord::new(id, company, None), "Vendedor")
                .await;
        }

        let mut lead = LeadRecord::new("l-1", "c-1", "sp-a");
        lead.stage_id = Some("s-novos".to_string());
        lead.details = Some(json!({"source": "feira"}));
        store.insert_lead(lead).await;

        let mut other = LeadRecord::new("l-2", "c-2", "sp-x");
        other.stage_id = Some("s2-novos".to_string());
        store.insert_lead(other).await;
        store
    }

    fn request(lead: &str, to: &str, expected: Option<&str>) -> ManualReassignRequest {
        ManualReassignRequest {
            lead_id: lead.to_string(),
            new_salesperson_id: to.to_string(),
            expected_salesperson_id: expected.map(str::to_string),
        }
    }

    fn clock() -> FixedClock {
        FixedClock::new(Utc.with_ymd_and_hms(2025, 6, 2, 9, 30, 0).unwrap())
    }

    #[tokio::test]
    async fn test_moves_lead_to_reassigned_stage() {
        let store = store().await;
        let result = reassign_manually(&store, &clock(), &ScannerSettings::default(), &request("l-1", "sp-b", Some("sp-a")))
            .await
            .unwrap();

        assert_eq!(result.from, "sp-a");
        assert_eq!(result.to, "sp-b");
        assert_eq!(result.stage_id, "s-rem");
        assert_eq!(result.reassigned_at, "2025-06-02T09:30:00.000Z");

        let lead = store.lead("l-1").await.unwrap();
        assert_eq!(lead.salesperson_id.as_deref(), Some("sp-b"));
        assert_eq!(lead.stage_id.as_deref(), Some("s-rem"));
        let details = lead.details.unwrap();
        assert_eq!(details["source"], json!("feira"));
        assert_eq!(details["reassigned_by_system"], json!(false));
        assert_eq!(details["reassigned_from"], json!("sp-a"));
    }

    #[tokio::test]
    async fn test_rejects_invalid_requests() {
        let store = store().await;
        let settings = ScannerSettings::default();

        let missing = reassign_manually(&store, &clock(), &settings, &request("l-404", "sp-b", None)).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        let stale = reassign_manually(&store, &clock(), &settings, &request("l-1", "sp-b", Some("sp-z"))).await;
        assert!(matches!(stale, Err(AppError::Conflict(_))));

        let same = reassign_manually(&store, &clock(), &settings, &request("l-1", "sp-a", None)).await;
        assert!(matches!(same, Err(AppError::ValidationError(_))));

        let foreign = reassign_manually(&store, &clock(), &settings, &request("l-1", "sp-x", None)).await;
        assert!(matches!(foreign, Err(AppError::ValidationError(_))));

        let blank = reassign_manually(&store, &clock(), &settings, &request("l-1", " ", None)).await;
        assert!(matches!(blank, Err(AppError::ValidationError(_))));

        assert_eq!(store.update_count().await, 0);
    }

    #[tokio::test]
    async fn test_company_without_reassigned_stage_is_rejected() {
        let store = store().await;
        let result =
            reassign_manually(&store, &clock(), &ScannerSettings::default(), &request("l-2", "sp-y", None)).await;

        assert!(matches!(result, Err(AppError::ValidationError(_))));
        assert_eq!(store.lead("l-2").await.unwrap().salesperson_id.as_deref(), Some("sp-x"));
    }
}
