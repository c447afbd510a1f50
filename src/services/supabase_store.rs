//! [`LeadStore`] sobre a API REST do Supabase

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use supabase::{Filter, Query, SupabaseClient};

use crate::config::{SupabaseSettings, TableNames};
use crate::models::lead::iso8601;
use crate::models::{CompanyRecord, LeadRecord, SalespersonRecord};
use crate::services::lead_store::{LeadReassignment, LeadStore, OverdueLeadQuery, ReassignOutcome};
use crate::utils::{AppError, AppResult};

const COMPANY_COLUMNS: &str = "id, pipeline_stages";
const SALESPERSON_COLUMNS: &str = "id, company_id, prospect_ai_settings";
const LEAD_COLUMNS: &str =
    "id, company_id, salesperson_id, stage_id, created_at, prospected_at, feedback, details";

#[derive(Debug, Deserialize)]
struct UpdatedRow {
    #[allow(dead_code)]
    id: String,
}

#[derive(Debug, Clone)]
pub struct SupabaseLeadStore {
    client: SupabaseClient,
    tables: TableNames,
}

impl SupabaseLeadStore {
    pub fn new(client: SupabaseClient, tables: TableNames) -> Self {
        Self { client, tables }
    }

    /// Cria o client a partir das configurações (URL + service_role key)
    pub fn from_settings(settings: &SupabaseSettings) -> AppResult<Self> {
        let client = SupabaseClient::with_timeouts(
            settings.url.clone(),
            settings.service_role_key.clone(),
            settings.timeout_seconds,
            settings.connect_timeout_seconds,
        )?;
        Ok(Self::new(client, settings.tables.clone()))
    }
}

#[async_trait]
impl LeadStore for SupabaseLeadStore {
    fn backend_name(&self) -> &'static str {
        "supabase"
    }

    async fn ping(&self) -> AppResult<()> {
        let query = Query::new().select("id").limit(1);
        let _: Vec<Value> = self.client.select(&self.tables.companies, &query).await?;
        Ok(())
    }

    async fn list_companies(&self) -> AppResult<Vec<CompanyRecord>> {
        let query = Query::new().select(COMPANY_COLUMNS);
        Ok(self.client.select(&self.tables.companies, &query).await?)
    }

    async fn get_company(&self, company_id: &str) -> AppResult<Option<CompanyRecord>> {
        let query = Query::new().select(COMPANY_COLUMNS).eq("id", company_id).limit(1);
        let rows: Vec<CompanyRecord> = self.client.select(&self.tables.companies, &query).await?;
        Ok(rows.into_iter().next())
    }

    async fn list_salespeople(&self, role: &str) -> AppResult<Vec<SalespersonRecord>> {
        let query = Query::new().select(SALESPERSON_COLUMNS).eq("role", role);
        Ok(self.client.select(&self.tables.team_members, &query).await?)
    }

    async fn find_overdue_leads(&self, overdue: &OverdueLeadQuery) -> AppResult<Vec<LeadRecord>> {
        let mut query = Query::new()
            .select(LEAD_COLUMNS)
            .eq("salesperson_id", overdue.salesperson_id.as_str())
            .eq("stage_id", overdue.stage_id.as_str())
            .lt(overdue.clock.column(), iso8601(overdue.before));

        if overdue.require_no_feedback {
            query = query.or(&[Filter::is_null("feedback"), Filter::is_empty_array("feedback")]);
        }

        Ok(self.client.select(&self.tables.leads, &query).await?)
    }

    async fn get_lead(&self, lead_id: &str) -> AppResult<Option<LeadRecord>> {
        let query = Query::new().select(LEAD_COLUMNS).eq("id", lead_id).limit(1);
        let rows: Vec<LeadRecord> = self.client.select(&self.tables.leads, &query).await?;
        Ok(rows.into_iter().next())
    }

    async fn reassign_lead(&self, change: &LeadReassignment) -> AppResult<ReassignOutcome> {
        let query = Query::new()
            .select("id")
            .eq("id", change.lead_id.as_str())
            .eq("salesperson_id", change.expected_owner.as_str());

        let mut body = json!({
            "salesperson_id": change.new_owner,
            "details": Value::Object(change.details.clone()),
        });
        if let Some(stage_id) = &change.new_stage_id {
            body["stage_id"] = json!(stage_id);
        }

        let updated: Vec<UpdatedRow> = self.client.update(&self.tables.leads, &query, &body).await?;

        match updated.len() {
            1 => Ok(ReassignOutcome::Applied),
            0 => {
                // Nenhuma linha casou: o dono mudou ou o lead sumiu
                match self.get_lead(&change.lead_id).await? {
                    Some(_) => Ok(ReassignOutcome::OwnerChanged),
                    None => Ok(ReassignOutcome::NotFound),
                }
            }
            n => Err(AppError::StoreError(format!(
                "Update on lead {} matched {} rows",
                change.lead_id, n
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LeadClock;
    use chrono::{TimeZone, Utc};
    use httpmock::prelude::*;
    use serde_json::Map;

    fn store(server: &MockServer) -> SupabaseLeadStore {
        let client = SupabaseClient::new(server.base_url(), "service-key").unwrap();
        SupabaseLeadStore::new(client, TableNames::default())
    }

    fn reassignment() -> LeadReassignment {
        let mut details = Map::new();
        details.insert("reassigned_by_system".to_string(), json!(true));
        LeadReassignment {
            lead_id: "lead-1".to_string(),
            expected_owner: "sp-a".to_string(),
            new_owner: "sp-b".to_string(),
            new_stage_id: None,
            details,
        }
    }

    #[test]
    fn test_from_settings_requires_credentials() {
        let settings = SupabaseSettings::default();
        assert!(matches!(
            SupabaseLeadStore::from_settings(&settings),
            Err(AppError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_list_salespeople_filters_by_role() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/rest/v1/team_members")
                    .query_param("role", "eq.Vendedor");
                then.status(200).json_body(json!([
                    {"id": "sp-a", "company_id": "c-1", "prospect_ai_settings": null},
                    {"id": "sp-b", "company_id": null, "prospect_ai_settings": {"deadlines": {}}}
                ]));
            })
            .await;

        let rows = store(&server).list_salespeople("Vendedor").await.unwrap();
        mock.assert_async().await;
        assert_eq!(rows.len(), 2);
        assert!(rows[1].company_id.is_none());
    }

    #[tokio::test]
    async fn test_find_overdue_feedback_leads_query() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/rest/v1/prospectai")
                    .query_param("salesperson_id", "eq.sp-a")
                    .query_param("stage_id", "eq.stage-pt")
                    .query_param("prospected_at", "lt.2025-01-01T08:00:00.000Z")
                    .query_param("or", "(feedback.is.null,feedback.eq.[])");
                then.status(200).json_body(json!([
                    {"id": "lead-1", "salesperson_id": "sp-a", "stage_id": "stage-pt",
                     "prospected_at": "2025-01-01T07:00:00+00:00", "feedback": [], "details": null}
                ]));
            })
            .await;

        let overdue = OverdueLeadQuery {
            salesperson_id: "sp-a".to_string(),
            stage_id: "stage-pt".to_string(),
            clock: LeadClock::ProspectedAt,
            before: Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap(),
            require_no_feedback: true,
        };
        let leads = store(&server).find_overdue_leads(&overdue).await.unwrap();

        mock.assert_async().await;
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].id, "lead-1");
    }

    #[tokio::test]
    async fn test_reassign_is_conditional_on_owner() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(httpmock::Method::PATCH)
                    .path("/rest/v1/prospectai")
                    .query_param("id", "eq.lead-1")
                    .query_param("salesperson_id", "eq.sp-a")
                    .json_body(json!({
                        "salesperson_id": "sp-b",
                        "details": {"reassigned_by_system": true}
                    }));
                then.status(200).json_body(json!([{"id": "lead-1"}]));
            })
            .await;

        let outcome = store(&server).reassign_lead(&reassignment()).await.unwrap();
        mock.assert_async().await;
        assert_eq!(outcome, ReassignOutcome::Applied);
    }

    #[tokio::test]
    async fn test_reassign_detects_owner_change() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(httpmock::Method::PATCH).path("/rest/v1/prospectai");
                then.status(200).json_body(json!([]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/rest/v1/prospectai").query_param("id", "eq.lead-1");
                then.status(200)
                    .json_body(json!([{"id": "lead-1", "salesperson_id": "sp-c"}]));
            })
            .await;

        let outcome = store(&server).reassign_lead(&reassignment()).await.unwrap();
        assert_eq!(outcome, ReassignOutcome::OwnerChanged);
    }

    #[tokio::test]
    async fn test_reassign_missing_lead() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(httpmock::Method::PATCH).path("/rest/v1/prospectai");
                then.status(200).json_body(json!([]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/rest/v1/prospectai");
                then.status(200).json_body(json!([]));
            })
            .await;

        let outcome = store(&server).reassign_lead(&reassignment()).await.unwrap();
        assert_eq!(outcome, ReassignOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_store_errors_propagate() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/rest/v1/companies");
                then.status(503).body("upstream down");
            })
            .await;

        let err = store(&server).list_companies().await.unwrap_err();
        assert!(matches!(err, AppError::StoreError(_)));
        assert_eq!(err.message(), "upstream down");
    }
}
