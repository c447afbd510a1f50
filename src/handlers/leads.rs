use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Deserialize;
use std::sync::Arc;

use verificar_prazos::services::{reassign_manually, ManualReassignRequest, ManualReassignResult};
use verificar_prazos::utils::{logging::*, AppResult};
use verificar_prazos::AppState;

#[derive(Debug, Deserialize)]
pub struct ReassignBody {
    pub new_salesperson_id: String,
    #[serde(default)]
    pub expected_salesperson_id: Option<String>,
}

/// Remanejamento manual: `POST /leads/:id/reassign`
pub async fn handle_reassign_lead(
    State(state): State<Arc<AppState>>,
    Path(lead_id): Path<String>,
    Json(body): Json<ReassignBody>,
) -> AppResult<Json<ManualReassignResult>> {
    log_request_received("/leads/:id/reassign", "POST");

    let request = ManualReassignRequest {
        lead_id,
        new_salesperson_id: body.new_salesperson_id,
        expected_salesperson_id: body.expected_salesperson_id,
    };

    let result = reassign_manually(
        state.store.as_ref(),
        state.clock.as_ref(),
        &state.settings.scanner,
        &request,
    )
    .await?;

    Ok(Json(result))
}
