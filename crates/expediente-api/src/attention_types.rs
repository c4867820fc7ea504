//! Handler for `GET /attention-types/{role}`.

use axum::{Json, extract::State};
use expediente_core::{attention::AttentionType, store::CaseStore};

use crate::{ApiState, error::ApiError, extract::PathParams};

/// `GET /attention-types/{role}` — exact role match.
pub async fn get_one<S: CaseStore + 'static>(
  State(state): State<ApiState<S>>,
  PathParams(role): PathParams<String>,
) -> Result<Json<AttentionType>, ApiError> {
  state
    .forms
    .attention_type(&role)
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("no attention type for role {role:?}")))
}
