//! Handlers for `/subjects` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/subjects` | Optional `?q=` name filter; at most 20 active subjects |
//! | `GET`  | `/subjects/{id}` | Profile with derived age |

use axum::{Json, extract::State};
use expediente_core::{
  store::CaseStore,
  subject::{Subject, SubjectProfile},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  ApiState,
  error::ApiError,
  extract::{PathParams, QueryParams},
};

#[derive(Debug, Deserialize, Default)]
pub struct SearchParams {
  /// Case-insensitive substring of the full name.
  #[serde(default)]
  pub q: String,
}

/// `GET /subjects[?q=...]`
pub async fn search<S: CaseStore + 'static>(
  State(state): State<ApiState<S>>,
  QueryParams(params): QueryParams<SearchParams>,
) -> Result<Json<Vec<Subject>>, ApiError> {
  Ok(Json(state.lookup.search(&params.q).await?))
}

/// `GET /subjects/{id}`
pub async fn get_one<S: CaseStore + 'static>(
  State(state): State<ApiState<S>>,
  PathParams(id): PathParams<Uuid>,
) -> Result<Json<SubjectProfile>, ApiError> {
  Ok(Json(state.lookup.profile(id).await?))
}
