//! Handlers for `/subjects/{id}/forms` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/subjects/{id}/forms` | Current instance of each form type |
//! | `GET`  | `/subjects/{id}/forms/{form_type}` | Latest instance; 404 if none |
//! | `PUT`  | `/subjects/{id}/forms/{form_type}` | Body: tagged [`FormPayload`]; 201 on insert, 200 on update |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use expediente_core::{
  form::{FormInstance, FormPayload, FormType},
  persistence::SaveKind,
  session::{FormDraft, ValidationErrors, validate},
  store::CaseStore,
};
use uuid::Uuid;

use crate::{
  ApiState,
  error::ApiError,
  extract::{JsonBody, PathParams},
};

fn parse_form_type(tag: &str) -> Result<FormType, ApiError> {
  FormType::parse(tag).map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// `GET /subjects/{id}/forms`
pub async fn case_file<S: CaseStore + 'static>(
  State(state): State<ApiState<S>>,
  PathParams(subject_id): PathParams<Uuid>,
) -> Result<Json<Vec<FormInstance>>, ApiError> {
  // 404 for unknown subjects rather than an empty file.
  state.lookup.profile(subject_id).await?;
  Ok(Json(state.forms.list_case_file(subject_id).await?))
}

/// `GET /subjects/{id}/forms/{form_type}`
pub async fn get_latest<S: CaseStore + 'static>(
  State(state): State<ApiState<S>>,
  PathParams((subject_id, tag)): PathParams<(Uuid, String)>,
) -> Result<Json<FormInstance>, ApiError> {
  let form_type = parse_form_type(&tag)?;
  let instance = state
    .forms
    .get_latest_form_instance(subject_id, form_type)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("no {form_type} saved for subject {subject_id}")))?;
  Ok(Json(instance))
}

/// `PUT /subjects/{id}/forms/{form_type}`
///
/// Missing required fields yield 422 with a `fields` list and no write.
pub async fn save<S: CaseStore + 'static>(
  State(state): State<ApiState<S>>,
  PathParams((subject_id, tag)): PathParams<(Uuid, String)>,
  JsonBody(payload): JsonBody<FormPayload>,
) -> Result<impl IntoResponse, ApiError> {
  let form_type = parse_form_type(&tag)?;
  if payload.form_type() != form_type {
    return Err(ApiError::BadRequest(format!(
      "body holds a {} payload but the path names {form_type}",
      payload.form_type()
    )));
  }

  let draft = FormDraft { subject_id: Some(subject_id), payload };
  let errors = validate(&draft);
  if !errors.is_empty() {
    return Err(ApiError::Validation(ValidationErrors(errors)));
  }

  let outcome = state.forms.save_or_update(subject_id, draft.payload).await?;
  let status = match outcome.kind {
    SaveKind::Inserted => StatusCode::CREATED,
    SaveKind::Updated => StatusCode::OK,
  };
  Ok((status, Json(outcome.instance)))
}
