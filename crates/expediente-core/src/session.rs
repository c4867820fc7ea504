//! Form session — the state behind one open form page.
//!
//! The whole form is a single immutable [`FormDraft`] replaced through
//! [`reduce`]. The session tracks where the page is in its lifecycle:
//!
//! ```text
//! Idle → Loading → Ready → Editing → Submitting → Submitted(Saved | Failed)
//!           └──→ NotFound | LoadFailed
//! ```
//!
//! Edits never touch storage. A failed submission keeps the draft so the
//! user can retry.

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::{
  form::{FormPayload, FormType},
  lookup::LookupError,
  persistence::{PersistenceError, SaveKind, SaveOutcome},
  subject::SubjectProfile,
};

// ─── Draft & reducer ─────────────────────────────────────────────────────────

/// All field values of one form page.
#[derive(Debug, Clone, PartialEq)]
pub struct FormDraft {
  /// The subject the form is about; required before submitting.
  pub subject_id: Option<Uuid>,
  pub payload:    FormPayload,
}

impl FormDraft {
  pub fn blank(form_type: FormType) -> Self {
    Self { subject_id: None, payload: form_type.blank_payload() }
  }
}

#[derive(Debug, Clone)]
pub enum FormAction {
  SelectSubject(Uuid),
  /// Set one top-level field of the payload.
  SetField { field: String, value: Value },
  /// Replace the payload wholesale; must be of the same form type.
  Replace(FormPayload),
}

impl FormAction {
  pub fn set(field: impl Into<String>, value: impl Into<Value>) -> Self {
    Self::SetField { field: field.into(), value: value.into() }
  }
}

/// Apply `action` to `draft`, returning the new draft.
pub fn reduce(draft: &FormDraft, action: FormAction) -> crate::Result<FormDraft> {
  match action {
    FormAction::SelectSubject(id) => Ok(FormDraft { subject_id: Some(id), ..draft.clone() }),
    FormAction::SetField { field, value } => Ok(FormDraft {
      subject_id: draft.subject_id,
      payload:    draft.payload.with_field(&field, value)?,
    }),
    FormAction::Replace(payload) => {
      if payload.form_type() != draft.payload.form_type() {
        return Err(crate::Error::MalformedPayload {
          form_type: draft.payload.form_type().to_string(),
          reason:    format!("cannot replace with a {} payload", payload.form_type()),
        });
      }
      Ok(FormDraft { subject_id: draft.subject_id, payload })
    }
  }
}

// ─── Validation ──────────────────────────────────────────────────────────────

/// Field name used when no subject has been selected.
pub const SUBJECT_FIELD: &str = "subject_id";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
  pub field:   String,
  pub message: String,
}

impl FieldError {
  pub fn required(field: &str) -> Self {
    Self { field: field.to_owned(), message: format!("{field} is required") }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
  pub fn fields(&self) -> impl Iterator<Item = &str> { self.0.iter().map(|e| e.field.as_str()) }
}

impl fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let names: Vec<_> = self.fields().collect();
    write!(f, "missing required fields: {}", names.join(", "))
  }
}

impl std::error::Error for ValidationErrors {}

/// Required-field check for a draft. Empty means the draft may be saved.
pub fn validate(draft: &FormDraft) -> Vec<FieldError> {
  let mut errors = Vec::new();
  if draft.subject_id.is_none() {
    errors.push(FieldError::required(SUBJECT_FIELD));
  }
  errors.extend(draft.payload.missing_required().into_iter().map(FieldError::required));
  errors
}

// ─── State ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitStatus {
  Saved { form_id: Uuid, kind: SaveKind },
  Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormState {
  Idle,
  Loading,
  Ready,
  Editing,
  Submitting,
  Submitted(SubmitStatus),
  NotFound,
  LoadFailed(String),
}

impl FormState {
  fn name(&self) -> &'static str {
    match self {
      Self::Idle => "idle",
      Self::Loading => "loading",
      Self::Ready => "ready",
      Self::Editing => "editing",
      Self::Submitting => "submitting",
      Self::Submitted(_) => "submitted",
      Self::NotFound => "not_found",
      Self::LoadFailed(_) => "load_failed",
    }
  }

  fn is_editable(&self) -> bool {
    matches!(self, Self::Ready | Self::Editing | Self::Submitted(_))
  }
}

#[derive(Debug, Error)]
pub enum SessionError {
  #[error("form cannot be edited while {0}")]
  Busy(&'static str),

  #[error(transparent)]
  Field(#[from] crate::Error),
}

#[derive(Debug, Error)]
pub enum SubmitError {
  #[error("{0}")]
  Validation(ValidationErrors),

  #[error("form cannot be submitted while {0}")]
  Busy(&'static str),

  #[error(transparent)]
  Persistence(#[from] PersistenceError),
}

// ─── Session ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FormSession {
  state:   FormState,
  draft:   FormDraft,
  profile: Option<SubjectProfile>,
  errors:  Vec<FieldError>,
}

impl FormSession {
  pub fn new(form_type: FormType) -> Self {
    Self {
      state:   FormState::Idle,
      draft:   FormDraft::blank(form_type),
      profile: None,
      errors:  Vec::new(),
    }
  }

  pub fn state(&self) -> &FormState { &self.state }
  pub fn draft(&self) -> &FormDraft { &self.draft }
  pub fn profile(&self) -> Option<&SubjectProfile> { self.profile.as_ref() }
  pub fn form_type(&self) -> FormType { self.draft.payload.form_type() }

  /// Inline errors from the last rejected submission.
  pub fn field_errors(&self) -> &[FieldError] { &self.errors }

  pub fn begin_load(&mut self, subject_id: Uuid) {
    self.draft.subject_id = Some(subject_id);
    self.state = FormState::Loading;
  }

  /// Finish loading. `saved` is the latest stored payload, if any; it wins
  /// over the blank form and is then completed from the profile.
  pub fn finish_load(
    &mut self,
    profile: Result<SubjectProfile, LookupError>,
    saved: Option<FormPayload>,
  ) {
    match profile {
      Ok(profile) => {
        let mut payload = match saved {
          Some(p) if p.form_type() == self.form_type() => p,
          _ => self.form_type().blank_payload(),
        };
        payload.fields_mut().prefill(&profile);
        self.draft = FormDraft { subject_id: Some(profile.subject.subject_id), payload };
        self.profile = Some(profile);
        self.errors.clear();
        self.state = FormState::Ready;
      }
      Err(LookupError::NotFound(_)) => {
        self.profile = None;
        self.state = FormState::NotFound;
      }
      Err(e) => {
        self.profile = None;
        self.state = FormState::LoadFailed(e.to_string());
      }
    }
  }

  /// Apply one edit. Local only.
  pub fn apply(&mut self, action: FormAction) -> Result<(), SessionError> {
    if !self.state.is_editable() {
      return Err(SessionError::Busy(self.state.name()));
    }
    self.draft = reduce(&self.draft, action)?;
    self.state = FormState::Editing;
    Ok(())
  }

  /// Validate and enter `Submitting`, returning what to save.
  ///
  /// On missing required fields the session goes back to `Editing` with the
  /// field errors recorded and nothing is returned to save.
  pub fn begin_submit(&mut self) -> Result<(Uuid, FormPayload), SubmitError> {
    if !self.state.is_editable() {
      return Err(SubmitError::Busy(self.state.name()));
    }
    // A missing subject is itself one of the validation errors.
    let errors = validate(&self.draft);
    let Some(subject_id) = self.draft.subject_id.filter(|_| errors.is_empty()) else {
      self.errors.clone_from(&errors);
      self.state = FormState::Editing;
      return Err(SubmitError::Validation(ValidationErrors(errors)));
    };
    self.errors.clear();
    self.state = FormState::Submitting;
    Ok((subject_id, self.draft.payload.clone()))
  }

  pub fn finish_submit(&mut self, result: &Result<SaveOutcome, PersistenceError>) {
    self.state = FormState::Submitted(match result {
      Ok(outcome) => SubmitStatus::Saved {
        form_id: outcome.instance.form_id,
        kind:    outcome.kind,
      },
      Err(e) => SubmitStatus::Failed(e.to_string()),
    });
  }

  /// Leave `Submitting` without a result (the save was abandoned).
  pub fn abandon_submit(&mut self) {
    if self.state == FormState::Submitting {
      self.state = FormState::Editing;
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::{NaiveDate, Utc};
  use serde_json::json;

  use super::*;
  use crate::{payload::AdolescentInitialInterview, subject::Subject};

  fn profile() -> SubjectProfile {
    let subject = Subject {
      subject_id:                 Uuid::new_v4(),
      given_names:                "Camila".into(),
      surnames:                   "Fuentes".into(),
      birth_date:                 NaiveDate::from_ymd_opt(2007, 11, 30),
      birthplace:                 None,
      address:                    Some("Calle Uno 55".into()),
      intake_date:                None,
      administrative_case_number: None,
      judicial_case_number:       None,
      center:                     None,
      active:                     true,
      created_at:                 Utc::now(),
    };
    SubjectProfile::new(subject, NaiveDate::from_ymd_opt(2024, 11, 29).unwrap())
  }

  fn ready() -> FormSession {
    let mut s = FormSession::new(FormType::AdolescentInitialInterview);
    let p = profile();
    s.begin_load(p.subject.subject_id);
    s.finish_load(Ok(p), None);
    s
  }

  fn interview(s: &FormSession) -> &AdolescentInitialInterview {
    match &s.draft().payload {
      FormPayload::AdolescentInitialInterview(f) => f,
      other => panic!("unexpected payload {other:?}"),
    }
  }

  #[test]
  fn load_prefills_from_profile() {
    let s = ready();
    assert_eq!(s.state(), &FormState::Ready);
    assert_eq!(interview(&s).subject_age, Some(16));
    assert_eq!(interview(&s).current_address, "Calle Uno 55");
  }

  #[test]
  fn missing_subject_renders_not_found() {
    let mut s = FormSession::new(FormType::SecurityIntake);
    let id = Uuid::new_v4();
    s.begin_load(id);
    assert_eq!(s.state(), &FormState::Loading);
    s.finish_load(Err(LookupError::NotFound(id)), None);
    assert_eq!(s.state(), &FormState::NotFound);
    assert!(s.apply(FormAction::set("officer_name", "x")).is_err());
  }

  #[test]
  fn edits_move_to_editing() {
    let mut s = ready();
    s.apply(FormAction::set("interviewer_name", "Pía Lagos")).unwrap();
    assert_eq!(s.state(), &FormState::Editing);
    assert_eq!(interview(&s).interviewer_name, "Pía Lagos");
  }

  #[test]
  fn blank_required_field_blocks_submit_and_names_field() {
    let mut s = ready();
    s.apply(FormAction::set("lives_with", "abuela")).unwrap();
    let err = s.begin_submit().unwrap_err();
    let SubmitError::Validation(errors) = err else { panic!("expected validation error") };
    assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["interviewer_name"]);
    assert!(errors.to_string().contains("interviewer_name"));
    assert_eq!(s.state(), &FormState::Editing);
    assert_eq!(s.field_errors().len(), 1);
  }

  #[test]
  fn unselected_subject_is_a_required_field() {
    let mut s = FormSession::new(FormType::SecurityIntake);
    // Simulate a page opened without a subject: load straight to Ready.
    s.state = FormState::Ready;
    s.apply(FormAction::set("officer_name", "Cabo Díaz")).unwrap();
    let SubmitError::Validation(errors) = s.begin_submit().unwrap_err() else {
      panic!("expected validation error")
    };
    assert_eq!(errors.fields().collect::<Vec<_>>(), vec![SUBJECT_FIELD]);

    s.apply(FormAction::SelectSubject(Uuid::new_v4())).unwrap();
    assert!(s.begin_submit().is_ok());
  }

  #[test]
  fn gate_toggle_preserves_dependent_text() {
    let mut s = ready();
    s.apply(FormAction::set("substance_use", true)).unwrap();
    s.apply(FormAction::set("substance_use_details", "marihuana ocasional")).unwrap();
    s.apply(FormAction::set("substance_use", false)).unwrap();
    s.apply(FormAction::set("substance_use", true)).unwrap();
    assert_eq!(
      interview(&s).substance_use_details.as_deref(),
      Some("marihuana ocasional")
    );
  }

  #[test]
  fn closed_gate_is_cleared_in_submitted_payload_only_after_normalizing() {
    let mut s = ready();
    s.apply(FormAction::set("interviewer_name", "Pía Lagos")).unwrap();
    s.apply(FormAction::set("works", true)).unwrap();
    s.apply(FormAction::set("work_details", "feria libre")).unwrap();
    s.apply(FormAction::set("works", false)).unwrap();

    let (_, payload) = s.begin_submit().unwrap();
    let FormPayload::AdolescentInitialInterview(raw) = &payload else { unreachable!() };
    assert_eq!(raw.work_details.as_deref(), Some("feria libre"));
    let FormPayload::AdolescentInitialInterview(clean) = payload.normalized() else {
      unreachable!()
    };
    assert_eq!(clean.work_details, None);
  }

  #[test]
  fn double_submit_is_refused() {
    let mut s = ready();
    s.apply(FormAction::set("interviewer_name", "Pía Lagos")).unwrap();
    s.begin_submit().unwrap();
    assert!(matches!(s.begin_submit(), Err(SubmitError::Busy("submitting"))));
    assert!(matches!(s.apply(FormAction::set("works", true)), Err(SessionError::Busy(_))));
    s.abandon_submit();
    assert_eq!(s.state(), &FormState::Editing);
  }

  #[test]
  fn failed_save_keeps_draft() {
    let mut s = ready();
    s.apply(FormAction::set("interviewer_name", "Pía Lagos")).unwrap();
    let before = s.draft().clone();
    s.begin_submit().unwrap();
    s.finish_submit(&Err(PersistenceError::SubjectNotFound(Uuid::new_v4())));
    assert!(matches!(s.state(), FormState::Submitted(SubmitStatus::Failed(_))));
    assert_eq!(s.draft(), &before);
    // Retry is allowed straight away.
    assert!(s.begin_submit().is_ok());
  }

  #[test]
  fn replace_rejects_other_form_type() {
    let draft = FormDraft::blank(FormType::FamilyInterview);
    let err = reduce(&draft, FormAction::Replace(FormType::SecurityIntake.blank_payload()));
    assert!(err.is_err());
  }

  #[test]
  fn set_field_with_wrong_type_is_rejected() {
    let mut s = ready();
    let err = s.apply(FormAction::SetField { field: "works".into(), value: json!("sí") });
    assert!(matches!(err, Err(SessionError::Field(_))));
  }
}
