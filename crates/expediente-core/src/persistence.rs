//! Form persistence: "get latest, then save or update".
//!
//! The first save of a form type for a subject inserts a new instance (and,
//! for types that need one, its attention in the same transaction). Later
//! saves replace the payload of that latest instance, keeping its id and
//! creation time.

use std::{future::Future, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
  attention::{AttentionStatus, AttentionType, NewAttention},
  form::{FormInstance, FormPayload, FormType, FormWrite, NewFormInstance},
  store::CaseStore,
};

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PersistenceError {
  #[error("subject not found: {0}")]
  SubjectNotFound(Uuid),

  /// No attention type is registered for the role a form type requires.
  #[error("no attention type registered for role {0:?}")]
  AttentionTypeUnavailable(String),

  #[error("storage call timed out after {0:?}")]
  TimedOut(Duration),

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

// ─── Config ──────────────────────────────────────────────────────────────────

/// Timeouts applied to every storage call the services make.
#[derive(Debug, Clone, Copy)]
pub struct ServiceConfig {
  pub read_timeout:  Duration,
  pub write_timeout: Duration,
}

impl Default for ServiceConfig {
  fn default() -> Self {
    Self {
      read_timeout:  Duration::from_secs(10),
      write_timeout: Duration::from_secs(15),
    }
  }
}

// ─── Outcome ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveKind {
  Inserted,
  Updated,
}

/// Result of [`FormService::save_or_update`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveOutcome {
  pub kind:     SaveKind,
  pub instance: FormInstance,
}

// ─── Service ─────────────────────────────────────────────────────────────────

pub struct FormService<S> {
  store:  Arc<S>,
  config: ServiceConfig,
}

impl<S> Clone for FormService<S> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), config: self.config }
  }
}

impl<S: CaseStore> FormService<S> {
  pub fn new(store: Arc<S>, config: ServiceConfig) -> Self { Self { store, config } }

  async fn bounded<T, E, F>(&self, limit: Duration, fut: F) -> Result<T, PersistenceError>
  where
    F: Future<Output = Result<T, E>>,
    E: std::error::Error + Send + Sync + 'static,
  {
    match tokio::time::timeout(limit, fut).await {
      Ok(Ok(v)) => Ok(v),
      Ok(Err(e)) => Err(PersistenceError::Storage(Box::new(e))),
      Err(_) => Err(PersistenceError::TimedOut(limit)),
    }
  }

  /// The most recently created instance of `form_type` for `subject_id`.
  /// Read-only.
  pub async fn get_latest_form_instance(
    &self,
    subject_id: Uuid,
    form_type: FormType,
  ) -> Result<Option<FormInstance>, PersistenceError> {
    self
      .bounded(self.config.read_timeout, self.store.latest_form(subject_id, form_type))
      .await
  }

  /// Save `payload` as the current form of its type for `subject_id`.
  ///
  /// Hidden (gated-off) fields are cleared before writing. Exactly one form
  /// write is issued: an update of the latest instance if there is one, an
  /// insert otherwise.
  pub async fn save_or_update(
    &self,
    subject_id: Uuid,
    payload: FormPayload,
  ) -> Result<SaveOutcome, PersistenceError> {
    let form_type = payload.form_type();
    let payload = payload.normalized();

    let write = match self.get_latest_form_instance(subject_id, form_type).await? {
      Some(current) => FormWrite::Update { form_id: current.form_id, payload },
      None => self.insert_write(subject_id, payload).await?,
    };
    let kind = match write {
      FormWrite::Insert { .. } => SaveKind::Inserted,
      FormWrite::Update { .. } => SaveKind::Updated,
    };

    let instance = self
      .bounded(self.config.write_timeout, self.store.write_form(write))
      .await
      .inspect_err(|e| {
        tracing::error!(%subject_id, %form_type, error = %e, "form save failed");
      })?;

    tracing::info!(
      %subject_id,
      %form_type,
      form_id = %instance.form_id,
      ?kind,
      "form saved"
    );
    Ok(SaveOutcome { kind, instance })
  }

  async fn insert_write(
    &self,
    subject_id: Uuid,
    payload: FormPayload,
  ) -> Result<FormWrite, PersistenceError> {
    let read = self.config.read_timeout;
    if self.bounded(read, self.store.get_subject(subject_id)).await?.is_none() {
      return Err(PersistenceError::SubjectNotFound(subject_id));
    }

    let form_type = payload.form_type();
    let attention = match form_type.attention_role() {
      None => None,
      Some(role) => {
        let kind = self
          .bounded(read, self.store.find_attention_type(role))
          .await?
          .ok_or_else(|| PersistenceError::AttentionTypeUnavailable(role.to_owned()))?;
        Some(NewAttention {
          subject_id,
          attention_type_id: kind.attention_type_id,
          professional: payload.professional().trim().to_owned(),
          reason: form_type.title().to_owned(),
          status: AttentionStatus::Registered,
        })
      }
    };

    Ok(FormWrite::Insert {
      form: NewFormInstance { subject_id, payload },
      attention,
    })
  }

  /// The attention type registered for `role`, if any.
  pub async fn attention_type(
    &self,
    role: &str,
  ) -> Result<Option<AttentionType>, PersistenceError> {
    self
      .bounded(self.config.read_timeout, self.store.find_attention_type(role))
      .await
  }

  /// The case file of a subject: the current instance of each form type,
  /// newest first.
  pub async fn list_case_file(
    &self,
    subject_id: Uuid,
  ) -> Result<Vec<FormInstance>, PersistenceError> {
    let all = self
      .bounded(self.config.read_timeout, self.store.list_forms(subject_id))
      .await?;
    let mut seen = Vec::new();
    Ok(
      all
        .into_iter()
        .filter(|f| {
          if seen.contains(&f.form_type) {
            false
          } else {
            seen.push(f.form_type);
            true
          }
        })
        .collect(),
    )
  }
}
