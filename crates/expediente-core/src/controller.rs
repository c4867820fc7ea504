//! Async driver for one form page.
//!
//! Wires a [`FormSession`] to the lookup and persistence services. Every
//! remote call is bounded by the service timeouts. Dropping a pending
//! `open` or `submit` future cancels it; a cancelled submit leaves the
//! session back in `Editing` with the draft intact.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
  form::FormType,
  lookup::{LookupError, SubjectLookup},
  persistence::{FormService, SaveOutcome, ServiceConfig},
  session::{FormAction, FormSession, FormState, SessionError, SubmitError},
  store::CaseStore,
};

pub struct FormController<S> {
  lookup:  SubjectLookup<S>,
  forms:   FormService<S>,
  session: FormSession,
}

impl<S: CaseStore> FormController<S> {
  pub fn new(store: Arc<S>, config: ServiceConfig, form_type: FormType) -> Self {
    Self {
      lookup:  SubjectLookup::new(store.clone(), config.read_timeout),
      forms:   FormService::new(store, config),
      session: FormSession::new(form_type),
    }
  }

  pub fn session(&self) -> &FormSession { &self.session }

  /// Load the subject and its latest saved form of this type.
  pub async fn open(&mut self, subject_id: Uuid) -> &FormState {
    let form_type = self.session.form_type();
    self.session = FormSession::new(form_type);
    self.session.begin_load(subject_id);

    let profile = self.lookup.profile(subject_id).await;
    let saved = match &profile {
      Ok(_) => match self.forms.get_latest_form_instance(subject_id, form_type).await {
        Ok(latest) => Ok(latest.map(|f| f.payload)),
        Err(e) => {
          tracing::warn!(%subject_id, %form_type, error = %e, "could not load saved form");
          Err(e)
        }
      },
      Err(_) => Ok(None),
    };

    match saved {
      Ok(saved) => self.session.finish_load(profile, saved),
      Err(e) => self.session.finish_load(Err(LookupError::Storage(Box::new(e))), None),
    }
    self.session.state()
  }

  pub fn dispatch(&mut self, action: FormAction) -> Result<(), SessionError> {
    self.session.apply(action)
  }

  /// Validate and save. Nothing is written if validation fails.
  pub async fn submit(&mut self) -> Result<SaveOutcome, SubmitError> {
    let (subject_id, payload) = self.session.begin_submit()?;
    let guard = InFlight(&mut self.session);
    let result = self.forms.save_or_update(subject_id, payload).await;
    guard.0.finish_submit(&result);
    Ok(result?)
  }
}

/// Resets a session stuck in `Submitting` when a submit future is dropped.
struct InFlight<'a>(&'a mut FormSession);

impl Drop for InFlight<'_> {
  fn drop(&mut self) { self.0.abandon_submit(); }
}
