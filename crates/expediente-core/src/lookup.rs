//! Subject lookup: profile pre-fill and search.

use std::{sync::Arc, time::Duration};

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::{
  date::today,
  search::filter_subjects,
  store::CaseStore,
  subject::{Subject, SubjectProfile},
};

#[derive(Debug, Error)]
pub enum LookupError {
  #[error("subject not found: {0}")]
  NotFound(Uuid),

  #[error("subject lookup timed out after {0:?}")]
  TimedOut(Duration),

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Reads subjects for form pages.
pub struct SubjectLookup<S> {
  store:   Arc<S>,
  timeout: Duration,
}

impl<S> Clone for SubjectLookup<S> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), timeout: self.timeout }
  }
}

impl<S: CaseStore> SubjectLookup<S> {
  pub fn new(store: Arc<S>, timeout: Duration) -> Self { Self { store, timeout } }

  /// Profile of `subject_id` with its age as of today.
  pub async fn profile(&self, subject_id: Uuid) -> Result<SubjectProfile, LookupError> {
    self.profile_as_of(subject_id, today()).await
  }

  /// Profile of `subject_id` with its age as of `as_of`.
  pub async fn profile_as_of(
    &self,
    subject_id: Uuid,
    as_of: NaiveDate,
  ) -> Result<SubjectProfile, LookupError> {
    let subject = match tokio::time::timeout(self.timeout, self.store.get_subject(subject_id)).await {
      Err(_) => {
        tracing::warn!(%subject_id, "subject lookup timed out");
        return Err(LookupError::TimedOut(self.timeout));
      }
      Ok(Err(e)) => {
        tracing::warn!(%subject_id, error = %e, "subject lookup failed");
        return Err(LookupError::Storage(Box::new(e)));
      }
      Ok(Ok(None)) => return Err(LookupError::NotFound(subject_id)),
      Ok(Ok(Some(s))) => s,
    };
    Ok(SubjectProfile::new(subject, as_of))
  }

  /// Active subjects whose name contains `term`; see
  /// [`filter_subjects`](crate::search::filter_subjects).
  pub async fn search(&self, term: &str) -> Result<Vec<Subject>, LookupError> {
    let subjects = match tokio::time::timeout(self.timeout, self.store.list_active_subjects()).await {
      Err(_) => {
        tracing::warn!("subject listing timed out");
        return Err(LookupError::TimedOut(self.timeout));
      }
      Ok(Err(e)) => {
        tracing::warn!(error = %e, "subject listing failed");
        return Err(LookupError::Storage(Box::new(e)));
      }
      Ok(Ok(list)) => list,
    };
    Ok(filter_subjects(&subjects, term).into_iter().cloned().collect())
  }
}
