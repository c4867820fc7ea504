//! Subject ("joven") — the young person a case file is about.
//!
//! Subjects are created by the external intake workflow. From the point of
//! view of the forms they are read-only; [`NewSubject`] exists for imports
//! and tests.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::date::age_on;

/// A person under case management.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
  pub subject_id:                 Uuid,
  pub given_names:                String,
  pub surnames:                   String,
  pub birth_date:                 Option<NaiveDate>,
  pub birthplace:                 Option<String>,
  pub address:                    Option<String>,
  pub intake_date:                Option<NaiveDate>,
  pub administrative_case_number: Option<String>,
  pub judicial_case_number:       Option<String>,
  /// Facility the subject is assigned to.
  pub center:                     Option<String>,
  pub active:                     bool,
  pub created_at:                 DateTime<Utc>,
}

impl Subject {
  /// Given names followed by surnames, single-space separated.
  pub fn full_name(&self) -> String {
    format!("{} {}", self.given_names.trim(), self.surnames.trim())
      .trim()
      .to_owned()
  }
}

/// Input to [`crate::store::CaseStore::add_subject`].
/// `subject_id` and `created_at` are assigned by the store.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewSubject {
  pub given_names:                String,
  pub surnames:                   String,
  pub birth_date:                 Option<NaiveDate>,
  pub birthplace:                 Option<String>,
  pub address:                    Option<String>,
  pub intake_date:                Option<NaiveDate>,
  pub administrative_case_number: Option<String>,
  pub judicial_case_number:       Option<String>,
  pub center:                     Option<String>,
  #[serde(default = "default_active")]
  pub active:                     bool,
}

fn default_active() -> bool { true }

impl NewSubject {
  pub fn new(given_names: impl Into<String>, surnames: impl Into<String>) -> Self {
    Self {
      given_names: given_names.into(),
      surnames: surnames.into(),
      active: true,
      ..Default::default()
    }
  }
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// The pre-fill view of a subject handed to form pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectProfile {
  #[serde(flatten)]
  pub subject: Subject,
  /// Completed years of age at `as_of`; `None` without a usable birth date.
  pub age:     Option<u32>,
  pub as_of:   NaiveDate,
}

impl SubjectProfile {
  pub fn new(subject: Subject, as_of: NaiveDate) -> Self {
    let age = subject.birth_date.and_then(|b| age_on(b, as_of));
    Self { subject, age, as_of }
  }
}
