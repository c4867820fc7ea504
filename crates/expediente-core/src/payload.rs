//! Strongly typed field sets, one per [`FormType`](crate::form::FormType).
//!
//! Every struct is `#[serde(default)]` so a payload stored before a field was
//! added still decodes. Renames and removals go through
//! [`crate::form::migrate`] instead.
//!
//! Gated fields are `Option<String>` details behind a `bool` question ("did X
//! happen?"). Their values survive toggling the gate while a form is being
//! edited and are cleared by [`FormFields::clear_hidden`] before saving.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::subject::SubjectProfile;

// ─── FormFields ──────────────────────────────────────────────────────────────

/// Behaviour shared by every form's field set.
pub trait FormFields {
  /// Name of the professional filling the form.
  fn professional(&self) -> &str;

  /// `(field name, current value)` for every required text field.
  fn required_fields(&self) -> Vec<(&'static str, &str)>;

  /// `(gate is open, dependent field)` pairs.
  fn gates_mut(&mut self) -> Vec<(bool, &mut Option<String>)>;

  /// Fill empty defaults from the subject profile. Never overwrites data.
  fn prefill(&mut self, profile: &SubjectProfile);

  fn missing_required(&self) -> Vec<&'static str> {
    self
      .required_fields()
      .into_iter()
      .filter(|(_, v)| v.trim().is_empty())
      .map(|(name, _)| name)
      .collect()
  }

  fn clear_hidden(&mut self) {
    for (open, field) in self.gates_mut() {
      if !open {
        *field = None;
      }
    }
  }
}

fn fill_text(slot: &mut String, value: Option<&String>) {
  if slot.trim().is_empty()
    && let Some(v) = value
  {
    slot.clone_from(v);
  }
}

fn fill_date(slot: &mut Option<NaiveDate>, value: Option<NaiveDate>) {
  if slot.is_none() {
    *slot = value;
  }
}

// ─── Social work: initial interview ──────────────────────────────────────────

/// Initial interview with the adolescent, held by social work
/// (`entrevista_inicial_adolescente_pmspl`). Schema version 2.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdolescentInitialInterview {
  pub interview_date:         Option<NaiveDate>,
  pub interviewer_name:       String,
  /// Age at the time of the interview, pre-filled from the birth date.
  pub subject_age:            Option<u32>,
  pub current_address:        String,
  pub lives_with:             String,

  pub attends_school:         bool,
  pub school_name:            Option<String>,
  pub left_school:            bool,
  pub left_school_reason:     Option<String>,

  pub works:                  bool,
  pub work_details:           Option<String>,

  pub substance_use:          bool,
  pub substance_use_details:  Option<String>,

  pub prior_measures:         bool,
  pub prior_measures_details: Option<String>,

  pub observations:           String,
}

impl FormFields for AdolescentInitialInterview {
  fn professional(&self) -> &str { &self.interviewer_name }

  fn required_fields(&self) -> Vec<(&'static str, &str)> {
    vec![("interviewer_name", &self.interviewer_name)]
  }

  fn gates_mut(&mut self) -> Vec<(bool, &mut Option<String>)> {
    vec![
      (self.attends_school, &mut self.school_name),
      (self.left_school, &mut self.left_school_reason),
      (self.works, &mut self.work_details),
      (self.substance_use, &mut self.substance_use_details),
      (self.prior_measures, &mut self.prior_measures_details),
    ]
  }

  fn prefill(&mut self, profile: &SubjectProfile) {
    fill_text(&mut self.current_address, profile.subject.address.as_ref());
    fill_date(&mut self.interview_date, Some(profile.as_of));
    if self.subject_age.is_none() {
      self.subject_age = profile.age;
    }
  }
}

// ─── Social work: family interview ───────────────────────────────────────────

/// Interview with a family member or guardian (`entrevista_familiar`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FamilyInterview {
  pub interview_date:                 Option<NaiveDate>,
  pub interviewer_name:               String,
  pub informant_name:                 String,
  pub informant_relationship:         String,
  pub household_members:              Option<u32>,
  pub household_income:               Option<String>,

  pub domestic_violence:              bool,
  pub domestic_violence_details:      Option<String>,

  pub family_criminal_record:         bool,
  pub family_criminal_record_details: Option<String>,

  pub observations:                   String,
}

impl FormFields for FamilyInterview {
  fn professional(&self) -> &str { &self.interviewer_name }

  fn required_fields(&self) -> Vec<(&'static str, &str)> {
    vec![
      ("interviewer_name", &self.interviewer_name),
      ("informant_name", &self.informant_name),
    ]
  }

  fn gates_mut(&mut self) -> Vec<(bool, &mut Option<String>)> {
    vec![
      (self.domestic_violence, &mut self.domestic_violence_details),
      (self.family_criminal_record, &mut self.family_criminal_record_details),
    ]
  }

  fn prefill(&mut self, profile: &SubjectProfile) {
    fill_date(&mut self.interview_date, Some(profile.as_of));
  }
}

// ─── Psychology ──────────────────────────────────────────────────────────────

/// Initial psychological assessment (`evaluacion_psicologica`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PsychologicalAssessment {
  pub assessment_date:               Option<NaiveDate>,
  pub psychologist_name:             String,
  pub subject_age:                   Option<u32>,
  pub reason_for_referral:           String,

  pub mental_health_history:         bool,
  pub mental_health_history_details: Option<String>,

  pub self_harm_risk:                bool,
  pub self_harm_details:             Option<String>,

  pub medication:                    bool,
  pub medication_details:            Option<String>,

  /// Names of the instruments applied (tests, scales).
  pub instruments_applied:           Vec<String>,
  pub clinical_impression:           String,
  pub recommendations:               String,
}

impl FormFields for PsychologicalAssessment {
  fn professional(&self) -> &str { &self.psychologist_name }

  fn required_fields(&self) -> Vec<(&'static str, &str)> {
    vec![("psychologist_name", &self.psychologist_name)]
  }

  fn gates_mut(&mut self) -> Vec<(bool, &mut Option<String>)> {
    vec![
      (self.mental_health_history, &mut self.mental_health_history_details),
      (self.self_harm_risk, &mut self.self_harm_details),
      (self.medication, &mut self.medication_details),
    ]
  }

  fn prefill(&mut self, profile: &SubjectProfile) {
    fill_date(&mut self.assessment_date, Some(profile.as_of));
    if self.subject_age.is_none() {
      self.subject_age = profile.age;
    }
  }
}

// ─── Security ────────────────────────────────────────────────────────────────

/// Security intake record filled on admission (`ficha_ingreso_seguridad`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityIntake {
  pub intake_date:        Option<NaiveDate>,
  pub officer_name:       String,
  pub center:             String,
  pub belongings:         String,

  pub injuries_observed:  bool,
  pub injuries_details:   Option<String>,

  pub gang_affiliation:   bool,
  pub gang_details:       Option<String>,

  pub contraband_found:   bool,
  pub contraband_details: Option<String>,

  pub observations:       String,
}

impl FormFields for SecurityIntake {
  fn professional(&self) -> &str { &self.officer_name }

  fn required_fields(&self) -> Vec<(&'static str, &str)> {
    vec![("officer_name", &self.officer_name)]
  }

  fn gates_mut(&mut self) -> Vec<(bool, &mut Option<String>)> {
    vec![
      (self.injuries_observed, &mut self.injuries_details),
      (self.gang_affiliation, &mut self.gang_details),
      (self.contraband_found, &mut self.contraband_details),
    ]
  }

  fn prefill(&mut self, profile: &SubjectProfile) {
    fill_date(&mut self.intake_date, profile.subject.intake_date);
    fill_text(&mut self.center, profile.subject.center.as_ref());
  }
}
