//! Form types, form instances and their versioned storage encoding.
//!
//! A form instance stores its payload as `(form_type, schema_version,
//! payload_json)`. Reading an instance written under an older schema version
//! runs the migrations in [`migrate`] until the payload reaches the current
//! version; nothing is silently reinterpreted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator as _};
use uuid::Uuid;

use crate::{
  Error, Result,
  attention::{NewAttention, ROLE_PSYCHOLOGY, ROLE_SOCIAL_WORK},
  payload::{
    AdolescentInitialInterview, FamilyInterview, FormFields,
    PsychologicalAssessment, SecurityIntake,
  },
};

// ─── FormType ────────────────────────────────────────────────────────────────

/// Tag identifying which structured form a payload belongs to.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
  EnumString, AsRefStr, Display, EnumIter,
)]
pub enum FormType {
  #[serde(rename = "entrevista_inicial_adolescente_pmspl")]
  #[strum(serialize = "entrevista_inicial_adolescente_pmspl")]
  AdolescentInitialInterview,

  #[serde(rename = "entrevista_familiar")]
  #[strum(serialize = "entrevista_familiar")]
  FamilyInterview,

  #[serde(rename = "evaluacion_psicologica")]
  #[strum(serialize = "evaluacion_psicologica")]
  PsychologicalAssessment,

  #[serde(rename = "ficha_ingreso_seguridad")]
  #[strum(serialize = "ficha_ingreso_seguridad")]
  SecurityIntake,
}

impl FormType {
  /// Parse a stored or routed tag.
  pub fn parse(tag: &str) -> Result<Self> {
    tag.parse().map_err(|_| Error::UnknownFormType(tag.to_owned()))
  }

  pub fn all() -> impl Iterator<Item = Self> { Self::iter() }

  /// Schema version new payloads of this type are written with.
  pub fn current_schema_version(self) -> u32 {
    match self {
      Self::AdolescentInitialInterview => 2,
      Self::FamilyInterview => 1,
      Self::PsychologicalAssessment => 1,
      Self::SecurityIntake => 1,
    }
  }

  /// Role tag of the attention type created with the first save, if any.
  pub fn attention_role(self) -> Option<&'static str> {
    match self {
      Self::AdolescentInitialInterview | Self::FamilyInterview => {
        Some(ROLE_SOCIAL_WORK)
      }
      Self::PsychologicalAssessment => Some(ROLE_PSYCHOLOGY),
      Self::SecurityIntake => None,
    }
  }

  /// Human-readable title; also used as the attention reason.
  pub fn title(self) -> &'static str {
    match self {
      Self::AdolescentInitialInterview => "Entrevista inicial adolescente PMSPL",
      Self::FamilyInterview => "Entrevista familiar",
      Self::PsychologicalAssessment => "Evaluación psicológica",
      Self::SecurityIntake => "Ficha de ingreso de seguridad",
    }
  }

  /// An empty payload of this type.
  pub fn blank_payload(self) -> FormPayload {
    match self {
      Self::AdolescentInitialInterview => {
        FormPayload::AdolescentInitialInterview(Default::default())
      }
      Self::FamilyInterview => FormPayload::FamilyInterview(Default::default()),
      Self::PsychologicalAssessment => {
        FormPayload::PsychologicalAssessment(Default::default())
      }
      Self::SecurityIntake => FormPayload::SecurityIntake(Default::default()),
    }
  }
}

// ─── FormPayload ─────────────────────────────────────────────────────────────

/// The typed payload of a form instance. The variant determines the
/// [`FormType`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "form_type", content = "data")]
pub enum FormPayload {
  #[serde(rename = "entrevista_inicial_adolescente_pmspl")]
  AdolescentInitialInterview(AdolescentInitialInterview),
  #[serde(rename = "entrevista_familiar")]
  FamilyInterview(FamilyInterview),
  #[serde(rename = "evaluacion_psicologica")]
  PsychologicalAssessment(PsychologicalAssessment),
  #[serde(rename = "ficha_ingreso_seguridad")]
  SecurityIntake(SecurityIntake),
}

/// A payload in its storage representation.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedPayload {
  pub form_type:      FormType,
  pub schema_version: u32,
  pub data:           Value,
}

impl FormPayload {
  pub fn form_type(&self) -> FormType {
    match self {
      Self::AdolescentInitialInterview(_) => FormType::AdolescentInitialInterview,
      Self::FamilyInterview(_) => FormType::FamilyInterview,
      Self::PsychologicalAssessment(_) => FormType::PsychologicalAssessment,
      Self::SecurityIntake(_) => FormType::SecurityIntake,
    }
  }

  pub(crate) fn fields(&self) -> &dyn FormFields {
    match self {
      Self::AdolescentInitialInterview(f) => f,
      Self::FamilyInterview(f) => f,
      Self::PsychologicalAssessment(f) => f,
      Self::SecurityIntake(f) => f,
    }
  }

  pub(crate) fn fields_mut(&mut self) -> &mut dyn FormFields {
    match self {
      Self::AdolescentInitialInterview(f) => f,
      Self::FamilyInterview(f) => f,
      Self::PsychologicalAssessment(f) => f,
      Self::SecurityIntake(f) => f,
    }
  }

  /// Name of the professional filling the form.
  pub fn professional(&self) -> &str { self.fields().professional() }

  /// Names of required fields that are blank.
  pub fn missing_required(&self) -> Vec<&'static str> {
    self.fields().missing_required()
  }

  /// A copy with every gated field whose gate is closed set to `None`.
  pub fn normalized(&self) -> Self {
    let mut out = self.clone();
    out.fields_mut().clear_hidden();
    out
  }

  /// Serialise the inner field set for storage at the current schema version.
  pub fn encode(&self) -> Result<EncodedPayload> {
    let full = serde_json::to_value(self)?;
    let data = full.get("data").cloned().unwrap_or(Value::Null);
    let form_type = self.form_type();
    Ok(EncodedPayload {
      form_type,
      schema_version: form_type.current_schema_version(),
      data,
    })
  }

  /// Rebuild a payload from its storage representation, migrating older
  /// schema versions forward.
  pub fn decode(form_type: FormType, schema_version: u32, data: Value) -> Result<Self> {
    let data = migrate(form_type, schema_version, data)?;
    let wrapped = serde_json::json!({ "form_type": form_type.as_ref(), "data": data });
    serde_json::from_value(wrapped).map_err(|e| Error::MalformedPayload {
      form_type: form_type.to_string(),
      reason:    e.to_string(),
    })
  }

  /// Return a copy with one top-level field replaced by `value`.
  ///
  /// Fails if the field does not exist on this form type or if `value` has
  /// the wrong shape for it.
  pub fn with_field(&self, field: &str, value: Value) -> Result<Self> {
    let encoded = self.encode()?;
    let mut data = match encoded.data {
      Value::Object(map) => map,
      _ => Map::new(),
    };
    if !data.contains_key(field) {
      return Err(Error::MalformedPayload {
        form_type: encoded.form_type.to_string(),
        reason:    format!("no field named {field:?}"),
      });
    }
    data.insert(field.to_owned(), value);
    Self::decode(encoded.form_type, encoded.schema_version, Value::Object(data))
  }
}

// ─── Migrations ──────────────────────────────────────────────────────────────

/// Bring `data` from `version` up to the current schema version of
/// `form_type`.
pub fn migrate(form_type: FormType, version: u32, mut data: Value) -> Result<Value> {
  let current = form_type.current_schema_version();
  if version == 0 || version > current {
    return Err(Error::UnsupportedSchemaVersion {
      form_type: form_type.to_string(),
      version,
    });
  }

  let mut v = version;
  while v < current {
    data = match (form_type, v) {
      (FormType::AdolescentInitialInterview, 1) => {
        rename_keys(data, &[
          ("interviewer", "interviewer_name"),
          ("school_dropout", "left_school"),
          ("school_dropout_reason", "left_school_reason"),
        ])
      }
      _ => {
        return Err(Error::UnsupportedSchemaVersion {
          form_type: form_type.to_string(),
          version:   v,
        });
      }
    };
    v += 1;
  }
  Ok(data)
}

fn rename_keys(data: Value, renames: &[(&str, &str)]) -> Value {
  match data {
    Value::Object(mut map) => {
      for (from, to) in renames {
        if let Some(v) = map.remove(*from) {
          map.insert((*to).to_owned(), v);
        }
      }
      Value::Object(map)
    }
    other => other,
  }
}

// ─── FormInstance ────────────────────────────────────────────────────────────

/// One saved occurrence of a form for a subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormInstance {
  pub form_id:      Uuid,
  pub subject_id:   Uuid,
  pub form_type:    FormType,
  pub payload:      FormPayload,
  /// Set once on insert; never changes.
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
  pub attention_id: Option<Uuid>,
}

/// Input to a [`FormWrite::Insert`]; ids and timestamps are assigned by the
/// store.
#[derive(Debug, Clone)]
pub struct NewFormInstance {
  pub subject_id: Uuid,
  pub payload:    FormPayload,
}

/// A single form write issued against a [`crate::store::CaseStore`].
#[derive(Debug, Clone)]
pub enum FormWrite {
  /// Create a new instance, optionally creating its attention in the same
  /// transaction.
  Insert {
    form:      NewFormInstance,
    attention: Option<NewAttention>,
  },
  /// Replace the payload of an existing instance. Id and `created_at` stay.
  Update {
    form_id: Uuid,
    payload: FormPayload,
  },
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn tags_round_trip_through_strum() {
    for ft in FormType::all() {
      assert_eq!(FormType::parse(ft.as_ref()).unwrap(), ft);
    }
    assert_eq!(
      FormType::AdolescentInitialInterview.as_ref(),
      "entrevista_inicial_adolescente_pmspl"
    );
  }

  #[test]
  fn unknown_tag_is_rejected() {
    let err = FormType::parse("entrevista_inexistente").unwrap_err();
    assert!(matches!(err, Error::UnknownFormType(t) if t == "entrevista_inexistente"));
  }

  #[test]
  fn serde_tag_matches_strum_tag() {
    for ft in FormType::all() {
      let s = serde_json::to_value(ft).unwrap();
      assert_eq!(s, Value::String(ft.to_string()));
      assert_eq!(ft.blank_payload().form_type(), ft);
    }
  }

  #[test]
  fn encode_writes_current_version() {
    let enc = FormType::AdolescentInitialInterview.blank_payload().encode().unwrap();
    assert_eq!(enc.schema_version, 2);
    assert!(enc.data.get("interviewer_name").is_some());
  }

  #[test]
  fn v1_initial_interview_is_migrated() {
    let v1 = json!({
      "interviewer": "Carla Núñez",
      "school_dropout": true,
      "school_dropout_reason": "trabajo",
    });
    let payload =
      FormPayload::decode(FormType::AdolescentInitialInterview, 1, v1).unwrap();
    let FormPayload::AdolescentInitialInterview(f) = payload else {
      panic!("wrong variant");
    };
    assert_eq!(f.interviewer_name, "Carla Núñez");
    assert!(f.left_school);
    assert_eq!(f.left_school_reason.as_deref(), Some("trabajo"));
  }

  #[test]
  fn future_version_is_rejected() {
    let err = FormPayload::decode(FormType::SecurityIntake, 9, json!({})).unwrap_err();
    assert!(matches!(err, Error::UnsupportedSchemaVersion { version: 9, .. }));
  }

  #[test]
  fn with_field_sets_known_field() {
    let p = FormType::SecurityIntake
      .blank_payload()
      .with_field("officer_name", json!("Sgto. Rojas"))
      .unwrap();
    assert_eq!(p.professional(), "Sgto. Rojas");
  }

  #[test]
  fn with_field_rejects_unknown_field_and_bad_type() {
    let blank = FormType::SecurityIntake.blank_payload();
    assert!(blank.with_field("no_such_field", json!("x")).is_err());
    assert!(blank.with_field("injuries_observed", json!("yes")).is_err());
  }
}
