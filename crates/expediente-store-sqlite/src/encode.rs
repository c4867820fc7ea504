//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are fixed-width RFC 3339 strings, calendar dates are `YYYY-MM-DD`, UUIDs
//! are hyphenated lowercase strings and payloads are compact JSON.

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound as _, Utc};
use expediente_core::{
  attention::{Attention, AttentionStatus, AttentionType},
  form::{FormInstance, FormPayload, FormType},
  subject::Subject,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// The current time at the precision the store keeps.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

/// Fixed-width RFC 3339 so that string order is chronological order.
pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `subjects` row.
pub struct RawSubject {
  pub subject_id:                 String,
  pub given_names:                String,
  pub surnames:                   String,
  pub birth_date:                 Option<String>,
  pub birthplace:                 Option<String>,
  pub address:                    Option<String>,
  pub intake_date:                Option<String>,
  pub administrative_case_number: Option<String>,
  pub judicial_case_number:       Option<String>,
  pub center:                     Option<String>,
  pub active:                     bool,
  pub created_at:                 String,
}

/// Column list matching [`RawSubject::from_row`].
pub const SUBJECT_COLUMNS: &str = "subject_id, given_names, surnames, birth_date, birthplace, \
   address, intake_date, administrative_case_number, judicial_case_number, center, active, \
   created_at";

impl RawSubject {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subject_id:                 row.get(0)?,
      given_names:                row.get(1)?,
      surnames:                   row.get(2)?,
      birth_date:                 row.get(3)?,
      birthplace:                 row.get(4)?,
      address:                    row.get(5)?,
      intake_date:                row.get(6)?,
      administrative_case_number: row.get(7)?,
      judicial_case_number:       row.get(8)?,
      center:                     row.get(9)?,
      active:                     row.get(10)?,
      created_at:                 row.get(11)?,
    })
  }

  pub fn into_subject(self) -> Result<Subject> {
    Ok(Subject {
      subject_id:                 decode_uuid(&self.subject_id)?,
      given_names:                self.given_names,
      surnames:                   self.surnames,
      birth_date:                 self.birth_date.as_deref().map(decode_date).transpose()?,
      birthplace:                 self.birthplace,
      address:                    self.address,
      intake_date:                self.intake_date.as_deref().map(decode_date).transpose()?,
      administrative_case_number: self.administrative_case_number,
      judicial_case_number:       self.judicial_case_number,
      center:                     self.center,
      active:                     self.active,
      created_at:                 decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from an `attention_types` row.
pub struct RawAttentionType {
  pub attention_type_id: String,
  pub role:              String,
  pub name:              String,
}

impl RawAttentionType {
  pub fn into_attention_type(self) -> Result<AttentionType> {
    Ok(AttentionType {
      attention_type_id: decode_uuid(&self.attention_type_id)?,
      role:              self.role,
      name:              self.name,
    })
  }
}

/// Raw values read directly from an `attentions` row.
pub struct RawAttention {
  pub attention_id:      String,
  pub subject_id:        String,
  pub attention_type_id: String,
  pub professional:      String,
  pub occurred_at:       String,
  pub reason:            String,
  pub status:            String,
}

impl RawAttention {
  pub fn into_attention(self) -> Result<Attention> {
    let status: AttentionStatus = self
      .status
      .parse()
      .map_err(|_| expediente_core::Error::UnknownAttentionStatus(self.status.clone()))?;
    Ok(Attention {
      attention_id:      decode_uuid(&self.attention_id)?,
      subject_id:        decode_uuid(&self.subject_id)?,
      attention_type_id: decode_uuid(&self.attention_type_id)?,
      professional:      self.professional,
      occurred_at:       decode_dt(&self.occurred_at)?,
      reason:            self.reason,
      status,
    })
  }
}

/// Raw values read directly from a `form_instances` row.
pub struct RawFormInstance {
  pub form_id:        String,
  pub subject_id:     String,
  pub form_type:      String,
  pub schema_version: u32,
  pub payload_json:   String,
  pub created_at:     String,
  pub updated_at:     String,
  pub attention_id:   Option<String>,
}

/// Column list matching [`RawFormInstance::from_row`].
pub const FORM_COLUMNS: &str = "form_id, subject_id, form_type, schema_version, payload_json, \
   created_at, updated_at, attention_id";

impl RawFormInstance {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      form_id:        row.get(0)?,
      subject_id:     row.get(1)?,
      form_type:      row.get(2)?,
      schema_version: row.get(3)?,
      payload_json:   row.get(4)?,
      created_at:     row.get(5)?,
      updated_at:     row.get(6)?,
      attention_id:   row.get(7)?,
    })
  }

  /// Decode the row, migrating the payload to its current schema version.
  pub fn into_instance(self) -> Result<FormInstance> {
    let form_type = FormType::parse(&self.form_type)?;
    let data: serde_json::Value = serde_json::from_str(&self.payload_json)?;
    let payload = FormPayload::decode(form_type, self.schema_version, data)?;
    Ok(FormInstance {
      form_id: decode_uuid(&self.form_id)?,
      subject_id: decode_uuid(&self.subject_id)?,
      form_type,
      payload,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
      attention_id: self.attention_id.as_deref().map(decode_uuid).transpose()?,
    })
  }
}
