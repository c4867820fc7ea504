//! Error types for `expediente-core`.
//!
//! [`Error`] covers domain-level failures (bad tags, payload decoding). The
//! service-level taxonomies live next to their services:
//! [`LookupError`](crate::lookup::LookupError),
//! [`PersistenceError`](crate::persistence::PersistenceError) and
//! [`SubmitError`](crate::session::SubmitError).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown form type: {0:?}")]
  UnknownFormType(String),

  #[error("unknown attention status: {0:?}")]
  UnknownAttentionStatus(String),

  #[error("form {form_type} has no schema version {version}")]
  UnsupportedSchemaVersion { form_type: String, version: u32 },

  #[error("malformed {form_type} payload: {reason}")]
  MalformedPayload { form_type: String, reason: String },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
