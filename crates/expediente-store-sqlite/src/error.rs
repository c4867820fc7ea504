//! Error type for `expediente-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] expediente_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("form instance not found: {0}")]
  FormNotFound(uuid::Uuid),

  #[error("attention type role {0:?} is already registered")]
  DuplicateRole(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
