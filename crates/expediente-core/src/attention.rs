//! Attentions (encounters) and their reference categories.
//!
//! An attention records one professional's contact with a subject. Some form
//! types create one as part of their first save; it is never modified
//! afterwards by this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Role tag of the social-work attention type.
pub const ROLE_SOCIAL_WORK: &str = "trabajo_social";
/// Role tag of the psychology attention type.
pub const ROLE_PSYCHOLOGY: &str = "psicologia";

/// A category of professional encounter, looked up by its `role` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttentionType {
  pub attention_type_id: Uuid,
  /// Unique tag, e.g. `"trabajo_social"`.
  pub role:              String,
  /// Human-readable label.
  pub name:              String,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
  EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttentionStatus {
  #[default]
  Registered,
  Closed,
}

/// One professional's contact session with a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attention {
  pub attention_id:      Uuid,
  pub subject_id:        Uuid,
  pub attention_type_id: Uuid,
  /// Name of the professional who held the session.
  pub professional:      String,
  pub occurred_at:       DateTime<Utc>,
  pub reason:            String,
  pub status:            AttentionStatus,
}

/// An attention to be created alongside a form insert.
/// `attention_id` and `occurred_at` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewAttention {
  pub subject_id:        Uuid,
  pub attention_type_id: Uuid,
  pub professional:      String,
  pub reason:            String,
  pub status:            AttentionStatus,
}
