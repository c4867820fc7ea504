//! The `CaseStore` trait — the storage contract behind every service.
//!
//! Implemented by storage backends (e.g. `expediente-store-sqlite`). The
//! services in this crate receive a store explicitly; there is no global
//! client.

use std::future::Future;

use uuid::Uuid;

use crate::{
  attention::{Attention, AttentionType},
  form::{FormInstance, FormType, FormWrite},
  subject::{NewSubject, Subject},
};

/// Abstraction over an Expediente storage backend.
///
/// All methods return `Send` futures so the trait can be used from a
/// multi-threaded runtime (tokio with `axum`).
pub trait CaseStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Subjects ──────────────────────────────────────────────────────────

  /// Persist a subject coming from the intake workflow.
  fn add_subject(
    &self,
    input: NewSubject,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + '_;

  /// Retrieve a subject by UUID. Returns `None` if not found.
  fn get_subject(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  /// All subjects flagged active, in intake order.
  fn list_active_subjects(
    &self,
  ) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + '_;

  // ── Attention types ───────────────────────────────────────────────────

  /// Register an attention type. Fails if `role` is already taken.
  fn add_attention_type(
    &self,
    role: String,
    name: String,
  ) -> impl Future<Output = Result<AttentionType, Self::Error>> + Send + '_;

  /// Exact match on `role`; `None` if no such row exists.
  fn find_attention_type<'a>(
    &'a self,
    role: &'a str,
  ) -> impl Future<Output = Result<Option<AttentionType>, Self::Error>> + Send + 'a;

  fn get_attention(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Attention>, Self::Error>> + Send + '_;

  // ── Form instances ────────────────────────────────────────────────────

  /// The most recently created instance of `form_type` for `subject_id`.
  fn latest_form(
    &self,
    subject_id: Uuid,
    form_type: FormType,
  ) -> impl Future<Output = Result<Option<FormInstance>, Self::Error>> + Send + '_;

  /// Every instance stored for a subject, newest first.
  fn list_forms(
    &self,
    subject_id: Uuid,
  ) -> impl Future<Output = Result<Vec<FormInstance>, Self::Error>> + Send + '_;

  /// Apply a single form write atomically.
  ///
  /// An insert carrying an attention commits both rows or neither. Updating
  /// an unknown `form_id` is an error.
  fn write_form(
    &self,
    write: FormWrite,
  ) -> impl Future<Output = Result<FormInstance, Self::Error>> + Send + '_;
}
