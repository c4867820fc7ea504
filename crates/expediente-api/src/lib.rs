//! JSON REST API for Expediente.
//!
//! Exposes an axum [`Router`] backed by any [`CaseStore`]. Every storage
//! call goes through the core services and is bounded by their timeouts.
//! Auth and TLS are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", expediente_api::api_router(store.clone(), ServiceConfig::default()))
//! ```

pub mod attention_types;
pub mod error;
pub mod extract;
pub mod forms;
pub mod subjects;

use std::sync::Arc;

use axum::{Router, routing::get};
use expediente_core::{
  lookup::SubjectLookup,
  persistence::{FormService, ServiceConfig},
  store::CaseStore,
};

pub use error::ApiError;

/// Services shared by all handlers.
pub struct ApiState<S> {
  pub lookup: SubjectLookup<S>,
  pub forms:  FormService<S>,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self { lookup: self.lookup.clone(), forms: self.forms.clone() }
  }
}

impl<S: CaseStore> ApiState<S> {
  pub fn new(store: Arc<S>, config: ServiceConfig) -> Self {
    Self {
      lookup: SubjectLookup::new(store.clone(), config.read_timeout),
      forms:  FormService::new(store, config),
    }
  }
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, config: ServiceConfig) -> Router<()>
where
  S: CaseStore + 'static,
{
  Router::new()
    // Subjects
    .route("/subjects", get(subjects::search::<S>))
    .route("/subjects/{id}", get(subjects::get_one::<S>))
    // Forms
    .route("/subjects/{id}/forms", get(forms::case_file::<S>))
    .route(
      "/subjects/{id}/forms/{form_type}",
      get(forms::get_latest::<S>).put(forms::save::<S>),
    )
    // Reference data
    .route("/attention-types/{role}", get(attention_types::get_one::<S>))
    .with_state(ApiState::new(store, config))
}

#[cfg(test)]
mod tests;
