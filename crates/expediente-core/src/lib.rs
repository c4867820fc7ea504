//! Core types, services and trait definitions for the Expediente case-file
//! backend.
//!
//! This crate is free of HTTP and database dependencies. Storage backends
//! implement [`store::CaseStore`]; the API and server crates drive the
//! services defined here.

// Native `async fn` in traits; the `Send` bounds are spelled out on the trait.
#![allow(async_fn_in_trait)]

pub mod attention;
pub mod controller;
pub mod date;
pub mod error;
pub mod form;
pub mod lookup;
pub mod payload;
pub mod persistence;
pub mod search;
pub mod session;
pub mod store;
pub mod subject;

pub use error::{Error, Result};
