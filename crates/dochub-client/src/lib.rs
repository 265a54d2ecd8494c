//! # dochub-client
//!
//! HTTP implementation of [`dochub_service::DocumentApi`] on top of
//! `reqwest`. Every request carries the bearer token once one is installed;
//! responses are decoded into `dochub-entity` records and failures are
//! mapped into [`dochub_core::AppError`] with the backend's code kept
//! verbatim.

pub mod http;

pub use http::HttpDocumentApi;
