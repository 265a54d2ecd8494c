//! # dochub-core
//!
//! Core crate for the DocHub client. Contains configuration schemas,
//! typed identifiers, backend error codes, and the unified error system.
//!
//! This crate has **no** internal dependencies on other DocHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
