//! Core type definitions used across the DocHub workspace.

pub mod id;

pub use id::*;
