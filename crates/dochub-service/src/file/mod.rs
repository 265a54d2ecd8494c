//! File services: metadata edits, upload and download.

pub mod service;

pub use service::FileService;
