//! File domain records.

pub mod model;

pub use model::{CreateFile, File, UpdateFile};
