//! Error Types
//!
//! Errors raised while loading documents or interpreting caller input.
//! Lookups that find nothing are not errors; they return `None` or an
//! empty list.

use std::path::PathBuf;

use thiserror::Error;

use crate::spec::model::Category;

pub type Result<T> = std::result::Result<T, SpecError>;

#[derive(Error, Debug)]
pub enum SpecError {
    #[error("Failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse '{}': {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("No description or prompt could be recovered from '{}'", .path.display())]
    Empty { path: PathBuf },

    #[error("Invalid category: {value}. Valid categories: {}", Category::valid_names())]
    InvalidCategory { value: String },

    #[error("Spec '{0}' not found")]
    NotFound(String),
}

impl SpecError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
