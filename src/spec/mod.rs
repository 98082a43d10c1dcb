//! Spec Document Module
//!
//! Provides data structures and utilities for loading, analysing and
//! validating workflow specification documents.
//!
//! # Structure
//!
//! - [`model`]: Core data structures (SpecDocument, Category, Phase)
//! - [`metadata`]: Pure extraction of derived facts from prompt text
//! - [`parser`]: Directory discovery and TOML loading with fallback
//! - [`validator`]: Structural checklist and validation reports

pub mod metadata;
pub mod model;
pub mod parser;
pub mod validator;

pub use metadata::{ConstraintCounts, DerivedMetadata};
pub use model::{Category, Mode, Phase, SpecDocument, SpecMetadata, SpecSummary};
pub use parser::{load_directory, load_spec_file, LoadReport, SkippedDocument};
pub use validator::{
    validate, validate_directory, validate_file, Finding, ValidationReport, ValidationStatus,
    ValidationSummary,
};
