//! Workflow Specs - Index and Chain Engine for Workflow Specifications
//!
//! Loads a directory of workflow specification documents, derives
//! structural metadata from their prompts, and answers queries over the
//! corpus: lookup, search, task recommendation, structural validation and
//! chain construction over a trigger graph.
//!
//! # Architecture
//!
//! The library is organized into four main modules:
//!
//! - [`spec`]: Document model, metadata extraction, loading and validation
//! - [`index`]: Collection queries, recommendation and markdown reports
//! - [`triggers`]: Suggested-next graph and predefined chains
//! - [`catalog`]: One loaded specs root with its trigger graph
//!
//! # Example
//!
//! ```rust,no_run
//! use workflow_specs::{SpecCatalog, SpecsConfig};
//!
//! let catalog = SpecCatalog::load(&SpecsConfig::resolve(None));
//!
//! for rec in catalog.recommend("fix a crash in the parser") {
//!     println!("{} ({})", rec.name, rec.score);
//! }
//!
//! let chain = catalog.build_chain("spec", Some("review"), 5);
//! println!("{}", chain.join(" → "));
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod index;
pub mod spec;
pub mod triggers;

// Re-export commonly used types
pub use catalog::SpecCatalog;
pub use config::SpecsConfig;
pub use error::{Result, SpecError};
pub use index::{Recommendation, SpecCollection};
pub use spec::{Category, SpecDocument, ValidationReport};
pub use triggers::{NamedChain, TriggerGraph};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "Workflow Specs";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_module_exports_document() {
        let doc = SpecDocument::new("dev", Category::Development, "Dev", "### 1. Plan");
        assert_eq!(doc.name, "dev");
        assert_eq!(doc.phases.len(), 1);
    }

    #[test]
    fn test_module_exports_graph() {
        let graph = TriggerGraph::new();
        assert!(graph.is_empty());
        assert_eq!(graph.build_chain("dev", None, 5), vec!["dev"]);
    }

    #[test]
    fn test_version_format() {
        let parts: Vec<&str> = VERSION.split('.').collect();
        assert!(parts.len() >= 2, "Version should have at least major.minor");
        for part in parts {
            assert!(part.parse::<u32>().is_ok(), "Version components should be numeric");
        }
    }
}
