//! Spec Catalog
//!
//! Owns the loaded collection and trigger graph for one specs root. Queries
//! borrow the catalog shared; [`SpecCatalog::reload`] needs it exclusively,
//! so a reload can never overlap an in-flight query.

use std::collections::BTreeMap;
use std::path::Path;

use log::info;

use crate::config::SpecsConfig;
use crate::error::{Result, SpecError};
use crate::index::{report, ChainLevel, ProvidedOutput, Recommendation, SpecCollection};
use crate::spec::{
    validate, Category, Finding, SkippedDocument, SpecDocument, SpecMetadata, ValidationReport,
};
use crate::triggers::TriggerGraph;

/// Loaded documents and trigger graph for a specs root.
#[derive(Debug, Clone)]
pub struct SpecCatalog {
    config: SpecsConfig,
    collection: SpecCollection,
    triggers: TriggerGraph,
    skipped: Vec<SkippedDocument>,
}

impl SpecCatalog {
    /// Scans the specs root and reads the trigger document.
    pub fn load(config: &SpecsConfig) -> Self {
        let mut catalog = Self {
            config: config.clone(),
            collection: SpecCollection::new(),
            triggers: TriggerGraph::new(),
            skipped: Vec::new(),
        };
        catalog.reload();
        catalog
    }

    /// Rebuilds the collection and trigger graph from disk.
    pub fn reload(&mut self) {
        self.skipped = self.collection.load_from_directory(&self.config.specs_dir);
        self.triggers = TriggerGraph::load(&self.config.triggers_file);

        info!(
            "Catalog ready: {} specs, {} skipped, {} triggers",
            self.collection.len(),
            self.skipped.len(),
            self.triggers.trigger_count()
        );
    }

    pub fn config(&self) -> &SpecsConfig {
        &self.config
    }

    pub fn collection(&self) -> &SpecCollection {
        &self.collection
    }

    pub fn triggers(&self) -> &TriggerGraph {
        &self.triggers
    }

    /// Documents found during the last load that could not be parsed.
    pub fn skipped(&self) -> &[SkippedDocument] {
        &self.skipped
    }

    pub fn get(&self, name: &str) -> Option<&SpecDocument> {
        self.collection.get_by_name(name)
    }

    /// Like [`get`](Self::get), but absence is an error.
    pub fn require(&self, name: &str) -> Result<&SpecDocument> {
        self.get(name)
            .ok_or_else(|| SpecError::NotFound(name.to_string()))
    }

    pub fn by_category(&self, category: &str) -> Result<Vec<&SpecDocument>> {
        self.collection.get_by_category_name(category)
    }

    pub fn categories(&self) -> BTreeMap<Category, Vec<String>> {
        self.collection.get_categories()
    }

    pub fn search(&self, query: &str) -> Vec<&SpecDocument> {
        self.collection.search(query)
    }

    pub fn recommend(&self, task: &str) -> Vec<Recommendation> {
        self.collection.recommend_scored(task)
    }

    pub fn build_chain(&self, start: &str, end: Option<&str>, max_length: usize) -> Vec<String> {
        self.triggers.build_chain(start, end, max_length)
    }

    /// Full metadata of a loaded document.
    pub fn metadata(&self, name: &str) -> Result<SpecMetadata> {
        self.require(name).map(SpecDocument::metadata)
    }

    pub fn find_providing(&self, output: &str) -> Vec<ProvidedOutput> {
        self.collection.find_providing(output)
    }

    pub fn workflow_chain(&self, start: &str, depth: usize) -> Result<Vec<ChainLevel>> {
        self.collection.workflow_chain(start, depth)
    }

    /// Validates a loaded document by name.
    pub fn validate(&self, name: &str) -> Result<ValidationReport> {
        self.require(name).map(validate)
    }

    /// Validates every loaded document, in load order, followed by one
    /// failing report per document that could not be loaded.
    pub fn validate_all(&self) -> Vec<(String, ValidationReport)> {
        let loaded = self
            .collection
            .specs()
            .iter()
            .map(|spec| (spec.name.clone(), validate(spec)));

        let failed = self.skipped.iter().map(|skipped| {
            let mut report = ValidationReport::new();
            report.error(Finding::Unreadable(skipped.reason.clone()));
            (skipped.path.display().to_string(), report)
        });

        loaded.chain(failed).collect()
    }

    pub fn quick_reference(&self) -> String {
        report::quick_reference(&self.collection)
    }

    pub fn compare(&self, a: &str, b: &str) -> Result<String> {
        Ok(report::compare(self.require(a)?, self.require(b)?))
    }

    /// Path of the specs root this catalog was loaded from.
    pub fn specs_dir(&self) -> &Path {
        &self.config.specs_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const TRIGGERS: &str = r#"
[chains.development]
description = "Build then verify"
sequence = ["spec", "dev", "test"]

[triggers.spec]
on_complete = ["dev"]

[triggers.dev]
on_complete = ["test", "review"]
"#;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn corpus(root: &Path) {
        write(
            root,
            "development/dev.toml",
            "description = \"Feature development workflow\"\nprompt = \"### 1. Plan\\nYou MUST plan.\"\n",
        );
        write(
            root,
            "development/spec.toml",
            "description = \"Requirements and design\"\nprompt = \"### 1. Gather\"\n",
        );
        write(root, "quality/broken.toml", "description = \"unterminated\n");
        write(root, "_common/workflow-triggers.toml", TRIGGERS);
    }

    #[test]
    fn test_load_builds_collection_and_graph() {
        let temp_dir = tempdir().unwrap();
        corpus(temp_dir.path());

        let catalog = SpecCatalog::load(&SpecsConfig::new(temp_dir.path()));

        assert_eq!(catalog.collection().len(), 2);
        assert_eq!(catalog.skipped().len(), 1);
        assert!(catalog.skipped()[0].path.ends_with("broken.toml"));
        assert!(catalog.get("workflow-triggers").is_none());
        assert_eq!(catalog.triggers().trigger_count(), 2);
        assert_eq!(
            catalog.build_chain("spec", None, 5),
            vec!["spec", "dev", "test"]
        );
    }

    #[test]
    fn test_require_unknown_is_not_found() {
        let temp_dir = tempdir().unwrap();
        corpus(temp_dir.path());
        let catalog = SpecCatalog::load(&SpecsConfig::new(temp_dir.path()));

        assert!(matches!(
            catalog.require("ghost"),
            Err(SpecError::NotFound(name)) if name == "ghost"
        ));
        assert!(catalog.compare("dev", "ghost").is_err());
        assert!(catalog.compare("dev", "spec").unwrap().contains("dev vs spec"));
    }

    #[test]
    fn test_validate_by_name() {
        let temp_dir = tempdir().unwrap();
        corpus(temp_dir.path());
        let catalog = SpecCatalog::load(&SpecsConfig::new(temp_dir.path()));

        let report = catalog.validate("dev").unwrap();
        assert!(!report.is_valid);

        let all = catalog.validate_all();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].0, "dev");
        assert!(all[2].0.ends_with("broken.toml"));
        assert!(!all[2].1.is_valid);
    }

    #[test]
    fn test_recommend_through_catalog() {
        let temp_dir = tempdir().unwrap();
        corpus(temp_dir.path());
        let catalog = SpecCatalog::load(&SpecsConfig::new(temp_dir.path()));

        let recommendations = catalog.recommend("implement a feature");
        assert_eq!(recommendations[0].name, "dev");
    }

    #[test]
    fn test_reload_picks_up_changes() {
        let temp_dir = tempdir().unwrap();
        corpus(temp_dir.path());
        let mut catalog = SpecCatalog::load(&SpecsConfig::new(temp_dir.path()));

        fs::remove_file(temp_dir.path().join("development/spec.toml")).unwrap();
        fs::remove_file(temp_dir.path().join("_common/workflow-triggers.toml")).unwrap();
        catalog.reload();

        assert!(catalog.get("spec").is_none());
        assert!(catalog.triggers().is_empty());
        assert_eq!(catalog.build_chain("spec", None, 5), vec!["spec"]);
    }

    #[test]
    fn test_document_triggers_through_catalog() {
        let temp_dir = tempdir().unwrap();
        corpus(temp_dir.path());
        write(
            temp_dir.path(),
            "quality/test.toml",
            "description = \"Testing\"\nprompt = \"p\"\n\n[triggers]\non_complete = [\"review\"]\nprovides = [\"test_suite\"]\n\n[metadata]\nversion = \"2.0.0\"\n",
        );
        let catalog = SpecCatalog::load(&SpecsConfig::new(temp_dir.path()));

        let meta = catalog.metadata("test").unwrap();
        assert_eq!(meta.version, "2.0.0");
        assert_eq!(meta.triggers.provides, vec!["test_suite"]);
        assert!(catalog.metadata("ghost").is_err());

        assert_eq!(catalog.find_providing("suite")[0].spec, "test");
        let chain = catalog.workflow_chain("test", 3).unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].on_complete, vec!["review"]);
    }

    #[test]
    fn test_missing_root_is_empty() {
        let catalog = SpecCatalog::load(&SpecsConfig::new("/nonexistent/specs"));
        assert!(catalog.collection().is_empty());
        assert!(catalog.triggers().is_empty());
        assert!(catalog.search("anything").is_empty());
    }
}
