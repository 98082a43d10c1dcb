//! Spec Collection
//!
//! In-memory registry of every loaded document, in load order. Built by a
//! full directory scan and read-only until [`SpecCollection::reload`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::info;

use super::lineage::{self, ChainLevel, ProvidedOutput};
use super::recommender::{self, Recommendation};
use crate::error::{Result, SpecError};
use crate::spec::parser::{load_directory, LoadReport, SkippedDocument};
use crate::spec::{Category, SpecDocument};

/// Registry of loaded spec documents.
#[derive(Debug, Clone, Default)]
pub struct SpecCollection {
    specs: Vec<SpecDocument>,
    specs_dir: Option<PathBuf>,
    loaded_at: Option<DateTime<Utc>>,
}

impl SpecCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a collection from already-built documents.
    pub fn from_specs(specs: Vec<SpecDocument>) -> Self {
        Self {
            specs,
            specs_dir: None,
            loaded_at: Some(Utc::now()),
        }
    }

    /// Replaces the contents with every document found below `specs_dir`.
    ///
    /// A missing directory leaves the collection empty. Documents that fail
    /// to parse are returned.
    pub fn load_from_directory(&mut self, specs_dir: &Path) -> Vec<SkippedDocument> {
        let LoadReport { documents, skipped } = load_directory(specs_dir);
        self.specs = documents;
        self.specs_dir = Some(specs_dir.to_path_buf());
        self.loaded_at = Some(Utc::now());

        info!(
            "Spec collection holds {} documents from {}",
            self.specs.len(),
            specs_dir.display()
        );
        skipped
    }

    /// Re-scans the directory of the last load.
    ///
    /// Returns `None` if the collection was never loaded from disk.
    pub fn reload(&mut self) -> Option<Vec<SkippedDocument>> {
        let dir = self.specs_dir.clone()?;
        Some(self.load_from_directory(&dir))
    }

    /// Exact match on `name`, then on the file name. First match wins.
    pub fn get_by_name(&self, name: &str) -> Option<&SpecDocument> {
        self.specs
            .iter()
            .find(|s| s.name == name)
            .or_else(|| self.specs.iter().find(|s| s.filename == name))
    }

    /// Documents in `category`, in load order.
    pub fn get_by_category(&self, category: Category) -> Vec<&SpecDocument> {
        self.specs.iter().filter(|s| s.category == category).collect()
    }

    /// Like [`get_by_category`](Self::get_by_category), but parses the
    /// category first and rejects values outside the enumeration.
    pub fn get_by_category_name(&self, category: &str) -> Result<Vec<&SpecDocument>> {
        let category: Category = category.parse()?;
        Ok(self.get_by_category(category))
    }

    /// Case-insensitive substring search over name, description and tags.
    pub fn search(&self, query: &str) -> Vec<&SpecDocument> {
        let query = query.to_lowercase();
        self.specs
            .iter()
            .filter(|s| {
                s.name.to_lowercase().contains(&query)
                    || s.description.to_lowercase().contains(&query)
                    || s.tags.iter().any(|t| t.to_lowercase().contains(&query))
            })
            .collect()
    }

    /// Every non-empty category mapped to its document names.
    pub fn get_categories(&self) -> BTreeMap<Category, Vec<String>> {
        let mut categories: BTreeMap<Category, Vec<String>> = BTreeMap::new();
        for spec in &self.specs {
            categories
                .entry(spec.category)
                .or_default()
                .push(spec.name.clone());
        }
        categories
    }

    /// Up to three documents best matching a task description.
    pub fn recommend(&self, task: &str) -> Vec<&SpecDocument> {
        recommender::recommend(&self.specs, task)
    }

    /// Like [`recommend`](Self::recommend), with scores.
    pub fn recommend_scored(&self, task: &str) -> Vec<Recommendation> {
        recommender::recommend_scored(&self.specs, task)
    }

    /// Documents whose own `provides` list mentions `output`.
    pub fn find_providing(&self, output: &str) -> Vec<ProvidedOutput> {
        lineage::find_providing(&self.specs, output)
    }

    /// Walks each document's own `on_complete` links from `start`, at most
    /// `depth` levels deep.
    pub fn workflow_chain(&self, start: &str, depth: usize) -> Result<Vec<ChainLevel>> {
        if self.get_by_name(start).is_none() {
            return Err(SpecError::NotFound(start.to_string()));
        }
        Ok(lineage::walk(start, depth, |name| self.get_by_name(name)))
    }

    pub fn specs(&self) -> &[SpecDocument] {
        &self.specs
    }

    pub fn names(&self) -> Vec<&str> {
        self.specs.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn specs_dir(&self) -> Option<&Path> {
        self.specs_dir.as_deref()
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn sample() -> SpecCollection {
        SpecCollection::from_specs(vec![
            SpecDocument::new(
                "dev",
                Category::Development,
                "Feature development workflow",
                "### 1. Plan",
            ),
            SpecDocument::new("audit", Category::Quality, "Security assessment", ""),
            SpecDocument::new("review", Category::Quality, "Code review process", ""),
            SpecDocument::new("paper", Category::Research, "Academic reading", ""),
        ])
    }

    fn write(root: &Path, rel: &str, description: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            format!("description = \"{}\"\nprompt = \"p\"\n", description),
        )
        .unwrap();
    }

    #[test]
    fn test_get_by_name_and_filename() {
        let collection = sample();
        assert_eq!(collection.get_by_name("dev").unwrap().name, "dev");
        assert_eq!(collection.get_by_name("review.toml").unwrap().name, "review");
        assert!(collection.get_by_name("ghost").is_none());
    }

    #[test]
    fn test_get_by_name_first_match_wins() {
        let collection = SpecCollection::from_specs(vec![
            SpecDocument::new("dup", Category::Quality, "first", ""),
            SpecDocument::new("dup", Category::Research, "second", ""),
        ]);
        assert_eq!(collection.get_by_name("dup").unwrap().description, "first");
    }

    #[test]
    fn test_get_by_category_keeps_order() {
        let collection = sample();
        let names: Vec<&str> = collection
            .get_by_category(Category::Quality)
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["audit", "review"]);
        assert!(collection.get_by_category(Category::Strategy).is_empty());
    }

    #[test]
    fn test_get_by_category_name_rejects_invalid() {
        let collection = sample();
        assert_eq!(collection.get_by_category_name("research").unwrap().len(), 1);
        assert!(collection.get_by_category_name("strategy").unwrap().is_empty());
        assert!(matches!(
            collection.get_by_category_name("cooking"),
            Err(SpecError::InvalidCategory { .. })
        ));
    }

    #[test]
    fn test_search_matches_description() {
        let collection = sample();
        let results = collection.search("security");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "audit");
    }

    #[test]
    fn test_search_matches_category_tag() {
        let collection = SpecCollection::from_specs(vec![
            SpecDocument::new("guard", Category::Quality, "Hardening for teams", ""),
            SpecDocument::new("other", Category::Research, "Unrelated", ""),
        ]);
        let results = collection.search("QUALITY");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "guard");
    }

    #[test]
    fn test_search_case_insensitive_name() {
        let collection = sample();
        let results = collection.search("DEV");
        assert!(results.iter().any(|s| s.name == "dev"));
    }

    #[test]
    fn test_get_categories() {
        let collection = sample();
        let categories = collection.get_categories();
        assert_eq!(categories.len(), 3);
        assert_eq!(categories[&Category::Quality], vec!["audit", "review"]);
        assert!(!categories.contains_key(&Category::Knowledge));

        let json = serde_json::to_value(&categories).unwrap();
        assert_eq!(json["research"][0], "paper");
    }

    #[test]
    fn test_load_missing_directory() {
        let mut collection = SpecCollection::new();
        let skipped = collection.load_from_directory(Path::new("/nonexistent/specs"));
        assert!(collection.is_empty());
        assert!(skipped.is_empty());
        assert!(collection.loaded_at().is_some());
    }

    #[test]
    fn test_reload_drops_deleted_documents() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        write(root, "development/dev.toml", "Development workflow");
        write(root, "quality/review.toml", "Review workflow");

        let mut collection = SpecCollection::new();
        collection.load_from_directory(root);
        assert_eq!(collection.len(), 2);
        assert!(collection.get_by_name("review").is_some());

        fs::remove_file(root.join("quality/review.toml")).unwrap();
        fs::write(root.join("quality/broken.toml"), "description = \"open\n").unwrap();
        let skipped = collection.reload().unwrap();

        assert_eq!(skipped.len(), 1);
        assert!(skipped[0].path.ends_with("broken.toml"));
        assert_eq!(collection.len(), 1);
        assert!(collection.get_by_name("review").is_none());
        assert!(collection.get_by_name("dev").is_some());
    }

    #[test]
    fn test_reload_without_directory() {
        let mut collection = sample();
        assert!(collection.reload().is_none());
        assert_eq!(collection.len(), 4);
    }

    #[test]
    fn test_unrecognized_directory_is_development() {
        let temp_dir = tempdir().unwrap();
        write(temp_dir.path(), "misc/odd.toml", "Odd one");

        let mut collection = SpecCollection::new();
        collection.load_from_directory(temp_dir.path());
        let doc = collection.get_by_name("odd").unwrap();
        assert_eq!(doc.category, Category::Development);
        assert!(doc.has_tag("development"));
    }

    #[test]
    fn test_find_providing_and_workflow_chain() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("development")).unwrap();
        fs::write(
            root.join("development/spec.toml"),
            "description = \"Requirements\"\nprompt = \"p\"\n\n[triggers]\non_complete = [\"dev\"]\nprovides = [\"requirements.md\"]\n",
        )
        .unwrap();
        fs::write(
            root.join("development/dev.toml"),
            "description = \"Build\"\nprompt = \"p\"\n\n[triggers]\non_complete = [\"spec\"]\ntypical_outputs = [\"Code\"]\n",
        )
        .unwrap();

        let mut collection = SpecCollection::new();
        collection.load_from_directory(root);

        let found = collection.find_providing("REQUIREMENTS");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].spec, "spec");
        assert_eq!(collection.find_providing("code")[0].matched, "Code");

        let chain = collection.workflow_chain("spec", 5).unwrap();
        let names: Vec<&str> = chain.iter().map(|c| c.spec.as_str()).collect();
        assert_eq!(names, vec!["spec", "dev"]);
        assert_eq!(chain[1].level, 1);

        assert!(matches!(
            collection.workflow_chain("ghost", 3),
            Err(SpecError::NotFound(name)) if name == "ghost"
        ));
    }
}
