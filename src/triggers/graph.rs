//! Trigger and Chain Graph
//!
//! Suggested-next edges between workflows and predefined named chains,
//! loaded from a single auxiliary TOML document:
//!
//! ```toml
//! [chains.development]
//! description = "Full feature development"
//! sequence = ["spec", "dev", "test", "review"]
//!
//! [triggers.dev]
//! on_complete = ["test", "review"]
//! can_chain_from = ["spec"]
//! provides = ["implementation"]
//! requires = ["requirements"]
//! ```
//!
//! Every hint is a suggestion. Names are not checked against the loaded
//! documents, and an unknown name simply has no hints.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Default maximum number of workflows in a built chain.
pub const DEFAULT_MAX_CHAIN_LENGTH: usize = 5;

/// Entry in the `triggers` table that documents the format rather than a
/// workflow.
const SCHEMA_ENTRY: &str = "schema";

/// Task keywords associated with predefined chains, checked in order.
const CHAIN_KEYWORDS: &[(&str, &[&str])] = &[
    ("development", &["implement", "build", "feature", "code"]),
    ("quality", &["review", "security", "optimize", "quality"]),
    ("problem_solving", &["debug", "fix", "troubleshoot", "investigate"]),
    ("learning", &["learn", "understand", "study", "research"]),
    ("api_development", &["api", "endpoint", "integration", "rest"]),
    ("security_audit", &["security", "audit", "vulnerability", "secure"]),
];

/// Composition hints for one workflow.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(from = "RawTriggerEdge")]
pub struct TriggerEdge {
    /// Suggested follow-up workflows, best first
    pub on_complete: Vec<String>,

    /// Workflows that often precede this one
    pub can_chain_from: Vec<String>,

    /// Artifacts this workflow typically produces
    pub provides: Vec<String>,

    /// Context that helps this workflow
    pub requires: Vec<String>,
}

/// On-disk shape of a trigger entry. The legacy names `typical_outputs`
/// and `works_well_with` win over `provides` and `requires` when both
/// are present.
#[derive(Deserialize)]
struct RawTriggerEdge {
    #[serde(default)]
    on_complete: Vec<String>,
    #[serde(default)]
    can_chain_from: Vec<String>,
    provides: Option<Vec<String>>,
    requires: Option<Vec<String>>,
    typical_outputs: Option<Vec<String>>,
    works_well_with: Option<Vec<String>>,
}

impl From<RawTriggerEdge> for TriggerEdge {
    fn from(raw: RawTriggerEdge) -> Self {
        Self {
            on_complete: raw.on_complete,
            can_chain_from: raw.can_chain_from,
            provides: raw.typical_outputs.or(raw.provides).unwrap_or_default(),
            requires: raw.works_well_with.or(raw.requires).unwrap_or_default(),
        }
    }
}

/// A predefined, named sequence of workflows.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NamedChain {
    pub name: String,
    pub description: String,
    pub sequence: Vec<String>,
}

#[derive(Deserialize)]
struct RawChain {
    #[serde(default)]
    description: String,
    #[serde(default)]
    sequence: Vec<String>,
}

/// Trigger edges keyed by workflow name, plus named chains in load order.
#[derive(Debug, Clone, Default)]
pub struct TriggerGraph {
    triggers: HashMap<String, TriggerEdge>,
    chains: Vec<NamedChain>,
}

impl TriggerGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the graph from a trigger document.
    ///
    /// A missing or malformed document yields an empty graph.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            info!("No trigger document at {}", path.display());
            return Self::new();
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read triggers from {}: {}", path.display(), e);
                return Self::new();
            }
        };

        match Self::parse(&content) {
            Ok(graph) => {
                info!(
                    "Loaded {} triggers and {} chains from {}",
                    graph.triggers.len(),
                    graph.chains.len(),
                    path.display()
                );
                graph
            }
            Err(message) => {
                warn!("Failed to load triggers from {}: {}", path.display(), message);
                Self::new()
            }
        }
    }

    /// Parses trigger document text.
    ///
    /// Entries whose value is not a table are skipped. A syntax error fails
    /// the whole document.
    pub fn parse(content: &str) -> Result<Self, String> {
        let data: toml::Table = toml::from_str(content).map_err(|e| e.message().to_string())?;
        let mut graph = Self::new();

        if let Some(chains) = data.get("chains").and_then(|v| v.as_table()) {
            for (name, value) in chains {
                if !value.is_table() {
                    debug!("Ignoring non-table chain entry '{}'", name);
                    continue;
                }
                match value.clone().try_into::<RawChain>() {
                    Ok(raw) => graph.add_chain(NamedChain {
                        name: name.clone(),
                        description: raw.description,
                        sequence: raw.sequence,
                    }),
                    Err(e) => warn!("Ignoring malformed chain '{}': {}", name, e.message()),
                }
            }
        }

        if let Some(triggers) = data.get("triggers").and_then(|v| v.as_table()) {
            for (name, value) in triggers {
                if name == SCHEMA_ENTRY || !value.is_table() {
                    continue;
                }
                match value.clone().try_into::<TriggerEdge>() {
                    Ok(edge) => graph.add_trigger(name.clone(), edge),
                    Err(e) => warn!("Ignoring malformed trigger '{}': {}", name, e.message()),
                }
            }
        }

        Ok(graph)
    }

    /// Adds or replaces the hints for `name`.
    pub fn add_trigger(&mut self, name: impl Into<String>, edge: TriggerEdge) {
        self.triggers.insert(name.into(), edge);
    }

    /// Appends a named chain, replacing any existing chain of the same name
    /// in place.
    pub fn add_chain(&mut self, chain: NamedChain) {
        match self.chains.iter_mut().find(|c| c.name == chain.name) {
            Some(existing) => *existing = chain,
            None => self.chains.push(chain),
        }
    }

    pub fn trigger(&self, name: &str) -> Option<&TriggerEdge> {
        self.triggers.get(name)
    }

    /// Suggested workflows to consider after `name`.
    pub fn suggested_next(&self, name: &str) -> &[String] {
        self.triggers
            .get(name)
            .map(|t| t.on_complete.as_slice())
            .unwrap_or_default()
    }

    /// Workflows that commonly precede `name`.
    pub fn common_predecessors(&self, name: &str) -> &[String] {
        self.triggers
            .get(name)
            .map(|t| t.can_chain_from.as_slice())
            .unwrap_or_default()
    }

    /// Artifacts `name` typically produces.
    pub fn typical_outputs(&self, name: &str) -> &[String] {
        self.triggers
            .get(name)
            .map(|t| t.provides.as_slice())
            .unwrap_or_default()
    }

    /// Context that helps `name`; never a hard prerequisite.
    pub fn helpful_context(&self, name: &str) -> &[String] {
        self.triggers
            .get(name)
            .map(|t| t.requires.as_slice())
            .unwrap_or_default()
    }

    /// Builds a chain by greedily following suggestions from `start`.
    ///
    /// At each step the first suggestion not already in the chain is
    /// appended. If `end` is among the current suggestions it is appended
    /// and the walk stops. The walk also stops when no usable suggestion
    /// remains or when `max_length` workflows have been collected.
    ///
    /// This never backtracks, so `end` may be missed even when it is
    /// reachable through a lower-ranked suggestion.
    ///
    /// ```
    /// use workflow_specs::triggers::{TriggerEdge, TriggerGraph};
    ///
    /// let mut graph = TriggerGraph::new();
    /// graph.add_trigger("a", TriggerEdge { on_complete: vec!["b".into()], ..Default::default() });
    /// graph.add_trigger("b", TriggerEdge { on_complete: vec!["a".into()], ..Default::default() });
    ///
    /// assert_eq!(graph.build_chain("a", None, 5), vec!["a", "b"]);
    /// ```
    pub fn build_chain(&self, start: &str, end: Option<&str>, max_length: usize) -> Vec<String> {
        let mut chain = vec![start.to_string()];

        while chain.len() < max_length {
            let current = chain.last().map(String::as_str).unwrap_or(start);
            let suggestions = self.suggested_next(current);
            if suggestions.is_empty() {
                break;
            }

            if let Some(end) = end {
                if suggestions.iter().any(|s| s == end) {
                    chain.push(end.to_string());
                    break;
                }
            }

            match suggestions.iter().find(|s| !chain.contains(s)) {
                Some(next) => chain.push(next.clone()),
                None => {
                    debug!("Chain from '{}' stopped at '{}' to avoid a cycle", start, current);
                    break;
                }
            }
        }

        chain
    }

    /// Every predefined chain, in load order.
    pub fn all_named_chains(&self) -> &[NamedChain] {
        &self.chains
    }

    pub fn named_chain(&self, name: &str) -> Option<&NamedChain> {
        self.chains.iter().find(|c| c.name == name)
    }

    /// Finds the first predefined chain whose task keywords intersect
    /// `task_keywords`.
    pub fn find_chain_for_task<S: AsRef<str>>(&self, task_keywords: &[S]) -> Option<&NamedChain> {
        CHAIN_KEYWORDS
            .iter()
            .filter(|(_, keywords)| {
                keywords
                    .iter()
                    .any(|kw| task_keywords.iter().any(|t| t.as_ref() == *kw))
            })
            .find_map(|(name, _)| self.named_chain(name))
    }

    pub fn trigger_count(&self) -> usize {
        self.triggers.len()
    }

    /// Returns true if neither triggers nor chains are loaded.
    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty() && self.chains.is_empty()
    }
}

/// Formats a chain as its description followed by the arrow-joined sequence.
pub fn format_chain(chain: &NamedChain) -> String {
    format!(
        "{}\n  Sequence: {}",
        chain.description,
        chain.sequence.join(" → ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const TRIGGERS: &str = r#"
[chains.development]
description = "Full feature development"
sequence = ["spec", "dev", "test", "review"]

[chains.security_audit]
description = "Security assessment"
sequence = ["security", "review"]

[chains.broken]
description = 42

[triggers.schema]
on_complete = "list of names"

[triggers.spec]
on_complete = ["dev", "architecture"]
provides = ["requirements"]

[triggers.dev]
on_complete = ["test", "review"]
can_chain_from = ["spec", "troubleshoot"]
typical_outputs = ["implementation"]
works_well_with = ["requirements"]

[triggers.test]
on_complete = ["review"]

[triggers.review]
on_complete = ["dev"]
"#;

    fn edge(next: &[&str]) -> TriggerEdge {
        TriggerEdge {
            on_complete: next.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_document() {
        let graph = TriggerGraph::parse(TRIGGERS).unwrap();
        assert_eq!(graph.trigger_count(), 4);
        assert!(graph.trigger("schema").is_none());
        assert_eq!(graph.suggested_next("dev"), ["test", "review"]);
        assert_eq!(graph.common_predecessors("dev"), ["spec", "troubleshoot"]);
        assert_eq!(graph.typical_outputs("dev"), ["implementation"]);
        assert_eq!(graph.helpful_context("dev"), ["requirements"]);
        assert_eq!(graph.typical_outputs("spec"), ["requirements"]);
    }

    #[test]
    fn test_parse_entry_with_current_and_legacy_names() {
        let graph = TriggerGraph::parse(
            r#"
[triggers.dev]
on_complete = ["test", "review"]
provides = ["implementation"]
typical_outputs = ["code"]
requires = ["requirements"]
works_well_with = ["design notes"]

[triggers.spec]
provides = ["requirements"]
"#,
        )
        .unwrap();

        assert_eq!(graph.suggested_next("dev"), ["test", "review"]);
        assert_eq!(graph.typical_outputs("dev"), ["code"]);
        assert_eq!(graph.helpful_context("dev"), ["design notes"]);
        assert_eq!(graph.typical_outputs("spec"), ["requirements"]);
        assert_eq!(graph.build_chain("dev", None, 3), vec!["dev", "test"]);
    }

    #[test]
    fn test_chains_keep_load_order() {
        let graph = TriggerGraph::parse(TRIGGERS).unwrap();
        let names: Vec<&str> = graph
            .all_named_chains()
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["development", "security_audit"]);
    }

    #[test]
    fn test_unknown_names_are_empty() {
        let graph = TriggerGraph::parse(TRIGGERS).unwrap();
        assert!(graph.suggested_next("ghost").is_empty());
        assert!(graph.common_predecessors("ghost").is_empty());
        assert!(graph.typical_outputs("ghost").is_empty());
        assert!(graph.helpful_context("ghost").is_empty());
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let graph = TriggerGraph::load(Path::new("/nonexistent/workflow-triggers.toml"));
        assert!(graph.is_empty());
    }

    #[test]
    fn test_load_malformed_file_is_empty() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("workflow-triggers.toml");
        fs::write(&path, "[triggers.dev\non_complete = [").unwrap();

        let graph = TriggerGraph::load(&path);
        assert!(graph.is_empty());
        assert!(graph.all_named_chains().is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("workflow-triggers.toml");
        fs::write(&path, TRIGGERS).unwrap();

        let graph = TriggerGraph::load(&path);
        assert_eq!(graph.trigger_count(), 4);
        assert_eq!(graph.all_named_chains().len(), 2);
    }

    #[test]
    fn test_build_chain_two_cycle() {
        let mut graph = TriggerGraph::new();
        graph.add_trigger("A", edge(&["B"]));
        graph.add_trigger("B", edge(&["A"]));

        assert_eq!(graph.build_chain("A", None, DEFAULT_MAX_CHAIN_LENGTH), vec!["A", "B"]);
    }

    #[test]
    fn test_build_chain_follows_first_suggestion() {
        let graph = TriggerGraph::parse(TRIGGERS).unwrap();
        // spec -> dev -> test -> review -> (dev already present)
        assert_eq!(
            graph.build_chain("spec", None, DEFAULT_MAX_CHAIN_LENGTH),
            vec!["spec", "dev", "test", "review"]
        );
    }

    #[test]
    fn test_build_chain_skips_visited_suggestion() {
        let mut graph = TriggerGraph::new();
        graph.add_trigger("a", edge(&["b"]));
        graph.add_trigger("b", edge(&["a", "c"]));

        assert_eq!(graph.build_chain("a", None, 5), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_build_chain_stops_at_end() {
        let graph = TriggerGraph::parse(TRIGGERS).unwrap();
        assert_eq!(
            graph.build_chain("spec", Some("architecture"), DEFAULT_MAX_CHAIN_LENGTH),
            vec!["spec", "architecture"]
        );
        assert_eq!(
            graph.build_chain("dev", Some("review"), DEFAULT_MAX_CHAIN_LENGTH),
            vec!["dev", "review"]
        );
    }

    #[test]
    fn test_build_chain_greedy_misses_end() {
        let mut graph = TriggerGraph::new();
        graph.add_trigger("a", edge(&["b", "c"]));
        graph.add_trigger("c", edge(&["target"]));

        // "target" is only reachable through the second suggestion.
        assert_eq!(graph.build_chain("a", Some("target"), 5), vec!["a", "b"]);
    }

    #[test]
    fn test_build_chain_respects_max_length() {
        let mut graph = TriggerGraph::new();
        for i in 0..10 {
            graph.add_trigger(format!("n{}", i), edge(&[format!("n{}", i + 1).as_str()]));
        }

        assert_eq!(graph.build_chain("n0", None, 3), vec!["n0", "n1", "n2"]);
        assert_eq!(graph.build_chain("n0", None, 1), vec!["n0"]);
        assert_eq!(graph.build_chain("n0", None, 0), vec!["n0"]);
    }

    #[test]
    fn test_build_chain_unknown_start() {
        let graph = TriggerGraph::new();
        assert_eq!(graph.build_chain("ghost", None, 5), vec!["ghost"]);
    }

    #[test]
    fn test_find_chain_for_task() {
        let graph = TriggerGraph::parse(TRIGGERS).unwrap();

        let chain = graph.find_chain_for_task(&["implement", "login"]).unwrap();
        assert_eq!(chain.name, "development");

        // "security" maps to "quality" first, which is not loaded.
        let chain = graph.find_chain_for_task(&["security"]).unwrap();
        assert_eq!(chain.name, "security_audit");

        assert!(graph.find_chain_for_task(&["cooking"]).is_none());
    }

    #[test]
    fn test_add_chain_replaces_in_place() {
        let mut graph = TriggerGraph::parse(TRIGGERS).unwrap();
        graph.add_chain(NamedChain {
            name: "development".to_string(),
            description: "Shorter".to_string(),
            sequence: vec!["dev".to_string()],
        });

        assert_eq!(graph.all_named_chains().len(), 2);
        assert_eq!(graph.all_named_chains()[0].description, "Shorter");
    }

    #[test]
    fn test_format_chain() {
        let chain = NamedChain {
            name: "development".to_string(),
            description: "Full feature development".to_string(),
            sequence: vec!["spec".to_string(), "dev".to_string()],
        };
        assert_eq!(
            format_chain(&chain),
            "Full feature development\n  Sequence: spec → dev"
        );
    }
}
