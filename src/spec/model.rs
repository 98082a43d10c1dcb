//! Spec Data Model
//!
//! Core data structures representing a workflow specification document.
//!
//! # Example TOML Format
//!
//! ```toml
//! description = "Feature development workflow with testing and review"
//!
//! prompt = """
//! ## Goal
//! Ship the feature.
//!
//! ### 1. Task Analysis and Planning
//! The agent MUST read the task first.
//! """
//!
//! [triggers]
//! on_complete = ["test", "review"]
//! provides = ["implementation"]
//!
//! [metadata]
//! version = "1.2.0"
//! tags = ["core"]
//! authors = ["Jane Doe"]
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::metadata::{self, ConstraintCounts};
use crate::error::SpecError;
use crate::triggers::TriggerEdge;

/// Version assumed when a document does not declare one.
pub const DEFAULT_VERSION: &str = "1.0.0";

/// The fixed set of top-level groupings a document can belong to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Development,
    Quality,
    ProblemSolving,
    Research,
    Knowledge,
    Strategy,
}

impl Category {
    /// Every category, in declaration order.
    pub const ALL: [Category; 6] = [
        Category::Development,
        Category::Quality,
        Category::ProblemSolving,
        Category::Research,
        Category::Knowledge,
        Category::Strategy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Quality => "quality",
            Self::ProblemSolving => "problem-solving",
            Self::Research => "research",
            Self::Knowledge => "knowledge",
            Self::Strategy => "strategy",
        }
    }

    /// Human-readable heading, e.g. "Problem Solving".
    pub fn title(&self) -> &'static str {
        match self {
            Self::Development => "Development",
            Self::Quality => "Quality",
            Self::ProblemSolving => "Problem Solving",
            Self::Research => "Research",
            Self::Knowledge => "Knowledge",
            Self::Strategy => "Strategy",
        }
    }

    /// Maps a containing directory name to a category.
    ///
    /// Unrecognized names fall back to [`Category::Development`].
    pub fn from_dir_name(name: &str) -> Self {
        name.parse().unwrap_or(Self::Development)
    }

    /// Comma-separated list of valid category names.
    pub fn valid_names() -> String {
        Self::ALL
            .iter()
            .map(Category::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| SpecError::InvalidCategory {
                value: s.to_string(),
            })
    }
}

/// A numbered step taken from a `### N. Name` heading in the prompt.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Phase {
    pub number: u64,
    pub name: String,
}

impl Phase {
    pub fn new(number: u64, name: impl Into<String>) -> Self {
        Self {
            number,
            name: name.into(),
        }
    }
}

/// Execution modes a prompt can advertise.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Collaboration,
    Silent,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Collaboration => "collaboration",
            Mode::Silent => "silent",
        }
    }
}

/// A single workflow specification with its derived metadata.
#[derive(Serialize, Debug, Clone)]
pub struct SpecDocument {
    /// Identifier, taken from the file stem
    pub name: String,

    /// File name including extension (secondary lookup key)
    pub filename: String,

    /// Location the document was loaded from
    pub path: PathBuf,

    pub category: Category,

    pub description: String,

    /// Full instructional prompt body
    #[serde(skip_serializing)]
    pub prompt: String,

    pub version: String,

    /// Phases in document order, duplicates and gaps preserved
    pub phases: Vec<Phase>,

    /// Category plus vocabulary keywords found in the description
    pub tags: Vec<String>,

    /// Tags declared in the `[metadata]` block
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub declared_tags: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,

    /// The document's own `[triggers]` block
    pub triggers: TriggerEdge,

    pub constraints: ConstraintCounts,

    pub has_diagram: bool,

    pub has_full_template: bool,

    pub modes: Vec<Mode>,

    /// `.lia/<group>/` style output location, or empty
    pub output_path_pattern: String,
}

impl SpecDocument {
    /// Creates a document and derives every metadata field from the
    /// description and prompt.
    ///
    /// # Example
    ///
    /// ```
    /// use workflow_specs::spec::{Category, SpecDocument};
    ///
    /// let doc = SpecDocument::new(
    ///     "dev",
    ///     Category::Development,
    ///     "Development workflow with testing",
    ///     "### 1. Plan\n### 2. Build",
    /// );
    /// assert_eq!(doc.phases.len(), 2);
    /// assert!(doc.tags.contains(&"testing".to_string()));
    /// ```
    pub fn new(
        name: impl Into<String>,
        category: Category,
        description: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        let name = name.into().trim().to_string();
        let description = description.into();
        let prompt = prompt.into();
        let derived = metadata::derive(&prompt);
        let tags = metadata::extract_tags(&description, category);

        Self {
            filename: format!("{}.toml", name),
            path: PathBuf::from(format!("{}/{}.toml", category, name)),
            name,
            category,
            description,
            prompt,
            version: DEFAULT_VERSION.to_string(),
            phases: derived.phases,
            tags,
            declared_tags: Vec::new(),
            authors: Vec::new(),
            triggers: TriggerEdge::default(),
            constraints: derived.constraints,
            has_diagram: derived.has_diagram,
            has_full_template: derived.has_full_template,
            modes: derived.modes,
            output_path_pattern: derived.output_path_pattern,
        }
    }

    /// Records the source path and the file name derived from it.
    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if let Some(filename) = path.file_name().and_then(|f| f.to_str()) {
            self.filename = filename.to_string();
        }
        self.path = path.to_path_buf();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_authors(mut self, authors: Vec<String>) -> Self {
        self.authors = authors;
        self
    }

    pub fn with_declared_tags(mut self, tags: Vec<String>) -> Self {
        self.declared_tags = tags;
        self
    }

    pub fn with_triggers(mut self, triggers: TriggerEdge) -> Self {
        self.triggers = triggers;
        self
    }

    /// Returns true if `tag` is one of the derived tags.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Compact, serializable view of the document.
    pub fn summary(&self) -> SpecSummary {
        SpecSummary {
            name: self.name.clone(),
            filename: self.filename.clone(),
            path: self.path.display().to_string(),
            category: self.category,
            description: self.description.clone(),
            phase_count: self.phases.len(),
            phases: self.phases.clone(),
            tags: self.tags.clone(),
        }
    }

    /// Markdown overview listing at most five phases.
    pub fn render_summary(&self) -> String {
        let mut phase_list: Vec<String> = self
            .phases
            .iter()
            .take(5)
            .map(|p| format!("  {}. {}", p.number, p.name))
            .collect();
        if self.phases.len() > 5 {
            phase_list.push(format!("  ... and {} more phases", self.phases.len() - 5));
        }

        format!(
            "# {}\n**Category**: {}\n**Phases**: {}\n\n## Description\n{}\n\n## Workflow Phases\n{}\n\n## Tags\n{}\n",
            self.name,
            self.category,
            self.phases.len(),
            self.description,
            phase_list.join("\n"),
            self.tags.join(", ")
        )
    }

    /// Full derived and declared metadata for this document.
    pub fn metadata(&self) -> SpecMetadata {
        SpecMetadata {
            summary: self.summary(),
            version: self.version.clone(),
            authors: self.authors.clone(),
            declared_tags: self.declared_tags.clone(),
            constraints: self.constraints,
            has_diagram: self.has_diagram,
            has_full_template: self.has_full_template,
            modes: self.modes.clone(),
            output_directory: self.output_path_pattern.clone(),
            triggers: self.triggers.clone(),
        }
    }
}

/// Everything known about one document apart from its prompt body.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SpecMetadata {
    #[serde(flatten)]
    pub summary: SpecSummary,
    pub version: String,
    pub authors: Vec<String>,
    pub declared_tags: Vec<String>,
    pub constraints: ConstraintCounts,
    pub has_diagram: bool,
    pub has_full_template: bool,
    pub modes: Vec<Mode>,
    pub output_directory: String,
    pub triggers: TriggerEdge,
}

impl SpecMetadata {
    /// Markdown rendering used by the `metadata` command.
    pub fn render(&self) -> String {
        let list = |items: &[String]| {
            if items.is_empty() {
                "none".to_string()
            } else {
                items.join(", ")
            }
        };
        let modes: Vec<String> = self.modes.iter().map(|m| m.as_str().to_string()).collect();

        let mut out = format!(
            "# {} (v{})\n**Category**: {}\n**Path**: {}\n**Phases**: {}\n",
            self.summary.name,
            self.version,
            self.summary.category,
            self.summary.path,
            self.summary.phase_count
        );
        out.push_str(&format!("**Authors**: {}\n", list(&self.authors)));
        out.push_str(&format!(
            "**Constraints**: {} MUST, {} SHOULD, {} MAY\n",
            self.constraints.must, self.constraints.should, self.constraints.may
        ));
        out.push_str(&format!("**Mermaid diagram**: {}\n", yes_no(self.has_diagram)));
        out.push_str(&format!("**Full template**: {}\n", yes_no(self.has_full_template)));
        out.push_str(&format!("**Modes**: {}\n", list(&modes)));
        if !self.output_directory.is_empty() {
            out.push_str(&format!("**Output directory**: {}\n", self.output_directory));
        }
        out.push_str(&format!(
            "\n## Triggers\n- on_complete: {}\n",
            list(&self.triggers.on_complete)
        ));
        out.push_str(&format!("- can_chain_from: {}\n", list(&self.triggers.can_chain_from)));
        out.push_str(&format!("- provides: {}\n", list(&self.triggers.provides)));
        out.push_str(&format!("- requires: {}\n", list(&self.triggers.requires)));
        out
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

/// Serializable summary returned by listing and lookup operations.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SpecSummary {
    pub name: String,
    pub filename: String,
    pub path: String,
    pub category: Category,
    pub description: String,
    pub phase_count: usize,
    pub phases: Vec<Phase>,
    pub tags: Vec<String>,
}
