//! Spec Validation
//!
//! Checks a document's structure against a fixed checklist:
//! - Required sections (errors)
//! - Recommended sections (warnings)
//! - Workflow diagram and MUST constraints
//! - Notepad template completeness
//! - Description length
//!
//! Every check runs and every finding is collected. Validation problems are
//! the output of this module, never an `Err`.
//!
//! Two entry points exist with different template thresholds:
//! [`validate`] checks an already-loaded document (fewer than 4 template
//! sections is an error), while [`validate_file`] checks a file on disk
//! (5 or more passes, 3 or 4 warns, fewer is an error).

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::metadata::{self, TEMPLATE_SECTIONS};
use super::model::SpecDocument;
use super::parser::discover_spec_files;

/// Substrings every prompt must contain.
pub const REQUIRED_SECTIONS: [&str; 6] = [
    "Workflow Mode System",
    "Goal",
    "workflow-definition",
    "Workflow Diagram",
    "IMPORTANT EXECUTION INSTRUCTIONS",
    "0-Notepad Template",
];

/// Substrings every prompt should contain.
pub const RECOMMENDED_SECTIONS: [&str; 2] = ["Agent Mindset", "Agent Self-Development"];

/// Top-level keys a spec file must define.
pub const REQUIRED_KEYS: [&str; 2] = ["description", "prompt"];

/// Descriptions shorter than this draw a warning.
pub const MIN_DESCRIPTION_LEN: usize = 20;

/// Template sections needed by [`validate`].
const DOCUMENT_TEMPLATE_MIN: usize = 4;

/// Template sections needed by [`validate_file`] to pass outright.
const FILE_TEMPLATE_PASS: usize = 5;

/// Template sections below which [`validate_file`] reports an error.
const FILE_TEMPLATE_WARN: usize = 3;

/// Individual validation findings with user-facing messages.
#[derive(Debug, Clone, PartialEq)]
pub enum Finding {
    FileMissing(PathBuf),
    Unreadable(String),
    InvalidToml(String),
    MissingKey(&'static str),
    FoundKey(&'static str),
    MissingSection(&'static str),
    FoundSection(&'static str),
    MissingRecommended(&'static str),
    FoundRecommended(&'static str),
    NoDiagram,
    DiagramNotMermaid,
    FoundDiagram,
    NoMustConstraints,
    Constraints { keyword: &'static str, count: usize },
    TemplateIncomplete { found: usize },
    TemplatePartial { found: usize },
    TemplateSections { found: usize },
    DescriptionShort,
    DescriptionEmpty,
    DescriptionVeryShort,
    DescriptionLength(usize),
    ValidToml,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = TEMPLATE_SECTIONS.len();
        match self {
            Self::FileMissing(path) => write!(f, "File does not exist: {}", path.display()),
            Self::Unreadable(reason) => write!(f, "Could not load document: {}", reason),
            Self::InvalidToml(message) => write!(f, "TOML syntax error: {}", message),
            Self::MissingKey(key) => write!(f, "Missing required key: '{}'", key),
            Self::FoundKey(key) => write!(f, "Found required key: '{}'", key),
            Self::MissingSection(s) => write!(f, "Missing required section: '{}'", s),
            Self::FoundSection(s) => write!(f, "Found required section: '{}'", s),
            Self::MissingRecommended(s) => write!(f, "Missing recommended section: '{}'", s),
            Self::FoundRecommended(s) => write!(f, "Found recommended section: '{}'", s),
            Self::NoDiagram => write!(f, "No Mermaid workflow diagram found"),
            Self::DiagramNotMermaid => write!(f, "Workflow diagram may not use Mermaid format"),
            Self::FoundDiagram => write!(f, "Found Mermaid workflow diagram"),
            Self::NoMustConstraints => write!(f, "No MUST constraints found"),
            Self::Constraints { keyword, count } => {
                write!(f, "Found {} {} constraints", count, keyword)
            }
            Self::TemplateIncomplete { found } => {
                write!(f, "Notepad template incomplete ({}/{} sections)", found, total)
            }
            Self::TemplatePartial { found } => {
                write!(f, "Only found {}/{} notepad sections", found, total)
            }
            Self::TemplateSections { found } => {
                write!(f, "Notepad template: {}/{} sections", found, total)
            }
            Self::DescriptionShort => write!(f, "Description is missing or very short"),
            Self::DescriptionEmpty => write!(f, "Description is empty"),
            Self::DescriptionVeryShort => {
                write!(f, "Description is very short (< {} chars)", MIN_DESCRIPTION_LEN)
            }
            Self::DescriptionLength(len) => write!(f, "Description length: {} chars", len),
            Self::ValidToml => write!(f, "Valid TOML syntax"),
        }
    }
}

/// Overall outcome of a validation run.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Valid,
    ValidWithWarnings,
    Invalid,
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => write!(f, "VALID"),
            Self::ValidWithWarnings => write!(f, "VALID with warnings"),
            Self::Invalid => write!(f, "INVALID"),
        }
    }
}

/// Structured pass/warn/fail report.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub info: Vec<String>,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationReport {
    /// Creates an empty, valid report.
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            info: Vec::new(),
        }
    }

    /// Records an error and marks the report invalid.
    pub fn error(&mut self, finding: Finding) {
        self.is_valid = false;
        self.errors.push(finding.to_string());
    }

    pub fn warning(&mut self, finding: Finding) {
        self.warnings.push(finding.to_string());
    }

    pub fn info(&mut self, finding: Finding) {
        self.info.push(finding.to_string());
    }

    pub fn status(&self) -> ValidationStatus {
        if !self.is_valid {
            ValidationStatus::Invalid
        } else if !self.warnings.is_empty() {
            ValidationStatus::ValidWithWarnings
        } else {
            ValidationStatus::Valid
        }
    }
}

/// Section, diagram and constraint checks shared by both entry points.
/// `no_diagram` is the warning raised when the prompt has no Mermaid block.
fn check_prompt(prompt: &str, no_diagram: Finding, report: &mut ValidationReport) {
    for section in REQUIRED_SECTIONS {
        if prompt.contains(section) {
            report.info(Finding::FoundSection(section));
        } else {
            report.error(Finding::MissingSection(section));
        }
    }

    for section in RECOMMENDED_SECTIONS {
        if prompt.contains(section) {
            report.info(Finding::FoundRecommended(section));
        } else {
            report.warning(Finding::MissingRecommended(section));
        }
    }

    if metadata::has_diagram(prompt) {
        report.info(Finding::FoundDiagram);
    } else {
        report.warning(no_diagram);
    }

    let counts = metadata::count_constraints(prompt);
    if counts.must == 0 {
        report.warning(Finding::NoMustConstraints);
    } else {
        report.info(Finding::Constraints {
            keyword: "MUST",
            count: counts.must,
        });
    }
    if counts.should > 0 {
        report.info(Finding::Constraints {
            keyword: "SHOULD",
            count: counts.should,
        });
    }
    if counts.may > 0 {
        report.info(Finding::Constraints {
            keyword: "MAY",
            count: counts.may,
        });
    }
}

/// Validates a loaded document.
///
/// # Example
///
/// ```
/// use workflow_specs::spec::{validate, Category, SpecDocument};
///
/// let doc = SpecDocument::new("bare", Category::Development, "", "");
/// let report = validate(&doc);
/// assert!(!report.is_valid);
/// ```
pub fn validate(doc: &SpecDocument) -> ValidationReport {
    debug!("Validating spec '{}'", doc.name);
    let mut report = ValidationReport::new();

    check_prompt(&doc.prompt, Finding::NoDiagram, &mut report);

    let found = metadata::count_template_sections(&doc.prompt);
    if found < DOCUMENT_TEMPLATE_MIN {
        report.error(Finding::TemplateIncomplete { found });
    } else {
        report.info(Finding::TemplateSections { found });
    }

    if doc.description.chars().count() < MIN_DESCRIPTION_LEN {
        report.warning(Finding::DescriptionShort);
    }

    report
}

/// Validates a spec file on disk, including its TOML syntax and top-level
/// keys.
pub fn validate_file(path: &Path) -> ValidationReport {
    let mut report = ValidationReport::new();

    if !path.exists() {
        report.error(Finding::FileMissing(path.to_path_buf()));
        return report;
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            report.error(Finding::Unreadable(e.to_string()));
            return report;
        }
    };

    validate_str(&content, &mut report);
    report
}

/// Strict check of raw file content. Unlike loading, Windows paths are not
/// rewritten first, so an unescaped backslash is a syntax error here.
fn validate_str(content: &str, report: &mut ValidationReport) {
    let data: toml::Table = match toml::from_str(content) {
        Ok(data) => data,
        Err(e) => {
            report.error(Finding::InvalidToml(e.message().to_string()));
            return;
        }
    };
    report.info(Finding::ValidToml);

    for key in REQUIRED_KEYS {
        if data.contains_key(key) {
            report.info(Finding::FoundKey(key));
        } else {
            report.error(Finding::MissingKey(key));
        }
    }

    if let Some(prompt) = data.get("prompt").and_then(|v| v.as_str()) {
        check_prompt(prompt, Finding::DiagramNotMermaid, report);

        let found = metadata::count_template_sections(prompt);
        if found >= FILE_TEMPLATE_PASS {
            report.info(Finding::TemplateSections { found });
        } else if found >= FILE_TEMPLATE_WARN {
            report.warning(Finding::TemplatePartial { found });
        } else {
            report.error(Finding::TemplateIncomplete { found });
        }
    }

    if let Some(description) = data.get("description").and_then(|v| v.as_str()) {
        let len = description.chars().count();
        if description.trim().is_empty() {
            report.warning(Finding::DescriptionEmpty);
        } else if len < MIN_DESCRIPTION_LEN {
            report.warning(Finding::DescriptionVeryShort);
        } else {
            report.info(Finding::DescriptionLength(len));
        }
    }
}

/// Totals across a batch of file validations.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationSummary {
    pub files: usize,
    pub valid: usize,
    pub invalid: usize,
    pub errors: usize,
    pub warnings: usize,
}

impl ValidationSummary {
    pub fn from_reports<'a>(reports: impl IntoIterator<Item = &'a ValidationReport>) -> Self {
        let mut summary = Self::default();
        for report in reports {
            summary.files += 1;
            if report.is_valid {
                summary.valid += 1;
            } else {
                summary.invalid += 1;
            }
            summary.errors += report.errors.len();
            summary.warnings += report.warnings.len();
        }
        summary
    }
}

/// Validates every spec file below `root`, or `root` itself when it is a
/// file.
pub fn validate_directory(root: &Path) -> Vec<(PathBuf, ValidationReport)> {
    let files = if root.is_file() {
        vec![root.to_path_buf()]
    } else {
        discover_spec_files(root)
    };

    let results: Vec<(PathBuf, ValidationReport)> = files
        .into_iter()
        .map(|path| {
            let report = validate_file(&path);
            (path, report)
        })
        .collect();

    let summary = ValidationSummary::from_reports(results.iter().map(|(_, r)| r));
    info!(
        "Validated {} files: {} valid, {} invalid",
        summary.files, summary.valid, summary.invalid
    );
    results
}
