//! Spec Parser
//!
//! Handles discovering and loading workflow spec documents from a
//! directory tree. Each `.toml` file becomes one [`SpecDocument`]; the
//! category comes from the file's immediate parent directory.
//!
//! Loading is resilient: a document that cannot be parsed is skipped with
//! a warning and the scan continues.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use walkdir::{DirEntry, WalkDir};

use super::model::{Category, SpecDocument, DEFAULT_VERSION};
use crate::error::{Result, SpecError};
use crate::triggers::TriggerEdge;

/// Extension of spec documents.
pub const SPEC_EXTENSION: &str = "toml";

const PROMPT_OPENER: &str = "prompt = \"\"\"";
const PROMPT_CLOSER: &str = "\"\"\"";

static FALLBACK_DESCRIPTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^description\s*=\s*"([^"]*)""#).expect("description pattern")
});

static WINDOWS_DRIVE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z]:\\").expect("drive path pattern"));

/// On-disk shape of a spec document.
#[derive(Deserialize, Debug, Default)]
struct RawSpec {
    #[serde(default)]
    description: String,
    #[serde(default)]
    prompt: String,
    #[serde(default)]
    triggers: TriggerEdge,
    #[serde(default)]
    metadata: RawMetadata,
}

#[derive(Deserialize, Debug, Default)]
struct RawMetadata {
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    authors: Vec<String>,
    version: Option<String>,
}

/// Fields recovered by the textual fallback.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FallbackFields {
    pub description: Option<String>,
    pub prompt: Option<String>,
}

/// A document that was found but could not be loaded.
#[derive(Debug, Clone)]
pub struct SkippedDocument {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of a directory scan.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Successfully parsed documents, in path order
    pub documents: Vec<SpecDocument>,
    /// Documents skipped because they could not be parsed
    pub skipped: Vec<SkippedDocument>,
}

impl LoadReport {
    /// Human-readable warnings for every skipped document.
    pub fn warnings(&self) -> Vec<String> {
        self.skipped
            .iter()
            .map(|s| format!("Failed to load {}: {}", s.path.display(), s.reason))
            .collect()
    }
}

/// Directories starting with `_` hold shared material (such as the trigger
/// document), not workflow specs.
fn is_reserved_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| name.starts_with('_'))
            .unwrap_or(false)
}

fn has_spec_extension(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(SPEC_EXTENSION)
}

/// Recursively finds spec documents below `root`, sorted by path.
///
/// A missing root yields an empty list.
pub fn discover_spec_files(root: &Path) -> Vec<PathBuf> {
    if !root.exists() {
        debug!("Specs directory does not exist: {}", root.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_reserved_dir(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && has_spec_extension(e.path()))
        .map(|e| e.into_path())
        .collect();

    files.sort();
    files
}

/// Replaces backslashes on lines containing a Windows drive path, which
/// would otherwise be read as invalid TOML escapes.
pub fn normalize_windows_paths(content: &str) -> Cow<'_, str> {
    if !WINDOWS_DRIVE_RE.is_match(content) {
        return Cow::Borrowed(content);
    }

    let lines: Vec<Cow<'_, str>> = content
        .split('\n')
        .map(|line| {
            if WINDOWS_DRIVE_RE.is_match(line) {
                Cow::Owned(line.replace('\\', "/"))
            } else {
                Cow::Borrowed(line)
            }
        })
        .collect();

    Cow::Owned(lines.join("\n"))
}

/// Best-effort recovery of `description` and `prompt` from text that is
/// not valid TOML.
///
/// The description must be a single-line quoted assignment. The prompt runs
/// from the first `prompt = """` to the last `"""` in the file.
pub fn parse_fallback(content: &str) -> Option<FallbackFields> {
    let description = FALLBACK_DESCRIPTION_RE
        .captures(content)
        .map(|caps| caps[1].to_string());

    let prompt = content.find(PROMPT_OPENER).and_then(|start| {
        let start = start + PROMPT_OPENER.len();
        let end = content.rfind(PROMPT_CLOSER)?;
        (end > start).then(|| content[start..end].to_string())
    });

    if description.is_none() && prompt.is_none() {
        return None;
    }

    Some(FallbackFields {
        description,
        prompt,
    })
}

fn name_from_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

fn category_from_path(path: &Path) -> Category {
    path.parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .map(Category::from_dir_name)
        .unwrap_or(Category::Development)
}

/// Parses document text loaded from `path`.
///
/// The structured TOML parse is tried first; if it fails, the textual
/// fallback runs on the original content. The document name and category
/// always come from `path`.
pub fn parse_spec_str(path: &Path, content: &str) -> Result<SpecDocument> {
    let name = name_from_path(path);
    if name.trim().is_empty() {
        return Err(SpecError::Parse {
            path: path.to_path_buf(),
            message: "document has no usable file name".to_string(),
        });
    }
    let category = category_from_path(path);

    let normalized = normalize_windows_paths(content);
    match toml::from_str::<RawSpec>(&normalized) {
        Ok(raw) => {
            debug!("Parsed {} as structured TOML", path.display());
            Ok(SpecDocument::new(name, category, raw.description, raw.prompt)
                .with_path(path)
                .with_version(raw.metadata.version.unwrap_or_else(|| DEFAULT_VERSION.to_string()))
                .with_declared_tags(raw.metadata.tags)
                .with_authors(raw.metadata.authors)
                .with_triggers(raw.triggers))
        }
        Err(e) => {
            debug!(
                "Structured parse of {} failed ({}), trying fallback",
                path.display(),
                e.message()
            );
            let fields = parse_fallback(content).ok_or_else(|| SpecError::Empty {
                path: path.to_path_buf(),
            })?;
            warn!(
                "Loaded {} via fallback parser; only description and prompt recovered",
                path.display()
            );
            Ok(SpecDocument::new(
                name,
                category,
                fields.description.unwrap_or_default(),
                fields.prompt.unwrap_or_default(),
            )
            .with_path(path))
        }
    }
}

/// Loads a single spec document from disk.
///
/// # Example
///
/// ```rust,no_run
/// use std::path::Path;
/// use workflow_specs::spec::load_spec_file;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let doc = load_spec_file(Path::new("specs/development/dev.toml"))?;
///     println!("{} has {} phases", doc.name, doc.phases.len());
///     Ok(())
/// }
/// ```
pub fn load_spec_file(path: &Path) -> Result<SpecDocument> {
    let content = fs::read_to_string(path).map_err(|e| SpecError::io(path, e))?;
    debug!("Read {} ({} bytes)", path.display(), content.len());
    parse_spec_str(path, &content)
}

/// Loads every spec document below `root`.
///
/// Unreadable or unparsable documents are recorded in
/// [`LoadReport::skipped`] rather than failing the scan.
pub fn load_directory(root: &Path) -> LoadReport {
    info!("Loading specs from: {}", root.display());

    let mut report = LoadReport::default();
    for path in discover_spec_files(root) {
        match load_spec_file(&path) {
            Ok(doc) => {
                debug!(
                    "Loaded '{}' ({}, {} phases)",
                    doc.name,
                    doc.category,
                    doc.phases.len()
                );
                report.documents.push(doc);
            }
            Err(e) => {
                warn!("Failed to load {}: {}", path.display(), e);
                report.skipped.push(SkippedDocument {
                    path,
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        "Loaded {} specs ({} skipped)",
        report.documents.len(),
        report.skipped.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_discover_missing_root() {
        assert!(discover_spec_files(Path::new("/nonexistent/specs")).is_empty());
    }

    #[test]
    fn test_discover_skips_reserved_and_other_extensions() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        write(root, "development/dev.toml", "description = \"d\"");
        write(root, "quality/review.toml", "description = \"r\"");
        write(root, "quality/notes.md", "# notes");
        write(root, "_common/workflow-triggers.toml", "[triggers]");

        let files = discover_spec_files(root);
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.extension().unwrap() == "toml"));
        assert!(files.iter().all(|f| !f.to_string_lossy().contains("_common")));
    }

    #[test]
    fn test_parse_structured_document() {
        let content = r#"
description = "Development workflow for testing"
prompt = """
### 1. Plan
### 2. Build
You MUST test.
"""

[triggers]
on_complete = ["test", "review"]
provides = ["implementation"]

[metadata]
version = "2.1.0"
tags = ["core"]
authors = ["Jane"]
"#;
        let doc = parse_spec_str(Path::new("/specs/development/dev.toml"), content).unwrap();
        assert_eq!(doc.name, "dev");
        assert_eq!(doc.filename, "dev.toml");
        assert_eq!(doc.category, Category::Development);
        assert_eq!(doc.phases.len(), 2);
        assert_eq!(doc.constraints.must, 1);
        assert_eq!(doc.version, "2.1.0");
        assert_eq!(doc.authors, vec!["Jane"]);
        assert_eq!(doc.declared_tags, vec!["core"]);
        assert_eq!(doc.triggers.on_complete, vec!["test", "review"]);
        assert!(doc.has_tag("testing"));
    }

    #[test]
    fn test_parse_document_triggers_prefer_legacy_names() {
        let content = r#"
description = "d"
prompt = "p"

[triggers]
on_complete = ["review"]
provides = ["implementation"]
typical_outputs = ["code"]
requires = ["requirements"]
"#;
        let doc = parse_spec_str(Path::new("/specs/development/dev.toml"), content).unwrap();
        assert_eq!(doc.triggers.on_complete, vec!["review"]);
        assert_eq!(doc.triggers.provides, vec!["code"]);
        assert_eq!(doc.triggers.requires, vec!["requirements"]);
    }

    #[test]
    fn test_parse_unknown_category_falls_back() {
        let doc = parse_spec_str(
            Path::new("/specs/misc/thing.toml"),
            "description = \"x\"\nprompt = \"y\"",
        )
        .unwrap();
        assert_eq!(doc.category, Category::Development);
        assert!(doc.has_tag("development"));
    }

    #[test]
    fn test_parse_missing_fields_default() {
        let doc = parse_spec_str(Path::new("/specs/quality/empty.toml"), "").unwrap();
        assert!(doc.description.is_empty());
        assert!(doc.prompt.is_empty());
        assert_eq!(doc.version, DEFAULT_VERSION);
        assert_eq!(doc.tags, vec!["quality"]);
    }

    #[test]
    fn test_windows_paths_normalized() {
        let content = "description = \"Docs at C:\\Users\\me\\docs\"\nprompt = \"ok\"";
        let doc = parse_spec_str(Path::new("/specs/knowledge/docs.toml"), content).unwrap();
        assert_eq!(doc.description, "Docs at C:/Users/me/docs");
    }

    #[test]
    fn test_normalize_leaves_other_lines() {
        let content = "a = \"x\\ny\"\nb = \"C:\\temp\"";
        let normalized = normalize_windows_paths(content);
        assert_eq!(normalized, "a = \"x\\ny\"\nb = \"C:/temp\"");
    }

    #[test]
    fn test_fallback_recovers_fields() {
        let content = "description = \"Broken spec\"\nprompt = \"\"\"\nBad escape \\q here\n\"\"\"\n";
        let fields = parse_fallback(content).unwrap();
        assert_eq!(fields.description.as_deref(), Some("Broken spec"));
        assert_eq!(fields.prompt.as_deref(), Some("\nBad escape \\q here\n"));
    }

    #[test]
    fn test_fallback_uses_last_closing_marker() {
        let content = "prompt = \"\"\"one\"\"\" two \"\"\"";
        let fields = parse_fallback(content).unwrap();
        assert_eq!(fields.prompt.as_deref(), Some("one\"\"\" two "));
        assert!(fields.description.is_none());
    }

    #[test]
    fn test_fallback_nothing_recovered() {
        assert!(parse_fallback("garbage [[[").is_none());
    }

    #[test]
    fn test_parse_invalid_escape_uses_fallback() {
        let content = "description = \"Broken\"\nprompt = \"\"\"\n### 1. Start\nPath \\q\n\"\"\"\n[triggers\n";
        let doc = parse_spec_str(Path::new("/specs/research/broken.toml"), content).unwrap();
        assert_eq!(doc.description, "Broken");
        assert_eq!(doc.phases.len(), 1);
        assert_eq!(doc.category, Category::Research);
        assert!(doc.triggers.on_complete.is_empty());
        assert!(doc.authors.is_empty());
    }

    #[test]
    fn test_parse_unrecoverable_is_error() {
        let result = parse_spec_str(Path::new("/specs/quality/bad.toml"), "this is not [[[ toml");
        assert!(matches!(result, Err(SpecError::Empty { .. })));
    }

    #[test]
    fn test_load_spec_file_not_found() {
        let result = load_spec_file(Path::new("/nonexistent/path/dev.toml"));
        assert!(matches!(result, Err(SpecError::Io { .. })));
    }

    #[test]
    fn test_load_directory_skips_broken() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        write(root, "development/dev.toml", "description = \"Dev\"\nprompt = \"p\"");
        write(root, "quality/bad.toml", "not toml at all [[[");
        write(root, "research/research.toml", "description = \"Research\"\nprompt = \"p\"");

        let report = load_directory(root);
        assert_eq!(report.documents.len(), 2);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.warnings()[0].contains("bad.toml"));
    }

    #[test]
    fn test_load_directory_missing_root() {
        let report = load_directory(Path::new("/nonexistent/specs"));
        assert!(report.documents.is_empty());
        assert!(report.skipped.is_empty());
    }
}
