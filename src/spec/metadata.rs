//! Metadata Extraction
//!
//! Pure functions that derive structured facts from a document's free text:
//! phase headings, constraint keyword counts, diagram presence, notepad
//! template completeness, execution modes and the output path pattern.
//!
//! All pattern matching against prompt text lives here, so the index,
//! recommender and validator only ever see the derived values.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::model::{Category, Mode, Phase};

/// Headings of the form `### 3. Something`. Exactly three hashes.
static PHASE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*###[ \t]*(\d+)\.[ \t]*(\S[^\r\n]*)").expect("phase heading pattern")
});

static MUST_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bMUST\b").expect("MUST pattern"));
static SHOULD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bSHOULD\b").expect("SHOULD pattern"));
static MAY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bMAY\b").expect("MAY pattern"));

/// Output directory patterns, tried in order.
static OUTPUT_PATH_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"\.lia/([a-z-]+)/\{[a-z_]+\}", r"'\.lia/([a-z-]+)/"]
        .iter()
        .map(|p| Regex::new(p).expect("output path pattern"))
        .collect()
});

/// Fenced code block opener for workflow diagrams (matched case-insensitively).
pub const DIAGRAM_OPENER: &str = "```mermaid";

/// Section headings making up the notepad template.
pub const TEMPLATE_SECTIONS: [&str; 6] = [
    "## 🧠 Key Insights",
    "## 🔧 Technical Notes",
    "## 💡 Ideas",
    "## 🔗 Cross-",
    "## 📝 User Notes",
    "## 🤖 LLM Observations",
];

/// Minimum number of template sections for `has_full_template`.
pub const FULL_TEMPLATE_THRESHOLD: usize = 4;

/// Keywords promoted to tags when found in a description.
pub const TAG_VOCABULARY: [&str; 13] = [
    "development",
    "testing",
    "review",
    "security",
    "architecture",
    "troubleshooting",
    "research",
    "documentation",
    "innovation",
    "learning",
    "integration",
    "specification",
    "optimization",
];

/// Occurrences of the modal keywords in a prompt.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConstraintCounts {
    pub must: usize,
    pub should: usize,
    pub may: usize,
}

/// Everything derived from a prompt body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedMetadata {
    pub phases: Vec<Phase>,
    pub constraints: ConstraintCounts,
    pub has_diagram: bool,
    pub template_sections: usize,
    pub has_full_template: bool,
    pub modes: Vec<Mode>,
    pub output_path_pattern: String,
}

/// Derives all prompt-based metadata in one pass over the extractors.
pub fn derive(prompt: &str) -> DerivedMetadata {
    let template_sections = count_template_sections(prompt);

    DerivedMetadata {
        phases: extract_phases(prompt),
        constraints: count_constraints(prompt),
        has_diagram: has_diagram(prompt),
        template_sections,
        has_full_template: template_sections >= FULL_TEMPLATE_THRESHOLD,
        modes: detect_modes(prompt),
        output_path_pattern: extract_output_path(prompt),
    }
}

/// Extracts `### N. Name` headings in document order.
///
/// Numbers are not checked for order or uniqueness. A number too large for
/// `u64` saturates to `u64::MAX`.
///
/// ```
/// use workflow_specs::spec::metadata::extract_phases;
///
/// let phases = extract_phases("### 2. Build\n### 1. Plan\n");
/// assert_eq!(phases[0].number, 2);
/// assert_eq!(phases[1].name, "Plan");
/// ```
pub fn extract_phases(prompt: &str) -> Vec<Phase> {
    PHASE_RE
        .captures_iter(prompt)
        .map(|caps| {
            // The pattern only admits digits, so overflow is the only failure.
            let number = caps[1].parse::<u64>().unwrap_or(u64::MAX);
            Phase::new(number, caps[2].trim())
        })
        .collect()
}

/// Counts whole-word, case-sensitive `MUST`, `SHOULD` and `MAY`.
pub fn count_constraints(prompt: &str) -> ConstraintCounts {
    ConstraintCounts {
        must: MUST_RE.find_iter(prompt).count(),
        should: SHOULD_RE.find_iter(prompt).count(),
        may: MAY_RE.find_iter(prompt).count(),
    }
}

pub fn has_diagram(prompt: &str) -> bool {
    prompt.to_lowercase().contains(DIAGRAM_OPENER)
}

/// Number of [`TEMPLATE_SECTIONS`] present anywhere in the prompt.
pub fn count_template_sections(prompt: &str) -> usize {
    TEMPLATE_SECTIONS
        .iter()
        .filter(|section| prompt.contains(*section))
        .count()
}

pub fn detect_modes(prompt: &str) -> Vec<Mode> {
    let mut modes = Vec::new();
    if prompt.contains("Collaboration Mode") {
        modes.push(Mode::Collaboration);
    }
    if prompt.contains("Silent Mode") {
        modes.push(Mode::Silent);
    }
    modes
}

/// Returns `.lia/<group>/` for the first matching output pattern, or an
/// empty string.
pub fn extract_output_path(prompt: &str) -> String {
    OUTPUT_PATH_RES
        .iter()
        .find_map(|re| re.captures(prompt))
        .map(|caps| format!(".lia/{}/", &caps[1]))
        .unwrap_or_default()
}

/// Builds the tag set: the category name plus any vocabulary keyword
/// found in the description. Sorted, without duplicates.
pub fn extract_tags(description: &str, category: Category) -> Vec<String> {
    let description = description.to_lowercase();

    let mut tags: Vec<String> = std::iter::once(category.as_str())
        .chain(
            TAG_VOCABULARY
                .iter()
                .copied()
                .filter(|keyword| description.contains(keyword)),
        )
        .map(str::to_string)
        .collect();
    tags.sort();
    tags.dedup();
    tags
}
