//! Markdown Reports
//!
//! Human-oriented overviews built from a [`SpecCollection`]: the quick
//! reference guide and side-by-side comparison of two documents.

use super::collection::SpecCollection;
use crate::spec::{Category, SpecDocument};

const QUICK_REFERENCE_DESCRIPTION_LEN: usize = 80;
const COMPARE_DESCRIPTION_LEN: usize = 150;
const USE_CASE_FALLBACK_LEN: usize = 100;
const COMPARE_TAG_COUNT: usize = 3;

/// Task type to recommended workflow, rendered as the selection guide.
const SELECTION_GUIDE: &[(&str, &str)] = &[
    ("Implement new feature", "`spec` → `dev`"),
    ("Fix a bug", "`troubleshoot` or `dev`"),
    ("Review code", "`review`"),
    ("Security audit", "`security`"),
    ("Performance issues", "`optimize`"),
    ("Unknown code", "`wtf`"),
    ("Crash investigation", "`investigate`"),
    ("Write documentation", "`docs`"),
    ("Research technology", "`research`"),
    ("Read academic paper", "`paper`"),
    ("Learn new skills", "`learn`"),
    ("Enhance features", "`innovate`"),
    ("Design architecture", "`architecture`"),
    ("Build API", "`integrate`"),
    ("Plan tests", "`test`"),
];

const USE_CASES: &[(&str, &str)] = &[
    ("dev", "Implementing features, fixing bugs, building systems"),
    ("spec", "Creating requirements and design documents before implementation"),
    ("test", "Designing and implementing testing strategies"),
    ("review", "Conducting thorough code reviews"),
    ("troubleshoot", "Diagnosing and resolving technical issues"),
    ("investigate", "Forensic analysis after crashes or data loss"),
    ("security", "Security assessments and vulnerability testing"),
    ("optimize", "Performance optimization and profiling"),
    ("architecture", "System design and architectural decisions"),
    ("research", "Technology evaluation and proof of concepts"),
    ("learn", "Project-based learning and skill development"),
    ("paper", "Academic paper analysis and synthesis"),
    ("docs", "Documentation creation and knowledge management"),
    ("innovate", "Creative enhancement and feature innovation"),
    ("integrate", "API development and system integration"),
    ("wtf", "Understanding mysterious or legacy code"),
];

/// One-line blurb for a category heading.
pub fn category_blurb(category: Category) -> &'static str {
    match category {
        Category::Development => "Build and implement features, fix bugs, and conduct testing",
        Category::Quality => "Ensure code quality, security, and system architecture",
        Category::ProblemSolving => "Diagnose issues, investigate crashes, and troubleshoot",
        Category::Research => "Conduct research, analyse papers, and evaluate technologies",
        Category::Knowledge => "Create documentation and manage knowledge",
        Category::Strategy => "Drive innovation and integration initiatives",
    }
}

/// When-to-use line for a document, falling back to its description.
pub fn use_case(spec: &SpecDocument) -> String {
    USE_CASES
        .iter()
        .find(|(name, _)| *name == spec.name)
        .map(|(_, text)| text.to_string())
        .unwrap_or_else(|| truncate_chars(&spec.description, USE_CASE_FALLBACK_LEN).to_string())
}

/// Overview of every loaded document grouped by category.
pub fn quick_reference(collection: &SpecCollection) -> String {
    let mut output = String::new();
    output.push_str("# Workflow Specs Quick Reference\n\n");
    output.push_str("## Overview\n");
    output.push_str(&format!(
        "Total workflows available: {}\n\n",
        collection.len()
    ));

    for (category, mut names) in collection.get_categories() {
        names.sort();
        output.push_str(&format!("## {}\n", category.title()));
        output.push_str(category_blurb(category));
        output.push_str("\n\n");

        for name in names {
            if let Some(spec) = collection.get_by_name(&name) {
                output.push_str(&format!(
                    "- **{}**: {}\n",
                    name,
                    ellipsize(&spec.description, QUICK_REFERENCE_DESCRIPTION_LEN)
                ));
            }
        }
        output.push('\n');
    }

    output.push_str("## Quick Selection Guide\n\n");
    output.push_str("| Task Type | Recommended Workflow |\n");
    output.push_str("|-----------|---------------------|\n");
    for (task, workflow) in SELECTION_GUIDE {
        output.push_str(&format!("| {} | {} |\n", task, workflow));
    }

    output
}

/// Side-by-side comparison of two documents.
pub fn compare(a: &SpecDocument, b: &SpecDocument) -> String {
    let tags = |spec: &SpecDocument| {
        spec.tags
            .iter()
            .take(COMPARE_TAG_COUNT)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut output = String::new();
    output.push_str(&format!("# Comparison: {} vs {}\n\n", a.name, b.name));
    output.push_str("## Overview\n\n");
    output.push_str(&format!("| Aspect | {} | {} |\n", a.name, b.name));
    output.push_str("|--------|------------|------------|\n");
    output.push_str(&format!("| Category | {} | {} |\n", a.category, b.category));
    output.push_str(&format!(
        "| Phases | {} | {} |\n",
        a.phases.len(),
        b.phases.len()
    ));
    output.push_str(&format!("| Tags | {} | {} |\n\n", tags(a), tags(b)));

    output.push_str("## Descriptions\n\n");
    for spec in [a, b] {
        output.push_str(&format!(
            "**{}**: {}\n\n",
            spec.name,
            ellipsize(&spec.description, COMPARE_DESCRIPTION_LEN)
        ));
    }

    output.push_str("## When to Use Each\n\n");
    output.push_str(&format!("**Use {}** when: {}\n\n", a.name, use_case(a)));
    output.push_str(&format!("**Use {}** when: {}\n", b.name, use_case(b)));

    output
}

fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn ellipsize(s: &str, max_chars: usize) -> String {
    let truncated = truncate_chars(s, max_chars);
    if truncated.len() < s.len() {
        format!("{}...", truncated)
    } else {
        s.to_string()
    }
}
