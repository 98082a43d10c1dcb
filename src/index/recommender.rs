//! Task-to-spec recommendation by deterministic keyword scoring.

use serde::Serialize;

use crate::spec::SpecDocument;

/// Maximum number of documents returned by a recommendation.
pub const MAX_RECOMMENDATIONS: usize = 3;

const KEYWORD_WEIGHT: u32 = 10;
const DESCRIPTION_WEIGHT: u32 = 2;
const TAG_WEIGHT: u32 = 5;

/// Characteristic task words per well-known document name.
const KEYWORD_TABLE: &[(&str, &[&str])] = &[
    ("dev", &["implement", "build", "code", "feature", "fix", "bug"]),
    ("spec", &["requirement", "design", "plan", "specification"]),
    ("test", &["test", "testing", "quality", "automation", "qa"]),
    ("review", &["review", "code review", "quality", "assess"]),
    ("troubleshoot", &["debug", "issue", "problem", "error", "fix"]),
    ("investigate", &["crash", "failure", "investigate", "forensic"]),
    ("security", &["security", "vulnerability", "secure", "audit"]),
    ("optimize", &["performance", "optimize", "speed", "slow"]),
    ("architecture", &["architecture", "design", "structure", "system"]),
    ("research", &["research", "evaluate", "compare", "technology"]),
    ("learn", &["learn", "tutorial", "understand", "education"]),
    ("paper", &["paper", "academic", "literature", "research paper"]),
    ("docs", &["documentation", "docs", "document", "write"]),
    ("innovate", &["innovate", "improve", "enhance", "creative"]),
    ("integrate", &["integrate", "api", "connect", "interface"]),
    ("wtf", &["mysterious", "legacy", "understand", "archaeology"]),
];

/// A recommended document name with its score.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Recommendation {
    pub name: String,
    pub score: u32,
}

/// Keywords registered for a document name, empty if unknown.
pub fn keywords_for(name: &str) -> &'static [&'static str] {
    KEYWORD_TABLE
        .iter()
        .find(|(doc, _)| *doc == name)
        .map(|(_, keywords)| *keywords)
        .unwrap_or(&[])
}

/// Scores one document against an already lowercased task text.
pub fn score(spec: &SpecDocument, task_lower: &str) -> u32 {
    let keyword_hits = keywords_for(&spec.name)
        .iter()
        .filter(|keyword| task_lower.contains(*keyword))
        .count() as u32;

    let description = spec.description.to_lowercase();
    let description_hit = description
        .split_whitespace()
        .any(|word| task_lower.contains(word));

    let tag_hits = spec
        .tags
        .iter()
        .filter(|tag| task_lower.contains(tag.as_str()))
        .count() as u32;

    keyword_hits * KEYWORD_WEIGHT
        + if description_hit { DESCRIPTION_WEIGHT } else { 0 }
        + tag_hits * TAG_WEIGHT
}

fn ranked<'a>(specs: &'a [SpecDocument], task: &str) -> Vec<(&'a SpecDocument, u32)> {
    let task_lower = task.to_lowercase();
    let mut scored: Vec<(&SpecDocument, u32)> = specs
        .iter()
        .map(|spec| (spec, score(spec, &task_lower)))
        .filter(|(_, score)| *score > 0)
        .collect();

    // Stable, so ties keep load order.
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.truncate(MAX_RECOMMENDATIONS);
    scored
}

/// Up to three documents for a task, best first. Empty means no match.
pub fn recommend<'a>(specs: &'a [SpecDocument], task: &str) -> Vec<&'a SpecDocument> {
    ranked(specs, task).into_iter().map(|(spec, _)| spec).collect()
}

pub fn recommend_scored(specs: &[SpecDocument], task: &str) -> Vec<Recommendation> {
    ranked(specs, task)
        .into_iter()
        .map(|(spec, score)| Recommendation {
            name: spec.name.clone(),
            score,
        })
        .collect()
}
