//! Document Lineage
//!
//! Queries over the `[triggers]` block each document declares for itself,
//! as opposed to the shared trigger graph in [`crate::triggers`].

use std::collections::HashSet;

use serde::Serialize;

use crate::spec::{Category, SpecDocument};

/// Levels walked by [`walk`] when no depth is given.
pub const DEFAULT_WALK_DEPTH: usize = 3;

/// A document whose declared outputs matched a search.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ProvidedOutput {
    pub spec: String,
    pub category: Category,
    pub provides: Vec<String>,
    /// First declared output that matched
    pub matched: String,
}

/// One document reached while walking `on_complete` links.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ChainLevel {
    pub level: usize,
    pub spec: String,
    pub category: Category,
    pub on_complete: Vec<String>,
    pub provides: Vec<String>,
}

/// Documents declaring an output containing `output`, case-insensitively.
/// Each document appears at most once, with its first matching output.
pub fn find_providing(specs: &[SpecDocument], output: &str) -> Vec<ProvidedOutput> {
    let needle = output.to_lowercase();
    specs
        .iter()
        .filter_map(|spec| {
            let matched = spec
                .triggers
                .provides
                .iter()
                .find(|provided| provided.to_lowercase().contains(&needle))?;
            Some(ProvidedOutput {
                spec: spec.name.clone(),
                category: spec.category,
                provides: spec.triggers.provides.clone(),
                matched: matched.clone(),
            })
        })
        .collect()
}

/// Breadth-first walk over each document's own `on_complete` list.
///
/// Level 0 holds `start`. Every name is visited at most once, and names that
/// do not resolve through `lookup` are dropped without ending the walk.
pub fn walk<'a, F>(start: &str, depth: usize, lookup: F) -> Vec<ChainLevel>
where
    F: Fn(&str) -> Option<&'a SpecDocument>,
{
    let mut chain = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut current = vec![start.to_string()];

    for level in 0..depth {
        let mut next = Vec::new();
        for name in current {
            if !visited.insert(name.clone()) {
                continue;
            }
            let Some(spec) = lookup(&name) else {
                continue;
            };
            next.extend(spec.triggers.on_complete.iter().cloned());
            chain.push(ChainLevel {
                level,
                spec: name,
                category: spec.category,
                on_complete: spec.triggers.on_complete.clone(),
                provides: spec.triggers.provides.clone(),
            });
        }
        if next.is_empty() {
            break;
        }
        current = next;
    }
    chain
}

/// Markdown list of a walk, one indented line per document.
pub fn format_walk(chain: &[ChainLevel]) -> String {
    let mut out = String::new();
    for step in chain {
        out.push_str(&format!(
            "{}- [{}] {} ({})",
            "  ".repeat(step.level),
            step.level,
            step.spec,
            step.category
        ));
        if !step.provides.is_empty() {
            out.push_str(&format!(" provides: {}", step.provides.join(", ")));
        }
        out.push('\n');
    }
    out
}
