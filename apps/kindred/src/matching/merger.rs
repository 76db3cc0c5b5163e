//! Match Result Merger — folds an untrusted, possibly partial match set back
//! into the full catalog and produces the display ordering.
//!
//! Merge policy:
//! - ids not in the catalog are never looked up, so they are ignored
//! - duplicate ids resolve to the LAST entry in response order
//! - opportunities without an entry score `UNMATCHED_SCORE`
//!
//! The sort is stable, so ties (including the whole unmatched group) keep
//! catalog order and re-sorting an already sorted list changes nothing.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::opportunity::{Category, Opportunity};

/// Score assigned to opportunities the service did not return, and to
/// entries whose score was missing or non-numeric.
pub const UNMATCHED_SCORE: f64 = -1.0;

/// Scores above this are shown as a high match.
pub const HIGH_MATCH_THRESHOLD: f64 = 80.0;

/// One ranked pick returned by the inference service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AIMatchResult {
    pub opportunity_id: String,
    pub score: f64,
    pub reason: String,
}

impl AIMatchResult {
    pub fn is_high_match(&self) -> bool {
        self.score > HIGH_MATCH_THRESHOLD
    }
}

/// All results of one match request, in the order the service returned them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchSet(Vec<AIMatchResult>);

impl MatchSet {
    pub fn new(results: Vec<AIMatchResult>) -> Self {
        Self(results)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn results(&self) -> &[AIMatchResult] {
        &self.0
    }

    /// id → result map. Later entries overwrite earlier ones.
    pub fn lookup(&self) -> HashMap<&str, &AIMatchResult> {
        let mut map = HashMap::with_capacity(self.0.len());
        for result in &self.0 {
            map.insert(result.opportunity_id.as_str(), result);
        }
        map
    }

    /// Resolved entry for one id, same policy as `lookup`.
    pub fn get(&self, opportunity_id: &str) -> Option<&AIMatchResult> {
        self.0.iter().rev().find(|r| r.opportunity_id == opportunity_id)
    }

    /// Results sorted by score descending, ties in response order.
    pub fn ranked(&self) -> Vec<&AIMatchResult> {
        let mut ranked: Vec<&AIMatchResult> = self.0.iter().collect();
        ranked.sort_by(|a, b| compare_scores(a.score, b.score));
        ranked
    }
}

/// Category filter over the catalog. Independent of matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn admits(self, opportunity: &Opportunity) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => opportunity.category == category,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str("All"),
            CategoryFilter::Only(category) => f.write_str(category.label()),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "All" {
            return Ok(CategoryFilter::All);
        }
        Category::ALL
            .into_iter()
            .find(|c| c.label() == s)
            .map(CategoryFilter::Only)
            .ok_or_else(|| format!("unknown category '{s}'"))
    }
}

impl TryFrom<String> for CategoryFilter {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CategoryFilter> for String {
    fn from(filter: CategoryFilter) -> Self {
        filter.to_string()
    }
}

/// Filters the catalog and orders it by match score, highest first.
///
/// Algorithm:
/// 1. Build the id → result map (last duplicate wins)
/// 2. Keep opportunities admitted by `filter`, in catalog order
/// 3. Stable-sort by score descending; unmatched opportunities score -1
///
/// With an empty match set this is exactly the filtered catalog order.
pub fn sort_for_display<'a>(
    catalog: &'a [Opportunity],
    matches: &MatchSet,
    filter: CategoryFilter,
) -> Vec<&'a Opportunity> {
    let filtered: Vec<&Opportunity> = catalog.iter().filter(|o| filter.admits(o)).collect();

    if matches.is_empty() {
        return filtered;
    }

    let lookup = matches.lookup();
    let mut scored: Vec<(f64, &Opportunity)> = filtered
        .into_iter()
        .map(|o| (score_of(&lookup, &o.id), o))
        .collect();

    scored.sort_by(|a, b| compare_scores(a.0, b.0));

    scored.into_iter().map(|(_, o)| o).collect()
}

fn score_of(lookup: &HashMap<&str, &AIMatchResult>, id: &str) -> f64 {
    lookup.get(id).map(|m| m.score).unwrap_or(UNMATCHED_SCORE)
}

/// Descending by score.
fn compare_scores(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}
