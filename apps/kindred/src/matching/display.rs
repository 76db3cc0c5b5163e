use serde::Serialize;

use crate::matching::controller::Lifecycle;
use crate::matching::merger::{AIMatchResult, CategoryFilter};
use crate::models::opportunity::Opportunity;

/// An opportunity as the front-end renders it: listing data, capacity
/// badges, and its match annotation if it was ranked.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayCard {
    #[serde(flatten)]
    pub opportunity: Opportunity,
    pub spots_remaining: u32,
    pub is_full: bool,
    pub fill_ratio: f64,
    #[serde(rename = "match")]
    pub match_result: Option<AIMatchResult>,
    pub is_high_match: bool,
}

impl DisplayCard {
    pub fn new(opportunity: &Opportunity, match_result: Option<&AIMatchResult>) -> Self {
        Self {
            spots_remaining: opportunity.spots_remaining(),
            is_full: opportunity.is_full(),
            fill_ratio: opportunity.fill_ratio(),
            is_high_match: match_result.is_some_and(|m| m.is_high_match()),
            match_result: match_result.cloned(),
            opportunity: opportunity.clone(),
        }
    }
}

/// Everything the display boundary exposes in one read.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySnapshot {
    pub lifecycle: Lifecycle,
    pub filter: CategoryFilter,
    pub has_matched: bool,
    pub match_count: usize,
    pub selected_id: Option<String>,
    pub opportunities: Vec<DisplayCard>,
}
