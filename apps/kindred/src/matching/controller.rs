//! Match Controller — owns the smart-match application state and its transitions.
//!
//! Lifecycle: Idle → InFlight → Settled (success | failure) → Idle.
//! Settling records a `Settlement` and drops straight back to Idle.
//!
//! The controller performs no I/O and holds no lock. It rejects an illegal
//! start while a request is outstanding; keeping the trigger disabled is the
//! driver's job.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::matching::display::{DisplayCard, DisplaySnapshot};
use crate::matching::merger::{sort_for_display, CategoryFilter, MatchSet};
use crate::matching::ranker::FailureKind;
use crate::models::opportunity::Opportunity;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Lifecycle {
    #[default]
    Idle,
    InFlight {
        request_id: Uuid,
        started_at: DateTime<Utc>,
    },
}

impl Lifecycle {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Lifecycle::InFlight { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Success { matched: usize },
    Failure { kind: FailureKind },
}

/// Record of how the most recent match request ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settlement {
    pub request_id: Uuid,
    #[serde(flatten)]
    pub outcome: Outcome,
    pub settled_at: DateTime<Utc>,
}

/// Commands the hosting UI sends to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    SetFilter(CategoryFilter),
    Select(Option<String>),
    StartMatch,
    SettleSuccess(MatchSet),
    SettleFailure(FailureKind),
}

/// What a successful `apply` changed.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    FilterChanged(CategoryFilter),
    SelectionChanged(Option<String>),
    Started { request_id: Uuid },
    Settled(Settlement),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("A match request is already in flight")]
    AlreadyInFlight,

    #[error("No match request is in flight")]
    NotInFlight,
}

#[derive(Debug, Clone, Default)]
pub struct MatchController {
    lifecycle: Lifecycle,
    matches: MatchSet,
    filter: CategoryFilter,
    has_matched: bool,
    selected: Option<String>,
    last_settlement: Option<Settlement>,
}

impl MatchController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, intent: Intent) -> Result<Transition, TransitionError> {
        match intent {
            Intent::SetFilter(filter) => Ok(self.set_filter(filter)),
            Intent::Select(id) => Ok(self.select(id)),
            Intent::StartMatch => self.start(),
            Intent::SettleSuccess(matches) => {
                let outcome = Outcome::Success {
                    matched: matches.len(),
                };
                let settlement = self.settle(outcome)?;
                self.matches = matches;
                self.has_matched = true;
                // Show every newly matched item, whatever was filtered before.
                self.filter = CategoryFilter::All;
                info!(
                    request_id = %settlement.request_id,
                    matched = self.matches.len(),
                    "Smart match settled"
                );
                Ok(Transition::Settled(settlement))
            }
            Intent::SettleFailure(kind) => {
                let settlement = self.settle(Outcome::Failure { kind })?;
                self.matches = MatchSet::empty();
                warn!(
                    request_id = %settlement.request_id,
                    kind = ?kind,
                    "Smart match failed; showing unranked catalog"
                );
                Ok(Transition::Settled(settlement))
            }
        }
    }

    /// Filter changes are valid in every lifecycle phase.
    pub fn set_filter(&mut self, filter: CategoryFilter) -> Transition {
        debug!(filter = %filter, "Category filter changed");
        self.filter = filter;
        Transition::FilterChanged(filter)
    }

    pub fn select(&mut self, id: Option<String>) -> Transition {
        self.selected = id.clone();
        Transition::SelectionChanged(id)
    }

    fn start(&mut self) -> Result<Transition, TransitionError> {
        if self.lifecycle.is_in_flight() {
            return Err(TransitionError::AlreadyInFlight);
        }
        let request_id = Uuid::new_v4();
        self.lifecycle = Lifecycle::InFlight {
            request_id,
            started_at: Utc::now(),
        };
        info!(request_id = %request_id, "Smart match started");
        Ok(Transition::Started { request_id })
    }

    fn settle(&mut self, outcome: Outcome) -> Result<Settlement, TransitionError> {
        let request_id = match self.lifecycle {
            Lifecycle::InFlight { request_id, .. } => request_id,
            Lifecycle::Idle => return Err(TransitionError::NotInFlight),
        };
        let settlement = Settlement {
            request_id,
            outcome,
            settled_at: Utc::now(),
        };
        self.lifecycle = Lifecycle::Idle;
        self.last_settlement = Some(settlement.clone());
        Ok(settlement)
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn matches(&self) -> &MatchSet {
        &self.matches
    }

    pub fn filter(&self) -> CategoryFilter {
        self.filter
    }

    pub fn has_matched(&self) -> bool {
        self.has_matched
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn last_settlement(&self) -> Option<&Settlement> {
        self.last_settlement.as_ref()
    }

    /// Filtered catalog in display order under the current match set.
    pub fn display_order<'a>(&self, catalog: &'a Catalog) -> Vec<&'a Opportunity> {
        sort_for_display(catalog.opportunities(), &self.matches, self.filter)
    }

    pub fn snapshot(&self, catalog: &Catalog) -> DisplaySnapshot {
        let opportunities = self
            .display_order(catalog)
            .into_iter()
            .map(|o| DisplayCard::new(o, self.matches.get(&o.id)))
            .collect();

        DisplaySnapshot {
            lifecycle: self.lifecycle.clone(),
            filter: self.filter,
            has_matched: self.has_matched,
            match_count: self.matches.len(),
            selected_id: self.selected.clone(),
            opportunities,
        }
    }

    /// One opportunity with its match annotation, regardless of the filter.
    pub fn detail(&self, catalog: &Catalog, id: &str) -> Option<DisplayCard> {
        catalog
            .get(id)
            .map(|o| DisplayCard::new(o, self.matches.get(&o.id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::seed_catalog;
    use crate::matching::merger::AIMatchResult;
    use crate::models::opportunity::Category;

    fn m(id: &str, score: f64) -> AIMatchResult {
        AIMatchResult {
            opportunity_id: id.to_string(),
            score,
            reason: "fits".to_string(),
        }
    }

    fn ids(catalog: &Catalog, controller: &MatchController) -> Vec<String> {
        controller
            .display_order(catalog)
            .iter()
            .map(|o| o.id.clone())
            .collect()
    }

    #[test]
    fn test_initial_state_is_idle_and_unranked() {
        let catalog = seed_catalog();
        let controller = MatchController::new();
        assert_eq!(controller.lifecycle(), &Lifecycle::Idle);
        assert!(controller.matches().is_empty());
        assert!(!controller.has_matched());
        assert_eq!(ids(&catalog, &controller), vec!["1", "2", "3", "4", "5", "6", "7"]);
    }

    #[test]
    fn test_start_then_success_returns_to_idle() {
        let mut controller = MatchController::new();
        let Transition::Started { request_id } = controller.apply(Intent::StartMatch).unwrap() else {
            panic!("expected Started");
        };
        assert!(controller.lifecycle().is_in_flight());

        let settled = controller
            .apply(Intent::SettleSuccess(MatchSet::new(vec![m("2", 70.0)])))
            .unwrap();
        let Transition::Settled(settlement) = settled else {
            panic!("expected Settled");
        };
        assert_eq!(settlement.request_id, request_id);
        assert_eq!(settlement.outcome, Outcome::Success { matched: 1 });
        assert_eq!(controller.lifecycle(), &Lifecycle::Idle);
        assert!(controller.has_matched());
        assert_eq!(controller.last_settlement(), Some(&settlement));
    }

    #[test]
    fn test_double_start_is_rejected() {
        let mut controller = MatchController::new();
        controller.apply(Intent::StartMatch).unwrap();
        assert_eq!(
            controller.apply(Intent::StartMatch),
            Err(TransitionError::AlreadyInFlight)
        );
        assert!(controller.lifecycle().is_in_flight());
    }

    #[test]
    fn test_settle_without_start_is_rejected() {
        let mut controller = MatchController::new();
        assert_eq!(
            controller.apply(Intent::SettleFailure(FailureKind::Transport)),
            Err(TransitionError::NotInFlight)
        );
        assert_eq!(
            controller.apply(Intent::SettleSuccess(MatchSet::empty())),
            Err(TransitionError::NotInFlight)
        );
    }

    #[test]
    fn test_success_resets_filter_to_all() {
        let mut controller = MatchController::new();
        controller
            .apply(Intent::SetFilter(CategoryFilter::Only(Category::Health)))
            .unwrap();
        controller.apply(Intent::StartMatch).unwrap();
        controller
            .apply(Intent::SettleSuccess(MatchSet::empty()))
            .unwrap();
        assert_eq!(controller.filter(), CategoryFilter::All);
    }

    #[test]
    fn test_success_replaces_match_set_wholesale() {
        let mut controller = MatchController::new();
        controller.apply(Intent::StartMatch).unwrap();
        controller
            .apply(Intent::SettleSuccess(MatchSet::new(vec![m("1", 90.0), m("2", 80.0)])))
            .unwrap();
        controller.apply(Intent::StartMatch).unwrap();
        controller
            .apply(Intent::SettleSuccess(MatchSet::new(vec![m("3", 60.0)])))
            .unwrap();

        assert_eq!(controller.matches().len(), 1);
        assert!(controller.matches().get("1").is_none());
    }

    #[test]
    fn test_failure_clears_matches_and_restores_catalog_order() {
        let catalog = seed_catalog();
        let mut controller = MatchController::new();
        controller.apply(Intent::StartMatch).unwrap();
        controller
            .apply(Intent::SettleSuccess(MatchSet::new(vec![m("7", 95.0)])))
            .unwrap();
        assert_eq!(ids(&catalog, &controller)[0], "7");

        controller.apply(Intent::StartMatch).unwrap();
        controller
            .apply(Intent::SettleFailure(FailureKind::Transport))
            .unwrap();

        assert!(controller.matches().is_empty());
        assert_eq!(controller.lifecycle(), &Lifecycle::Idle);
        assert_eq!(ids(&catalog, &controller), vec!["1", "2", "3", "4", "5", "6", "7"]);
        assert_eq!(
            controller.last_settlement().unwrap().outcome,
            Outcome::Failure {
                kind: FailureKind::Transport
            }
        );
    }

    #[test]
    fn test_failure_keeps_current_filter() {
        let mut controller = MatchController::new();
        let education = CategoryFilter::Only(Category::Education);
        controller.apply(Intent::SetFilter(education)).unwrap();
        controller.apply(Intent::StartMatch).unwrap();
        controller
            .apply(Intent::SettleFailure(FailureKind::Configuration))
            .unwrap();
        assert_eq!(controller.filter(), education);
    }

    #[test]
    fn test_filter_change_allowed_while_in_flight() {
        let mut controller = MatchController::new();
        controller.apply(Intent::StartMatch).unwrap();
        let transition = controller
            .apply(Intent::SetFilter(CategoryFilter::Only(Category::Arts)))
            .unwrap();
        assert_eq!(
            transition,
            Transition::FilterChanged(CategoryFilter::Only(Category::Arts))
        );
        assert!(controller.lifecycle().is_in_flight());
    }

    #[test]
    fn test_filter_and_selection_apply_in_every_phase() {
        let mut controller = MatchController::new();
        controller.apply(Intent::StartMatch).unwrap();

        let health = CategoryFilter::Only(Category::Health);
        assert_eq!(controller.set_filter(health), Transition::FilterChanged(health));
        assert_eq!(
            controller.select(Some("6".to_string())),
            Transition::SelectionChanged(Some("6".to_string()))
        );
        assert_eq!(controller.filter(), health);
        assert_eq!(controller.selected(), Some("6"));
        assert!(controller.lifecycle().is_in_flight());
    }

    #[test]
    fn test_filter_over_prior_matches_sorts_by_existing_scores() {
        let catalog = seed_catalog();
        let mut controller = MatchController::new();
        controller.apply(Intent::StartMatch).unwrap();
        controller
            .apply(Intent::SettleSuccess(MatchSet::new(vec![
                m("1", 95.0),
                m("2", 60.0),
                m("3", 88.0),
            ])))
            .unwrap();
        controller
            .apply(Intent::SetFilter(CategoryFilter::Only(Category::Education)))
            .unwrap();
        assert_eq!(ids(&catalog, &controller), vec!["2"]);
    }

    #[test]
    fn test_snapshot_annotates_matches() {
        let catalog = seed_catalog();
        let mut controller = MatchController::new();
        controller.apply(Intent::StartMatch).unwrap();
        controller
            .apply(Intent::SettleSuccess(MatchSet::new(vec![m("4", 85.0), m("1", 40.0)])))
            .unwrap();

        let snapshot = controller.snapshot(&catalog);
        assert_eq!(snapshot.match_count, 2);
        assert!(snapshot.has_matched);
        assert_eq!(snapshot.opportunities.len(), 7);
        assert_eq!(snapshot.opportunities[0].opportunity.id, "4");
        assert!(snapshot.opportunities[0].is_high_match);
        assert_eq!(snapshot.opportunities[1].opportunity.id, "1");
        assert!(!snapshot.opportunities[1].is_high_match);
        assert!(snapshot.opportunities[2].match_result.is_none());
        for card in &snapshot.opportunities {
            assert!(card.opportunity.spots_filled <= card.opportunity.spots_total);
        }
    }

    #[test]
    fn test_detail_ignores_filter_and_unknown_id() {
        let catalog = seed_catalog();
        let mut controller = MatchController::new();
        controller
            .apply(Intent::SetFilter(CategoryFilter::Only(Category::Arts)))
            .unwrap();
        assert_eq!(controller.detail(&catalog, "2").unwrap().opportunity.id, "2");
        assert!(controller.detail(&catalog, "nope").is_none());
    }

    #[test]
    fn test_select_records_selection() {
        let mut controller = MatchController::new();
        controller.apply(Intent::Select(Some("5".to_string()))).unwrap();
        assert_eq!(controller.selected(), Some("5"));
        controller.apply(Intent::Select(None)).unwrap();
        assert_eq!(controller.selected(), None);
    }
}
