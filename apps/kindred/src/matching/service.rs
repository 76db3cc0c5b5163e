//! Match Service — drives one smart-match request end to end.
//!
//! Pipeline: StartMatch → build request → rank (suspend point) → settle.
//! The controller lock is taken only around each transition and never held
//! across the inference call, so reads stay live while a request is in flight.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tracing::{error, warn};

use crate::catalog::Catalog;
use crate::matching::controller::{
    Intent, Lifecycle, MatchController, Settlement, Transition, TransitionError,
};
use crate::matching::display::{DisplayCard, DisplaySnapshot};
use crate::matching::merger::{AIMatchResult, CategoryFilter};
use crate::matching::ranker::{FailureKind, MatchRanker};
use crate::matching::request_builder::build_match_request;
use crate::models::profile::UserProfile;

/// Match state as reported by `GET /api/v1/matches`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOverview {
    pub lifecycle: Lifecycle,
    pub has_matched: bool,
    /// Current match set, highest score first.
    pub matches: Vec<AIMatchResult>,
    pub last_settlement: Option<Settlement>,
}

#[derive(Clone)]
pub struct MatchService {
    catalog: Arc<Catalog>,
    profile: Arc<UserProfile>,
    ranker: Arc<dyn MatchRanker>,
    controller: Arc<Mutex<MatchController>>,
}

impl MatchService {
    pub fn new(catalog: Arc<Catalog>, profile: Arc<UserProfile>, ranker: Arc<dyn MatchRanker>) -> Self {
        Self {
            catalog,
            profile,
            ranker,
            controller: Arc::new(Mutex::new(MatchController::new())),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// Runs one match request to completion.
    ///
    /// Fails only with `AlreadyInFlight`. Ranking failures settle the request
    /// as failed (empty matches, unranked display) and are returned as an
    /// ordinary `Settlement`.
    ///
    /// Ranking and settling run on a spawned task, so the request still
    /// settles if this future is dropped mid-flight.
    pub async fn run_match(&self) -> Result<Settlement, TransitionError> {
        self.controller().apply(Intent::StartMatch)?;

        let service = self.clone();
        let task = tokio::spawn(async move { service.rank_and_settle().await });

        match task.await {
            Ok(settled) => settled,
            Err(e) => {
                error!(error = %e, "Match task ended before settling");
                self.settle(Intent::SettleFailure(FailureKind::Transport))
            }
        }
    }

    async fn rank_and_settle(&self) -> Result<Settlement, TransitionError> {
        let request = build_match_request(&self.profile, self.catalog.opportunities());

        let intent = match self.ranker.rank(&request).await {
            Ok(matches) => Intent::SettleSuccess(matches),
            Err(e) => {
                warn!(error = %e, "Error fetching smart matches");
                Intent::SettleFailure(e.kind())
            }
        };

        self.settle(intent)
    }

    fn settle(&self, intent: Intent) -> Result<Settlement, TransitionError> {
        match self.controller().apply(intent)? {
            Transition::Settled(settlement) => Ok(settlement),
            // Settle intents only ever produce `Settled`.
            _ => Err(TransitionError::NotInFlight),
        }
    }

    pub fn snapshot(&self) -> DisplaySnapshot {
        self.controller().snapshot(&self.catalog)
    }

    pub fn set_filter(&self, filter: CategoryFilter) -> DisplaySnapshot {
        let mut controller = self.controller();
        controller.set_filter(filter);
        controller.snapshot(&self.catalog)
    }

    /// Selects an opportunity for the detail view. Unknown ids leave the
    /// selection unchanged.
    pub fn select(&self, id: &str) -> Option<DisplayCard> {
        let mut controller = self.controller();
        let card = controller.detail(&self.catalog, id)?;
        controller.select(Some(id.to_string()));
        Some(card)
    }

    pub fn overview(&self) -> MatchOverview {
        let controller = self.controller();
        MatchOverview {
            lifecycle: controller.lifecycle().clone(),
            has_matched: controller.has_matched(),
            matches: controller.matches().ranked().into_iter().cloned().collect(),
            last_settlement: controller.last_settlement().cloned(),
        }
    }

    fn controller(&self) -> MutexGuard<'_, MatchController> {
        // Transitions never panic midway, so a poisoned lock still holds a
        // consistent controller.
        self.controller
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;

    use crate::catalog::{seed_catalog, seed_profile};
    use crate::llm_client::LlmError;
    use crate::matching::controller::Outcome;
    use crate::matching::merger::MatchSet;
    use crate::matching::ranker::{GeminiRanker, MatchError};
    use crate::matching::request_builder::MatchRequest;
    use crate::matching::response::parse_match_set;
    use crate::models::opportunity::Category;

    /// Replies with fixed response text, as the inference service would.
    struct ScriptedRanker(&'static str);

    #[async_trait]
    impl MatchRanker for ScriptedRanker {
        async fn rank(&self, _request: &MatchRequest) -> Result<MatchSet, MatchError> {
            Ok(parse_match_set(self.0)?)
        }
    }

    struct FailingRanker;

    #[async_trait]
    impl MatchRanker for FailingRanker {
        async fn rank(&self, _request: &MatchRequest) -> Result<MatchSet, MatchError> {
            Err(LlmError::Api {
                status: 503,
                message: "unavailable".to_string(),
            }
            .into())
        }
    }

    /// Takes a while to answer so the in-flight phase is observable.
    struct SlowRanker;

    #[async_trait]
    impl MatchRanker for SlowRanker {
        async fn rank(&self, _request: &MatchRequest) -> Result<MatchSet, MatchError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(MatchSet::empty())
        }
    }

    fn service(ranker: impl MatchRanker + 'static) -> MatchService {
        MatchService::new(
            Arc::new(seed_catalog()),
            Arc::new(seed_profile()),
            Arc::new(ranker),
        )
    }

    fn display_ids(service: &MatchService) -> Vec<String> {
        service
            .snapshot()
            .opportunities
            .into_iter()
            .map(|c| c.opportunity.id)
            .collect()
    }

    #[tokio::test]
    async fn test_successful_match_ranks_display() {
        let service = service(ScriptedRanker(
            r#"[{"opportunityId":"3","score":40,"reason":"r"},{"opportunityId":"1","score":90,"reason":"r"}]"#,
        ));
        let settlement = service.run_match().await.unwrap();

        assert_eq!(settlement.outcome, Outcome::Success { matched: 2 });
        assert_eq!(display_ids(&service), vec!["1", "3", "2", "4", "5", "6", "7"]);
        assert_eq!(service.snapshot().lifecycle, Lifecycle::Idle);
    }

    #[tokio::test]
    async fn test_transport_failure_falls_back_to_catalog_order() {
        let service = service(FailingRanker);
        let settlement = service.run_match().await.unwrap();

        assert_eq!(
            settlement.outcome,
            Outcome::Failure {
                kind: FailureKind::Transport
            }
        );
        let overview = service.overview();
        assert!(overview.matches.is_empty());
        assert!(!overview.has_matched);
        assert_eq!(overview.lifecycle, Lifecycle::Idle);
        assert_eq!(display_ids(&service), vec!["1", "2", "3", "4", "5", "6", "7"]);
    }

    #[tokio::test]
    async fn test_missing_credential_falls_back_to_catalog_order() {
        let service = service(GeminiRanker::new(None));
        let settlement = service.run_match().await.unwrap();

        assert_eq!(
            settlement.outcome,
            Outcome::Failure {
                kind: FailureKind::Configuration
            }
        );
        assert!(service.overview().matches.is_empty());
        assert_eq!(display_ids(&service), vec!["1", "2", "3", "4", "5", "6", "7"]);
    }

    #[tokio::test]
    async fn test_unparseable_response_is_schema_failure() {
        let service = service(ScriptedRanker("Sorry, I cannot help with that."));
        let settlement = service.run_match().await.unwrap();
        assert_eq!(
            settlement.outcome,
            Outcome::Failure {
                kind: FailureKind::Schema
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_ids_in_response_are_ignored() {
        let service = service(ScriptedRanker(
            r#"[{"opportunityId":"Z","score":99,"reason":"ghost"}]"#,
        ));
        service.run_match().await.unwrap();
        assert_eq!(display_ids(&service), vec!["1", "2", "3", "4", "5", "6", "7"]);
        assert_eq!(service.overview().matches.len(), 1);
    }

    #[tokio::test]
    async fn test_success_resets_filter() {
        let service = service(ScriptedRanker(r#"[{"opportunityId":"6","score":70,"reason":"r"}]"#));
        service.set_filter(CategoryFilter::Only(Category::Health));
        service.run_match().await.unwrap();
        let snapshot = service.snapshot();
        assert_eq!(snapshot.filter, CategoryFilter::All);
        assert_eq!(snapshot.opportunities[0].opportunity.id, "6");
    }

    #[tokio::test]
    async fn test_filter_after_match_keeps_scores() {
        let service = service(ScriptedRanker(
            r#"[{"opportunityId":"1","score":95,"reason":"r"},{"opportunityId":"4","score":60,"reason":"r"},{"opportunityId":"2","score":75,"reason":"r"}]"#,
        ));
        service.run_match().await.unwrap();

        let snapshot = service.set_filter(CategoryFilter::Only(Category::Environment));
        let ids: Vec<&str> = snapshot
            .opportunities
            .iter()
            .map(|c| c.opportunity.id.as_str())
            .collect();
        assert_eq!(ids, vec!["1", "4"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_match_rejected_while_in_flight() {
        let service = service(SlowRanker);
        let background = service.clone();
        let first = tokio::spawn(async move { background.run_match().await });

        // Let the spawned task reach the suspend point.
        while !service.snapshot().lifecycle.is_in_flight() {
            tokio::task::yield_now().await;
        }
        assert_eq!(
            service.run_match().await.unwrap_err(),
            TransitionError::AlreadyInFlight
        );

        let settlement = first.await.unwrap().unwrap();
        assert_eq!(settlement.outcome, Outcome::Success { matched: 0 });
        assert_eq!(service.snapshot().lifecycle, Lifecycle::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_caller_still_settles() {
        let service = service(SlowRanker);
        let background = service.clone();
        let caller = tokio::spawn(async move { background.run_match().await });

        while !service.snapshot().lifecycle.is_in_flight() {
            tokio::task::yield_now().await;
        }
        caller.abort();
        assert!(caller.await.unwrap_err().is_cancelled());

        // The ranker answers after 5s; the detached task settles on its own.
        tokio::time::sleep(Duration::from_secs(60)).await;

        let overview = service.overview();
        assert_eq!(overview.lifecycle, Lifecycle::Idle);
        assert_eq!(
            overview.last_settlement.map(|s| s.outcome),
            Some(Outcome::Success { matched: 0 })
        );

        let next = service.run_match().await.unwrap();
        assert_eq!(next.outcome, Outcome::Success { matched: 0 });
    }

    #[tokio::test]
    async fn test_select_known_and_unknown_ids() {
        let service = service(FailingRanker);
        assert_eq!(service.select("5").unwrap().opportunity.id, "5");
        assert!(service.select("missing").is_none());
        assert_eq!(service.snapshot().selected_id.as_deref(), Some("5"));
    }
}
