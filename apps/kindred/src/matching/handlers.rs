//! Axum route handlers for the smart-match display boundary.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::matching::controller::Settlement;
use crate::matching::display::{DisplayCard, DisplaySnapshot};
use crate::matching::merger::CategoryFilter;
use crate::matching::service::MatchOverview;
use crate::models::profile::UserProfile;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SetFilterRequest {
    pub category: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMatchResponse {
    pub settlement: Settlement,
    pub snapshot: DisplaySnapshot,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/profile
pub async fn handle_get_profile(State(state): State<AppState>) -> Json<UserProfile> {
    Json(state.matcher.profile().clone())
}

/// GET /api/v1/opportunities
///
/// Filtered, match-sorted catalog plus lifecycle state.
pub async fn handle_list_opportunities(State(state): State<AppState>) -> Json<DisplaySnapshot> {
    Json(state.matcher.snapshot())
}

/// GET /api/v1/opportunities/:id
///
/// Detail view for one opportunity with its match annotation. Marks it selected.
pub async fn handle_get_opportunity(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DisplayCard>, AppError> {
    state
        .matcher
        .select(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Opportunity {id} not found")))
}

/// PUT /api/v1/filter
///
/// Body: `{"category": "All"}` or any category label, e.g. `"Arts & Culture"`.
pub async fn handle_set_filter(
    State(state): State<AppState>,
    Json(request): Json<SetFilterRequest>,
) -> Result<Json<DisplaySnapshot>, AppError> {
    let filter: CategoryFilter = request
        .category
        .parse()
        .map_err(AppError::Validation)?;

    Ok(Json(state.matcher.set_filter(filter)))
}

/// POST /api/v1/matches
///
/// Runs one smart-match request and returns the settled display. Ranking
/// failures are not errors here: the response carries a failed settlement and
/// the unranked catalog. Returns 409 while another request is in flight.
pub async fn handle_run_match(
    State(state): State<AppState>,
) -> Result<Json<RunMatchResponse>, AppError> {
    let settlement = state.matcher.run_match().await?;

    Ok(Json(RunMatchResponse {
        settlement,
        snapshot: state.matcher.snapshot(),
    }))
}

/// GET /api/v1/matches
pub async fn handle_get_matches(State(state): State<AppState>) -> Json<MatchOverview> {
    Json(state.matcher.overview())
}
