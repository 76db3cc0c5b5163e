pub mod health;

use axum::{
    routing::{get, put},
    Router,
};

use crate::matching::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/profile", get(handlers::handle_get_profile))
        .route(
            "/api/v1/opportunities",
            get(handlers::handle_list_opportunities),
        )
        .route(
            "/api/v1/opportunities/:id",
            get(handlers::handle_get_opportunity),
        )
        .route("/api/v1/filter", put(handlers::handle_set_filter))
        .route(
            "/api/v1/matches",
            get(handlers::handle_get_matches).post(handlers::handle_run_match),
        )
        .with_state(state)
}
