use crate::matching::service::MatchService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Catalog, profile, ranker and the match controller behind one handle.
    pub matcher: MatchService,
}
