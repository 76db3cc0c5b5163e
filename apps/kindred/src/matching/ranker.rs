//! Match Ranker — pluggable, trait-based boundary to the external inference service.
//!
//! Default: `GeminiRanker` (one structured-output call per match request).
//! Tests swap in stub rankers without touching the service or handlers.
//!
//! `AppState` holds an `Arc<dyn MatchRanker>` via `MatchService`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::llm_client::{LlmClient, LlmError};
use crate::matching::merger::MatchSet;
use crate::matching::request_builder::MatchRequest;
use crate::matching::response::{parse_match_set, SchemaError};

/// Failures that settle a match request as failed. All of them resolve to an
/// empty match set; none is shown to the end user.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("No API credential configured; skipping inference call")]
    Configuration,

    #[error("Inference call failed: {0}")]
    Transport(#[source] LlmError),

    #[error("Unusable inference response: {0}")]
    Schema(#[from] SchemaError),
}

impl From<LlmError> for MatchError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::EmptyContent => MatchError::Schema(SchemaError::Empty),
            other => MatchError::Transport(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Configuration,
    Transport,
    Schema,
}

impl MatchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            MatchError::Configuration => FailureKind::Configuration,
            MatchError::Transport(_) => FailureKind::Transport,
            MatchError::Schema(_) => FailureKind::Schema,
        }
    }
}

/// The ranking trait. Implement this to swap backends without touching the
/// controller, service, or handler code.
#[async_trait]
pub trait MatchRanker: Send + Sync {
    async fn rank(&self, request: &MatchRequest) -> Result<MatchSet, MatchError>;
}

// ────────────────────────────────────────────────────────────────────────────
// GeminiRanker — default implementation
// ────────────────────────────────────────────────────────────────────────────

/// Ranks via Gemini structured output. Without a credential it never touches
/// the network and fails with `MatchError::Configuration`.
pub struct GeminiRanker {
    llm: Option<LlmClient>,
}

impl GeminiRanker {
    pub fn new(llm: Option<LlmClient>) -> Self {
        Self { llm }
    }

    /// Builds a ranker from an optional key; blank keys count as absent.
    pub fn from_api_key(api_key: Option<String>, timeout: Duration) -> Self {
        let llm = api_key
            .filter(|k| !k.trim().is_empty())
            .map(|k| LlmClient::new(k, timeout));
        if llm.is_none() {
            warn!("No Gemini API key found; smart matching will return empty matches");
        }
        Self::new(llm)
    }

    pub fn has_credential(&self) -> bool {
        self.llm.is_some()
    }
}

#[async_trait]
impl MatchRanker for GeminiRanker {
    async fn rank(&self, request: &MatchRequest) -> Result<MatchSet, MatchError> {
        let llm = self.llm.as_ref().ok_or(MatchError::Configuration)?;

        debug!(
            candidates = request.candidate_count,
            prompt_chars = request.prompt.len(),
            "Sending smart-match request"
        );

        let text = llm
            .call_structured(&request.prompt, &request.system, &request.response_schema)
            .await?;

        Ok(parse_match_set(&text)?)
    }
}
