//! Response parsing for smart matching.
//!
//! Only the outer shape is enforced: the text must be a JSON array. Individual
//! entries are read leniently so one malformed pick never discards the rest.

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::llm_client::strip_json_fences;
use crate::matching::merger::{AIMatchResult, MatchSet, UNMATCHED_SCORE};

#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("response is empty")]
    Empty,

    #[error("response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("expected a JSON array of match records, got {0}")]
    NotAnArray(&'static str),
}

/// Parses raw response text into a `MatchSet`, preserving response order.
///
/// Per entry:
/// - not an object, or no string `opportunityId` → dropped
/// - `score` missing, not a number, or outside the `f64` range → `UNMATCHED_SCORE`
/// - `reason` missing or not a string → empty
pub fn parse_match_set(text: &str) -> Result<MatchSet, SchemaError> {
    let text = strip_json_fences(text);
    if text.is_empty() {
        return Err(SchemaError::Empty);
    }

    let value: Value =
        serde_json::from_str(text).map_err(|e| SchemaError::InvalidJson(e.to_string()))?;

    let entries = match value {
        Value::Array(entries) => entries,
        other => return Err(SchemaError::NotAnArray(json_kind(&other))),
    };

    let total = entries.len();
    let results: Vec<AIMatchResult> = entries.iter().filter_map(read_entry).collect();

    if results.len() < total {
        warn!(
            dropped = total - results.len(),
            kept = results.len(),
            "Dropped match entries without a usable opportunityId"
        );
    }

    Ok(MatchSet::new(results))
}

fn read_entry(entry: &Value) -> Option<AIMatchResult> {
    let object = entry.as_object()?;
    let opportunity_id = object.get("opportunityId")?.as_str()?.to_string();
    let score = object
        .get("score")
        .and_then(Value::as_f64)
        .filter(|score| score.is_finite())
        .unwrap_or(UNMATCHED_SCORE);
    let reason = object
        .get("reason")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Some(AIMatchResult {
        opportunity_id,
        score,
        reason,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
