//! Match Request Builder — shapes a user profile and the catalog into one
//! token-bounded smart-match request plus the response schema contract.
//!
//! Pure: identical inputs always produce an identical `MatchRequest`.

use serde::Serialize;
use serde_json::{json, Value};

use crate::llm_client::prompts::{join_labels, JSON_ONLY_SYSTEM};
use crate::matching::prompts::{MATCH_PROMPT_TEMPLATE, MATCH_SYSTEM};
use crate::models::opportunity::{Availability, Category, Opportunity};
use crate::models::profile::UserProfile;

/// Number of picks the model is asked for. The response is not trusted to honour it.
pub const TOP_N: usize = 3;

/// Size-reduced view of an opportunity: only the fields relevant to matching.
/// Organization, imagery and capacity are left out to bound the prompt size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateSummary<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub category: Category,
    pub availability: Availability,
    pub skills: &'a [String],
    pub description: &'a str,
}

impl<'a> From<&'a Opportunity> for CandidateSummary<'a> {
    fn from(o: &'a Opportunity) -> Self {
        Self {
            id: &o.id,
            title: &o.title,
            category: o.category,
            availability: o.availability,
            skills: &o.skills,
            description: &o.description,
        }
    }
}

/// Profile fields rendered into the prompt. The name is not sent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileSummary {
    pub bio: String,
    pub interests: String,
    pub availability: String,
    pub skills: String,
}

impl From<&UserProfile> for ProfileSummary {
    fn from(p: &UserProfile) -> Self {
        Self {
            bio: p.bio.clone(),
            interests: join_labels(p.interests.iter().map(|c| c.label())),
            availability: join_labels(p.availability.iter().map(|a| a.label())),
            skills: join_labels(&p.skills),
        }
    }
}

/// Everything needed for one call to the inference service.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRequest {
    pub system: String,
    pub prompt: String,
    pub profile: ProfileSummary,
    /// Candidate list as sent, serialized to JSON.
    pub candidates_json: String,
    pub candidate_count: usize,
    pub response_schema: Value,
}

/// Builds the smart-match request for `profile` over the whole `catalog`.
/// An empty catalog still yields a well-formed request with `[]` candidates.
pub fn build_match_request(profile: &UserProfile, catalog: &[Opportunity]) -> MatchRequest {
    let candidates: Vec<CandidateSummary<'_>> = catalog.iter().map(CandidateSummary::from).collect();
    // Serializing borrowed strings and closed enums cannot fail.
    let candidates_json = serde_json::to_string(&candidates).unwrap_or_else(|_| "[]".to_string());
    let summary = ProfileSummary::from(profile);
    let top_n = TOP_N.to_string();

    let prompt = fill_template(
        MATCH_PROMPT_TEMPLATE,
        &[
            ("bio", summary.bio.as_str()),
            ("interests", summary.interests.as_str()),
            ("availability", summary.availability.as_str()),
            ("skills", summary.skills.as_str()),
            ("opportunities_json", candidates_json.as_str()),
            ("top_n", top_n.as_str()),
        ],
    );

    MatchRequest {
        system: format!("{MATCH_SYSTEM} {JSON_ONLY_SYSTEM}"),
        prompt,
        profile: summary,
        candidate_count: candidates.len(),
        candidates_json,
        response_schema: match_response_schema(),
    }
}

/// JSON Schema for the response: an array of records with exactly
/// `opportunityId`, `score` and `reason`, all required, nothing else allowed.
pub fn match_response_schema() -> Value {
    json!({
        "type": "array",
        "items": {
            "type": "object",
            "properties": {
                "opportunityId": { "type": "string" },
                "score": { "type": "number" },
                "reason": { "type": "string" }
            },
            "required": ["opportunityId", "score", "reason"],
            "additionalProperties": false
        }
    })
}

/// Single-pass `{key}` substitution. Substituted values are never rescanned, so
/// user text containing `{skills}` or similar stays literal.
fn fill_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replaced = after.find('}').and_then(|close| {
            let key = &after[..close];
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v, close))
        });
        match replaced {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
