// All LLM prompt constants for the Matching module.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System instruction for smart matching. The JSON-only fragment is appended
/// by the request builder.
pub const MATCH_SYSTEM: &str = "You are an expert volunteer coordinator. \
    You match volunteers with local opportunities where their skills, interests \
    and availability will make the most difference.";

/// Smart-match prompt template.
/// Replace: {bio}, {interests}, {availability}, {skills}, {opportunities_json}, {top_n}
pub const MATCH_PROMPT_TEMPLATE: &str = r#"User Profile:
- Bio: {bio}
- Interests: {interests}
- Availability: {availability}
- Skills: {skills}

Available Opportunities:
{opportunities_json}

Task:
Analyze the user profile and the list of opportunities.
Select the top {top_n} best matches for this user.
Return a score (0-100) and a short, encouraging reason why it's a good fit.
If no good matches, return the best possible ones with lower scores rather than an empty list.

Return a JSON ARRAY of objects with EXACTLY these fields:
[
  {"opportunityId": "the exact id from the list above", "score": 87, "reason": "One or two sentences."}
]"#;
