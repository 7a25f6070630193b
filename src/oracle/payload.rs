//! Typed oracle payloads and the fail-closed decode step
//!
//! Oracle responses are JSON, sometimes wrapped in a markdown code fence.
//! `decode` strips the fence, then deserializes into a strict payload type:
//! missing required fields are a `Parse` error, optional fields default.

use super::OracleError;
use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Response of the query-generation call.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct QueryPayload {
    pub queries: Vec<String>,
}

/// Response of an extraction or enrichment call.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ExtractionPayload {
    pub concepts: Vec<ConceptRecord>,
}

/// One candidate concept as the oracle reports it.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ConceptRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub concept_type: String,
    pub description: String,
    pub relevance_score: f64,
    #[serde(default)]
    pub aliases: Option<Vec<String>>,
    #[serde(default)]
    pub technical_details: Option<String>,
    #[serde(default)]
    pub key_components: Option<Vec<String>>,
    #[serde(default)]
    pub implementation_notes: Option<String>,
    #[serde(default)]
    pub use_cases: Option<Vec<String>>,
}

/// Response of the relationship-inference call.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RelationshipPayload {
    pub relationships: Vec<RelationshipRecord>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RelationshipRecord {
    pub source: String,
    pub relation_type: String,
    pub target: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_inferred: Option<bool>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub source_urls: Option<Vec<String>>,
}

/// Remove a surrounding ```json / ``` fence, if any.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") up to the first newline.
    let body = match rest.find('\n') {
        Some(nl) => &rest[nl + 1..],
        None => rest.trim_start_matches("json"),
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Decode an oracle response into `T`.
///
/// Tries the fence-stripped text first, then the span from the first `{` to
/// the last `}` for responses with prose around the JSON.
pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T, OracleError> {
    let body = strip_code_fences(text);
    let first_err = match serde_json::from_str::<T>(body) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    if let (Some(start), Some(end)) = (body.find('{'), body.rfind('}')) {
        if start < end && (start > 0 || end + 1 < body.len()) {
            if let Ok(value) = serde_json::from_str::<T>(&body[start..=end]) {
                return Ok(value);
            }
        }
    }

    let preview: String = body.chars().take(200).collect();
    Err(OracleError::Parse(format!("{} in: {}", first_err, preview)))
}

/// Pretty-printed JSON schema for `T`, appended to system prompts.
pub fn schema_hint<T: JsonSchema>() -> String {
    let schema = schema_for!(T);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fence() {
        let text = "```json\n{\"queries\": [\"a\"]}\n```";
        assert_eq!(strip_code_fences(text), "{\"queries\": [\"a\"]}");
    }

    #[test]
    fn strips_bare_fence() {
        let text = "  ```\n{\"queries\": []}\n```  ";
        assert_eq!(strip_code_fences(text), "{\"queries\": []}");
    }

    #[test]
    fn unfenced_text_is_untouched() {
        assert_eq!(strip_code_fences(" {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn decodes_fenced_extraction_with_optional_defaults() {
        let text = r#"```json
{"concepts": [{"name": "GNN", "type": "method", "description": "graphs", "relevance_score": 0.9}]}
```"#;
        let payload: ExtractionPayload = decode(text).unwrap();
        let record = &payload.concepts[0];
        assert_eq!(record.name, "GNN");
        assert_eq!(record.concept_type, "method");
        assert!(record.aliases.is_none());
        assert!(record.key_components.is_none());
    }

    #[test]
    fn null_optional_lists_are_accepted() {
        let text = r#"{"concepts": [{"name": "GNN", "type": "method", "description": "d",
            "relevance_score": 0.9, "aliases": null, "use_cases": null}]}"#;
        let payload: ExtractionPayload = decode(text).unwrap();
        assert!(payload.concepts[0].aliases.is_none());
    }

    #[test]
    fn missing_required_field_fails_closed() {
        let text = r#"{"concepts": [{"name": "GNN", "description": "no type", "relevance_score": 0.9}]}"#;
        let err = decode::<ExtractionPayload>(text).unwrap_err();
        assert!(matches!(err, OracleError::Parse(msg) if msg.contains("type")));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = decode::<QueryPayload>("not json at all").unwrap_err();
        assert!(matches!(err, OracleError::Parse(_)));
    }

    #[test]
    fn json_surrounded_by_prose_is_recovered() {
        let text = "Here you go: {\"queries\": [\"gnn survey\"]} hope it helps";
        let payload: QueryPayload = decode(text).unwrap();
        assert_eq!(payload.queries, vec!["gnn survey"]);
    }

    #[test]
    fn relationship_record_optionals_default_to_none() {
        let text = r#"{"relationships": [{"source": "A", "relation_type": "uses", "target": "B"}]}"#;
        let payload: RelationshipPayload = decode(text).unwrap();
        let record = &payload.relationships[0];
        assert!(record.is_inferred.is_none());
        assert!(record.confidence.is_none());
        assert!(record.source_urls.is_none());
    }

    #[test]
    fn schema_hint_names_required_fields() {
        let hint = schema_hint::<QueryPayload>();
        assert!(hint.contains("queries"));
    }
}
