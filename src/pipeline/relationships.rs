//! Relationship inference stage

use super::prompts;
use super::state::{ResearchState, StateUpdate};
use crate::canon::Normalizer;
use crate::graph::{union_citations, validate_relationships, Citation, RelationType, Relationship};
use crate::oracle::payload::{decode, RelationshipPayload, RelationshipRecord};
use crate::oracle::{OracleError, OracleRequest, StructuredOracle};
use crate::search::SearchResult;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Search results passed as context.
const CONTEXT_RESULTS: usize = 10;

const DEFAULT_CONFIDENCE: f64 = 0.8;

pub struct RelationshipInferrer {
    oracle: Arc<dyn StructuredOracle>,
    temperature: f32,
    timeout: Duration,
}

impl RelationshipInferrer {
    pub fn new(oracle: Arc<dyn StructuredOracle>, temperature: f32, timeout: Duration) -> Self {
        Self {
            oracle,
            temperature,
            timeout,
        }
    }

    async fn infer(&self, state: &ResearchState) -> Result<Vec<RelationshipRecord>, OracleError> {
        let context_len = state.search_results.len().min(CONTEXT_RESULTS);
        let request = OracleRequest::new(
            prompts::relationship_system(),
            prompts::relationship_user(
                &state.concepts,
                &prompts::format_results(&state.search_results[..context_len]),
            ),
            self.temperature,
        );
        let text = tokio::time::timeout(self.timeout, self.oracle.generate(&request))
            .await
            .map_err(|_| OracleError::Timeout(self.timeout))??;
        Ok(decode::<RelationshipPayload>(&text)?.relationships)
    }

    pub async fn run(&self, state: &ResearchState, normalizer: &mut Normalizer) -> StateUpdate {
        if state.concepts.is_empty() {
            info!("no concepts, skipping relationship inference");
            return StateUpdate::default();
        }
        info!(concepts = state.concepts.len(), "inferring relationships");

        let records = match self.infer(state).await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "relationship inference failed");
                return StateUpdate::new().error(format!("Relationship inference failed: {}", e));
            }
        };

        let relationships: Vec<Relationship> = records
            .into_iter()
            .filter_map(|record| to_relationship(record, &state.search_results, normalizer))
            .collect();

        for issue in validate_relationships(&relationships, &state.concepts) {
            debug!(issue = %issue, "relationship validation");
        }
        info!(count = relationships.len(), "inferred relationships");

        StateUpdate {
            relationships,
            ..StateUpdate::default()
        }
    }
}

/// Convert a record, canonicalizing both endpoints. Records with an empty
/// endpoint are dropped.
fn to_relationship(
    record: RelationshipRecord,
    results: &[SearchResult],
    normalizer: &mut Normalizer,
) -> Option<Relationship> {
    let source = normalizer.normalize(&record.source);
    let target = normalizer.normalize(&record.target);
    if source.is_empty() || target.is_empty() {
        warn!(source = %record.source, target = %record.target, "dropping relationship with empty endpoint");
        return None;
    }

    let mut relationship = Relationship::new(source, RelationType::from_tag(&record.relation_type), target)
        .with_confidence(record.confidence.unwrap_or(DEFAULT_CONFIDENCE));
    relationship.is_inferred = record.is_inferred.unwrap_or(true);
    relationship.description = record
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    let cited = record
        .source_urls
        .unwrap_or_default()
        .into_iter()
        .filter_map(|url| results.iter().find(|r| r.url == url).map(Citation::from));
    union_citations(&mut relationship.citations, cited);
    Some(relationship)
}
