//! Batch extraction orchestrator
//!
//! Splits search results into fixed-size batches and sends one extraction
//! request per batch, all concurrently. Batches are isolated: a failed batch
//! contributes no concepts and one error, its siblings are unaffected.
//!
//! Normalization happens only after every batch has returned, so the
//! normalizer's memo tables are never touched from concurrent tasks.

use super::prompts;
use super::state::{ResearchState, StateUpdate};
use crate::canon::{merge_concepts, Normalizer};
use crate::config::ExtractionConfig;
use crate::error::PipelineError;
use crate::graph::{sort_by_relevance, union_citations, Citation, Concept, ConceptType};
use crate::oracle::payload::{decode, ConceptRecord, ExtractionPayload};
use crate::oracle::{OracleError, OracleRequest, StructuredOracle};
use crate::search::SearchResult;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Concepts and diagnostics from one extraction run.
#[derive(Debug, Default)]
pub struct Extraction {
    pub concepts: Vec<Concept>,
    pub errors: Vec<String>,
}

/// Result of one batch task.
struct BatchOutcome {
    concepts: Vec<Concept>,
    failure: Option<OracleError>,
}

/// Build an un-normalized concept from an oracle record.
///
/// Citations are the batch results whose description mentions the raw name.
pub(crate) fn concept_from_record(record: ConceptRecord, batch: &[SearchResult]) -> Concept {
    let name = record.name.trim().to_string();
    let needle = name.to_lowercase();
    let citations: Vec<Citation> = if needle.is_empty() {
        Vec::new()
    } else {
        batch
            .iter()
            .filter(|r| r.description.to_lowercase().contains(&needle))
            .map(Citation::from)
            .collect()
    };

    let mut concept = Concept::new(
        name,
        ConceptType::from_tag(&record.concept_type),
        record.description.trim(),
    )
    .with_relevance(record.relevance_score);
    concept.aliases = record
        .aliases
        .unwrap_or_default()
        .into_iter()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect();
    union_citations(&mut concept.citations, citations);
    concept.technical_details = non_empty(record.technical_details);
    concept.key_components = record.key_components.unwrap_or_default();
    concept.implementation_notes = non_empty(record.implementation_notes);
    concept.use_cases = record.use_cases.unwrap_or_default();
    concept
}

pub(crate) fn non_empty(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

/// Runs the extraction stage.
pub struct BatchExtractor {
    oracle: Arc<dyn StructuredOracle>,
    config: ExtractionConfig,
    temperature: f32,
}

impl BatchExtractor {
    pub fn new(oracle: Arc<dyn StructuredOracle>, config: ExtractionConfig, temperature: f32) -> Self {
        Self {
            oracle,
            config,
            temperature,
        }
    }

    async fn extract_batch(&self, topic: &str, batch: &[SearchResult], system: &str) -> BatchOutcome {
        let request = OracleRequest::new(
            system,
            prompts::extraction_user(topic, &prompts::format_results(batch)),
            self.temperature,
        );
        let timeout = self.config.batch_timeout();

        let response = match tokio::time::timeout(timeout, self.oracle.generate(&request)).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => return BatchOutcome::failed(e),
            Err(_) => return BatchOutcome::failed(OracleError::Timeout(timeout)),
        };

        match decode::<ExtractionPayload>(&response) {
            Ok(payload) => BatchOutcome {
                concepts: payload
                    .concepts
                    .into_iter()
                    .map(|record| concept_from_record(record, batch))
                    .collect(),
                failure: None,
            },
            Err(e) => BatchOutcome::failed(e),
        }
    }

    /// Extract the concepts for `topic` from `results`.
    ///
    /// The returned set holds only the topic's own concept, or the single
    /// highest-scoring concept when that clears the fallback threshold.
    /// Fails only when every batch found the oracle unreachable.
    pub async fn extract(
        &self,
        topic: &str,
        results: &[SearchResult],
        normalizer: &mut Normalizer,
    ) -> Result<Extraction, PipelineError> {
        let batch_size = self.config.batch_size.max(1);
        let batches: Vec<&[SearchResult]> = results.chunks(batch_size).collect();
        let total = batches.len();
        info!(results = results.len(), batches = total, batch_size, "extracting entities");

        let system = prompts::extraction_system();
        let outcomes = join_all(
            batches
                .iter()
                .map(|batch| self.extract_batch(topic, batch, &system)),
        )
        .await;

        // Fan-in: everything below runs on one task.
        let mut concepts = Vec::new();
        let mut errors = Vec::new();
        let mut unavailable = 0;
        for (index, outcome) in outcomes.into_iter().enumerate() {
            match outcome.failure {
                Some(e) => {
                    let message = format!(
                        "Entity extraction failed for batch {} of {}: {}",
                        index + 1,
                        total,
                        e
                    );
                    error!("{}", message);
                    if e.is_unavailable() {
                        unavailable += 1;
                    }
                    errors.push(message);
                }
                None => {
                    debug!(batch = index + 1, concepts = outcome.concepts.len(), "batch extracted");
                    concepts.extend(outcome.concepts);
                }
            }
        }

        if total > 0 && unavailable == total {
            return Err(PipelineError::OracleUnavailable(format!(
                "all {} extraction batches failed to reach the oracle",
                total
            )));
        }

        info!(count = concepts.len(), "extracted concepts before merge");
        let mut merged = merge_concepts(concepts, normalizer);
        merged.retain(|c| {
            if c.name.is_empty() {
                warn!(aliases = ?c.aliases, "dropping concept with empty canonical name");
            }
            !c.name.is_empty()
        });
        sort_by_relevance(&mut merged);
        info!(count = merged.len(), "concepts after merge");

        let topic_name = normalizer.normalize(topic);
        let mut selected: Vec<Concept> = merged
            .iter()
            .filter(|c| c.name == topic_name)
            .cloned()
            .collect();

        if selected.is_empty() {
            warn!(topic = %topic, "query entity not found in extracted concepts");
            match merged.into_iter().next() {
                Some(top) if top.relevance_score >= self.config.fallback_threshold => {
                    info!(
                        concept = %top.name,
                        score = top.relevance_score,
                        "using highest relevance concept as query entity"
                    );
                    selected.push(top);
                }
                _ => {
                    errors.push(format!(
                        "Query entity '{}' not extracted from search results",
                        topic
                    ));
                }
            }
        }

        sort_by_relevance(&mut selected);
        Ok(Extraction {
            concepts: selected,
            errors,
        })
    }

    pub async fn run(
        &self,
        state: &ResearchState,
        normalizer: &mut Normalizer,
    ) -> Result<StateUpdate, PipelineError> {
        let extraction = self
            .extract(&state.topic, &state.search_results, normalizer)
            .await?;
        Ok(StateUpdate {
            concepts: extraction.concepts,
            errors: extraction.errors,
            ..StateUpdate::default()
        })
    }
}

impl BatchOutcome {
    fn failed(error: OracleError) -> Self {
        Self {
            concepts: Vec::new(),
            failure: Some(error),
        }
    }
}
