//! Query generation stage

use super::prompts;
use super::state::{ResearchState, StateUpdate};
use crate::oracle::payload::{decode, QueryPayload};
use crate::oracle::{OracleError, OracleRequest, StructuredOracle};
use std::sync::Arc;
use tracing::{info, warn};

/// Asks the oracle for web search queries about the topic.
///
/// On failure the topic itself becomes the only query.
pub struct QueryGenerator {
    oracle: Arc<dyn StructuredOracle>,
    max_queries: usize,
    temperature: f32,
}

impl QueryGenerator {
    pub fn new(oracle: Arc<dyn StructuredOracle>, max_queries: usize, temperature: f32) -> Self {
        Self {
            oracle,
            max_queries,
            temperature,
        }
    }

    async fn generate(&self, topic: &str) -> Result<Vec<String>, OracleError> {
        let request = OracleRequest::new(
            prompts::query_system(),
            prompts::query_user(topic),
            self.temperature,
        );
        let payload: QueryPayload = decode(&self.oracle.generate(&request).await?)?;

        let mut queries: Vec<String> = Vec::new();
        for query in payload.queries {
            let query = query.trim();
            if !query.is_empty() && !queries.iter().any(|q| q == query) {
                queries.push(query.to_string());
            }
        }
        queries.truncate(self.max_queries);
        Ok(queries)
    }

    pub async fn run(&self, state: &ResearchState) -> StateUpdate {
        let topic = &state.topic;
        info!(topic = %topic, "generating search queries");

        match self.generate(topic).await {
            Ok(queries) if !queries.is_empty() => {
                info!(count = queries.len(), "generated queries");
                StateUpdate {
                    queries,
                    ..StateUpdate::default()
                }
            }
            Ok(_) => {
                warn!("oracle returned no queries; searching the topic itself");
                StateUpdate {
                    queries: vec![topic.clone()],
                    ..StateUpdate::default()
                }
            }
            Err(e) => {
                warn!(error = %e, "query generation failed");
                StateUpdate {
                    queries: vec![topic.clone()],
                    ..StateUpdate::new().error(format!("Query generation error: {}", e))
                }
            }
        }
    }
}
