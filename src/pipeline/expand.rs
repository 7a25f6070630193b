//! Component expansion
//!
//! Turns the root concept's `key_components` ("Name: description") into
//! concepts of their own. Only the concept named like the topic is expanded,
//! so expansion never goes deeper than one level.

use super::extract::non_empty;
use super::prompts;
use super::state::{ResearchState, StateUpdate};
use crate::canon::{merge_concepts, split_trailing_parenthetical, Normalizer};
use crate::config::ExpansionConfig;
use crate::graph::{sort_by_relevance, Concept, ConceptType};
use crate::oracle::payload::{decode, ExtractionPayload};
use crate::oracle::{OracleError, OracleRequest, StructuredOracle};
use crate::search::SearchResult;
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A parsed `"Name (Alias): description"` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub name: String,
    pub alias: Option<String>,
    pub description: String,
}

/// Parse one key-component entry. Entries without a `:` yield `None`.
pub fn parse_component(entry: &str) -> Option<Component> {
    let (head, description) = entry.split_once(':')?;
    let (name, alias) = split_trailing_parenthetical(head.trim());
    if name.is_empty() {
        return None;
    }
    Some(Component {
        name: name.to_string(),
        alias: alias.filter(|a| !a.is_empty()).map(str::to_string),
        description: description.trim().to_string(),
    })
}

/// New concepts found by expansion, plus diagnostics.
#[derive(Debug, Default)]
pub struct Expansion {
    pub concepts: Vec<Concept>,
    pub errors: Vec<String>,
}

pub struct ComponentExpander {
    oracle: Arc<dyn StructuredOracle>,
    config: ExpansionConfig,
    temperature: f32,
    timeout: Duration,
}

impl ComponentExpander {
    pub fn new(
        oracle: Arc<dyn StructuredOracle>,
        config: ExpansionConfig,
        temperature: f32,
        timeout: Duration,
    ) -> Self {
        Self {
            oracle,
            config,
            temperature,
            timeout,
        }
    }

    /// Build component concepts for every root concept in `concepts`.
    fn components_of(&self, topic_name: &str, concepts: &[Concept], normalizer: &mut Normalizer) -> Vec<Concept> {
        let mut components = Vec::new();
        for parent in concepts {
            if parent.key_components.is_empty() {
                continue;
            }
            if normalizer.normalize(&parent.name) != topic_name {
                debug!(concept = %parent.name, "skipping key components of non-root concept");
                continue;
            }
            info!(concept = %parent.name, count = parent.key_components.len(), "expanding key components");

            for entry in &parent.key_components {
                let Some(component) = parse_component(entry) else {
                    warn!(entry = %entry, "invalid component format, missing ':'");
                    continue;
                };
                let mut concept = Concept::new(
                    component.name,
                    ConceptType::Technology,
                    component.description,
                )
                .with_relevance(self.config.component_score);
                if let Some(alias) = component.alias {
                    concept = concept.with_alias(alias);
                }
                concept.citations = parent.citations.clone();
                components.push(concept);
            }
        }
        components
    }

    /// Enrich one component from the search results. Failures leave it as is.
    async fn enrich(&self, mut component: Concept, system: &str, context: &str) -> (Concept, Option<String>) {
        let request = OracleRequest::new(
            system,
            prompts::extraction_user(&component.name, context),
            self.temperature,
        );

        let outcome = match tokio::time::timeout(self.timeout, self.oracle.generate(&request)).await {
            Ok(Ok(text)) => decode::<ExtractionPayload>(&text),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(OracleError::Timeout(self.timeout)),
        };

        let payload = match outcome {
            Ok(payload) => payload,
            Err(e) => {
                warn!(component = %component.name, error = %e, "component enrichment failed");
                let message = format!("Component enrichment failed for '{}': {}", component.name, e);
                return (component, Some(message));
            }
        };

        let Some(record) = payload.concepts.into_iter().next() else {
            warn!(component = %component.name, "no enrichment data returned");
            return (component, None);
        };

        let description = record.description.trim();
        if !description.is_empty() {
            component.description = description.to_string();
        }
        if let Some(details) = non_empty(record.technical_details) {
            component.technical_details = Some(details);
        }
        if let Some(components) = record.key_components.filter(|c| !c.is_empty()) {
            component.key_components = components;
        }
        if let Some(notes) = non_empty(record.implementation_notes) {
            component.implementation_notes = Some(notes);
        }
        if let Some(use_cases) = record.use_cases.filter(|u| !u.is_empty()) {
            component.use_cases = use_cases;
        }
        component.aliases.extend(
            record
                .aliases
                .unwrap_or_default()
                .into_iter()
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty()),
        );
        debug!(component = %component.name, "component enriched");
        (component, None)
    }

    /// Expand the root concept's components.
    ///
    /// Returns only concepts whose canonical name is not already in
    /// `concepts`.
    pub async fn expand(
        &self,
        topic: &str,
        concepts: &[Concept],
        results: &[SearchResult],
        normalizer: &mut Normalizer,
    ) -> Expansion {
        let topic_name = normalizer.normalize(topic);
        let mut components = self.components_of(&topic_name, concepts, normalizer);
        info!(count = components.len(), "extracted component concepts");

        let mut errors = Vec::new();
        if self.config.enrich && !components.is_empty() {
            let context_len = results.len().min(self.config.context_results);
            let context = prompts::format_results(&results[..context_len]);
            let system = prompts::extraction_system();

            let enriched = join_all(
                components
                    .into_iter()
                    .map(|component| self.enrich(component, &system, &context)),
            )
            .await;

            components = Vec::with_capacity(enriched.len());
            for (component, error) in enriched {
                errors.extend(error);
                components.push(component);
            }
        }

        let existing: HashSet<&str> = concepts.iter().map(|c| c.name.as_str()).collect();
        let merged = merge_concepts(concepts.iter().cloned().chain(components).collect(), normalizer);
        let mut added: Vec<Concept> = merged
            .into_iter()
            .filter(|c| !existing.contains(c.name.as_str()))
            .collect();
        sort_by_relevance(&mut added);

        info!(added = added.len(), "component expansion complete");
        Expansion {
            concepts: added,
            errors,
        }
    }

    pub async fn run(&self, state: &ResearchState, normalizer: &mut Normalizer) -> StateUpdate {
        let expansion = self
            .expand(&state.topic, &state.concepts, &state.search_results, normalizer)
            .await;
        StateUpdate {
            concepts: expansion.concepts,
            errors: expansion.errors,
            ..StateUpdate::default()
        }
    }
}
