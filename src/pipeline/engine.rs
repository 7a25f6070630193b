//! The six-stage research pipeline
//!
//! Stages run strictly in order. Each produces a [`StateUpdate`] that is
//! folded into the running [`ResearchState`]; recorded errors never stop the
//! run, only a [`PipelineError`] does.

use super::expand::ComponentExpander;
use super::extract::BatchExtractor;
use super::queries::QueryGenerator;
use super::relationships::RelationshipInferrer;
use super::render::{MarkdownRenderer, Renderer};
use super::state::{ResearchState, StateUpdate};
use super::web::WebSearcher;
use crate::canon::Normalizer;
use crate::config::Settings;
use crate::error::PipelineError;
use crate::oracle::{OpenAiOracle, StructuredOracle};
use crate::search::{BraveSearch, CodeSearchProvider, GitHubCodeSearch, SearchProvider};
use std::sync::Arc;
use tracing::{error, info, info_span, Instrument};

/// Pipeline position. `Done` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    GenerateQueries,
    SearchWeb,
    ExtractEntities,
    ExpandComponents,
    InferRelationships,
    Render,
    Done,
}

impl Stage {
    pub const FIRST: Stage = Stage::GenerateQueries;

    pub fn next(self) -> Stage {
        match self {
            Self::GenerateQueries => Self::SearchWeb,
            Self::SearchWeb => Self::ExtractEntities,
            Self::ExtractEntities => Self::ExpandComponents,
            Self::ExpandComponents => Self::InferRelationships,
            Self::InferRelationships => Self::Render,
            Self::Render | Self::Done => Self::Done,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::GenerateQueries => "generate_queries",
            Self::SearchWeb => "search_web",
            Self::ExtractEntities => "extract_entities",
            Self::ExpandComponents => "expand_components",
            Self::InferRelationships => "infer_relationships",
            Self::Render => "render",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Topic in, knowledge graph out.
pub struct Pipeline {
    queries: QueryGenerator,
    web: WebSearcher,
    extractor: BatchExtractor,
    expander: ComponentExpander,
    relationships: RelationshipInferrer,
    renderer: Box<dyn Renderer>,
    settings: Settings,
}

impl Pipeline {
    pub fn new(
        oracle: Arc<dyn StructuredOracle>,
        search: Arc<dyn SearchProvider>,
        renderer: Box<dyn Renderer>,
        settings: Settings,
    ) -> Self {
        let timeout = settings.extraction.batch_timeout();
        let temps = settings.oracle.clone();
        Self {
            queries: QueryGenerator::new(
                oracle.clone(),
                settings.search.max_queries_per_topic,
                temps.query_temperature,
            ),
            web: WebSearcher::new(search),
            extractor: BatchExtractor::new(
                oracle.clone(),
                settings.extraction.clone(),
                temps.extraction_temperature,
            ),
            expander: ComponentExpander::new(
                oracle.clone(),
                settings.expansion.clone(),
                temps.expansion_temperature,
                timeout,
            ),
            relationships: RelationshipInferrer::new(oracle, temps.relationship_temperature, timeout),
            renderer,
            settings,
        }
    }

    pub fn with_code_search(mut self, code_search: Arc<dyn CodeSearchProvider>) -> Self {
        self.web = self.web.with_code_search(code_search);
        self
    }

    /// Wire up the live services described by `settings`.
    ///
    /// Fails when a required API key is missing or malformed.
    pub fn from_settings(settings: Settings) -> Result<Self, PipelineError> {
        let mut oracle = OpenAiOracle::new(settings.openai_key()?, settings.oracle.model.clone());
        if let Some(url) = &settings.oracle.base_url {
            oracle = oracle.with_base_url(url.clone());
        }
        let search = BraveSearch::new(settings.brave_key()?, settings.search.max_results_per_query);
        let renderer = MarkdownRenderer::new(settings.output.dir.clone());

        let code_search = settings.search.code_search.then(|| {
            GitHubCodeSearch::new(
                settings.github_token.clone(),
                settings.search.code_language.clone(),
                settings.search.max_code_results,
            )
        });

        let pipeline = Self::new(Arc::new(oracle), Arc::new(search), Box::new(renderer), settings);
        Ok(match code_search {
            Some(code_search) => pipeline.with_code_search(Arc::new(code_search)),
            None => pipeline,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn render(&self, state: &ResearchState) -> StateUpdate {
        match self.renderer.render(state) {
            Ok(rendered) => StateUpdate {
                markdown_output: Some(rendered.markdown),
                output_path: Some(Some(rendered.path)),
                ..StateUpdate::default()
            },
            Err(e) => {
                error!(error = %e, "markdown generation failed");
                StateUpdate {
                    markdown_output: Some(String::new()),
                    output_path: Some(None),
                    ..StateUpdate::default()
                }
                .error(format!("Markdown generation failed: {}", e))
            }
        }
    }

    async fn step(
        &self,
        stage: Stage,
        state: &ResearchState,
        normalizer: &mut Normalizer,
    ) -> Result<StateUpdate, PipelineError> {
        let update = match stage {
            Stage::GenerateQueries => self.queries.run(state).await,
            Stage::SearchWeb => self.web.run(state).await,
            Stage::ExtractEntities => self.extractor.run(state, normalizer).await?,
            Stage::ExpandComponents => self.expander.run(state, normalizer).await,
            Stage::InferRelationships => self.relationships.run(state, normalizer).await,
            Stage::Render => self.render(state),
            Stage::Done => StateUpdate::default(),
        };
        Ok(update)
    }

    /// Run every stage for `topic`.
    pub async fn run(&self, topic: &str) -> Result<ResearchState, PipelineError> {
        let mut state = ResearchState::new(topic);
        // One normalizer per run so every stage agrees on canonical names.
        let mut normalizer = Normalizer::with_policy(self.settings.extraction.singularize);

        info!(topic = %topic, "starting research pipeline");
        let mut stage = Stage::FIRST;
        while stage != Stage::Done {
            let span = info_span!("stage", name = stage.name());
            let mut update = self
                .step(stage, &state, &mut normalizer)
                .instrument(span)
                .await
                .inspect_err(|e| error!(stage = %stage, error = %e, "pipeline aborted"))?;
            update.step_count = Some(state.step_count + 1);
            state.apply(update);
            stage = stage.next();
        }

        info!(
            steps = state.step_count,
            concepts = state.concepts.len(),
            relationships = state.relationships.len(),
            errors = state.errors.len(),
            "research pipeline complete"
        );
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{MockOracle, OracleError};
    use crate::pipeline::render::{RenderError, Rendered};
    use crate::search::{MockSearch, SearchError};

    struct FailingRenderer;

    impl Renderer for FailingRenderer {
        fn render(&self, _state: &ResearchState) -> Result<Rendered, RenderError> {
            Err(RenderError::Io {
                path: "/nowhere".into(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            })
        }
    }

    #[test]
    fn stages_are_linear() {
        let mut stage = Stage::FIRST;
        let mut seen = vec![stage];
        while stage != Stage::Done {
            stage = stage.next();
            seen.push(stage);
        }
        assert_eq!(seen.len(), 7);
        assert_eq!(Stage::Done.next(), Stage::Done);
        assert_eq!(Stage::ExtractEntities.to_string(), "extract_entities");
    }

    #[tokio::test]
    async fn six_steps_despite_errors() {
        let oracle = MockOracle::new().otherwise_fail(OracleError::InvocationFailed("boom".into()));
        let search = MockSearch::new().with_failure("", SearchError::RateLimited);
        let pipeline = Pipeline::new(
            Arc::new(oracle),
            Arc::new(search),
            Box::new(FailingRenderer),
            Settings::default(),
        );

        let state = pipeline.run("Quantum Computing").await.unwrap();

        assert_eq!(state.step_count, 6);
        assert_eq!(state.queries, vec!["Quantum Computing"]);
        assert!(state.concepts.is_empty());
        assert!(state.output_path.is_none());
        assert!(state.markdown_output.is_empty());
        assert!(state.errors.iter().any(|e| e.starts_with("Query generation error")));
        assert!(state.errors.iter().any(|e| e.starts_with("Search failed for query")));
        assert!(state
            .errors
            .iter()
            .any(|e| e == "Query entity 'Quantum Computing' not extracted from search results"));
        assert!(state.errors.iter().any(|e| e.starts_with("Markdown generation failed")));
    }

    #[tokio::test]
    async fn unreachable_oracle_aborts() {
        let search = MockSearch::new().with_results(
            "",
            vec![crate::search::SearchResult::new("A", "https://a.example", "a")],
        );
        let pipeline = Pipeline::new(
            Arc::new(MockOracle::unavailable()),
            Arc::new(search),
            Box::new(FailingRenderer),
            Settings::default(),
        );

        let err = pipeline.run("Quantum Computing").await.unwrap_err();
        assert!(matches!(err, PipelineError::OracleUnavailable(_)));
    }

    #[test]
    fn from_settings_requires_keys() {
        let err = Pipeline::from_settings(Settings::default()).err().unwrap();
        assert!(matches!(err, PipelineError::Config(_)));
    }
}
