//! Research pipeline: stages, run state, and the engine that drives them

mod engine;
mod expand;
mod extract;
mod prompts;
mod queries;
mod relationships;
mod render;
mod state;
mod web;

pub use engine::{Pipeline, Stage};
pub use expand::{parse_component, Component, ComponentExpander, Expansion};
pub use extract::{BatchExtractor, Extraction};
pub use queries::QueryGenerator;
pub use relationships::RelationshipInferrer;
pub use render::{concept_page, sanitize_filename, topic_page, MarkdownRenderer, RenderError, Rendered, Renderer};
pub use state::{reducer_for, Reducer, ResearchState, StateUpdate, REDUCERS};
pub use web::WebSearcher;
