//! Run state threaded through the pipeline stages
//!
//! Stages never mutate the state directly. Each returns a [`StateUpdate`]
//! and the engine folds it in with [`ResearchState::apply`], field by field,
//! according to [`REDUCERS`].

use crate::graph::{Concept, Relationship};
use crate::search::{CodeResult, SearchResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How an update field is folded into the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    /// Append the update's items after the existing ones
    Concat,
    /// Replace the existing value when the update sets one
    Overwrite,
}

/// The reducer for every state field.
pub const REDUCERS: &[(&str, Reducer)] = &[
    ("queries", Reducer::Concat),
    ("search_results", Reducer::Concat),
    ("code_results", Reducer::Concat),
    ("concepts", Reducer::Concat),
    ("relationships", Reducer::Concat),
    ("errors", Reducer::Concat),
    ("markdown_output", Reducer::Overwrite),
    ("output_path", Reducer::Overwrite),
    ("step_count", Reducer::Overwrite),
];

/// Look up the reducer for `field`.
pub fn reducer_for(field: &str) -> Option<Reducer> {
    REDUCERS
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, reducer)| *reducer)
}

/// Everything a run has accumulated so far.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchState {
    pub topic: String,
    pub queries: Vec<String>,
    pub search_results: Vec<SearchResult>,
    pub code_results: Vec<CodeResult>,
    pub concepts: Vec<Concept>,
    pub relationships: Vec<Relationship>,
    /// Recoverable failures, in the order they happened
    pub errors: Vec<String>,
    pub markdown_output: String,
    pub output_path: Option<PathBuf>,
    pub step_count: usize,
}

/// A stage's partial result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    pub queries: Vec<String>,
    pub search_results: Vec<SearchResult>,
    pub code_results: Vec<CodeResult>,
    pub concepts: Vec<Concept>,
    pub relationships: Vec<Relationship>,
    pub errors: Vec<String>,
    pub markdown_output: Option<String>,
    pub output_path: Option<Option<PathBuf>>,
    pub step_count: Option<usize>,
}

impl StateUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.errors.push(message.into());
        self
    }
}

fn fold<T>(reducer: Reducer, target: &mut Vec<T>, incoming: Vec<T>) {
    match reducer {
        Reducer::Concat => target.extend(incoming),
        Reducer::Overwrite => *target = incoming,
    }
}

fn fold_scalar<T>(reducer: Reducer, target: &mut T, incoming: Option<T>) {
    if let Some(value) = incoming {
        match reducer {
            // A scalar has nothing to append to; the newest value wins.
            Reducer::Concat | Reducer::Overwrite => *target = value,
        }
    }
}

impl ResearchState {
    /// Fresh state: empty accumulators, `step_count` 0.
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Self::default()
        }
    }

    /// Fold `update` into the state using the reducer table.
    pub fn apply(&mut self, update: StateUpdate) {
        let r = |field: &str| reducer_for(field).unwrap_or(Reducer::Overwrite);

        fold(r("queries"), &mut self.queries, update.queries);
        fold(r("search_results"), &mut self.search_results, update.search_results);
        fold(r("code_results"), &mut self.code_results, update.code_results);
        fold(r("concepts"), &mut self.concepts, update.concepts);
        fold(r("relationships"), &mut self.relationships, update.relationships);
        fold(r("errors"), &mut self.errors, update.errors);
        fold_scalar(r("markdown_output"), &mut self.markdown_output, update.markdown_output);
        fold_scalar(r("output_path"), &mut self.output_path, update.output_path);
        fold_scalar(r("step_count"), &mut self.step_count, update.step_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ConceptType;

    #[test]
    fn every_field_has_a_reducer() {
        for field in [
            "queries",
            "search_results",
            "code_results",
            "concepts",
            "relationships",
            "errors",
        ] {
            assert_eq!(reducer_for(field), Some(Reducer::Concat), "{}", field);
        }
        for field in ["markdown_output", "output_path", "step_count"] {
            assert_eq!(reducer_for(field), Some(Reducer::Overwrite), "{}", field);
        }
    }

    #[test]
    fn new_state_is_empty() {
        let state = ResearchState::new("GNN");
        assert_eq!(state.topic, "GNN");
        assert_eq!(state.step_count, 0);
        assert!(state.concepts.is_empty());
        assert!(state.output_path.is_none());
    }

    #[test]
    fn lists_concatenate_across_updates() {
        let mut state = ResearchState::new("GNN");
        state.apply(StateUpdate {
            queries: vec!["a".into()],
            errors: vec!["first".into()],
            concepts: vec![Concept::new("GNN", ConceptType::Method, "x")],
            ..StateUpdate::default()
        });
        state.apply(StateUpdate {
            queries: vec!["b".into()],
            concepts: vec![Concept::new("GCN", ConceptType::Method, "y")],
            ..StateUpdate::new().error("second")
        });

        assert_eq!(state.queries, vec!["a", "b"]);
        assert_eq!(state.errors, vec!["first", "second"]);
        assert_eq!(state.concepts.len(), 2);
    }

    #[test]
    fn scalars_overwrite_only_when_set() {
        let mut state = ResearchState::new("GNN");
        state.apply(StateUpdate {
            markdown_output: Some("# GNN".into()),
            output_path: Some(Some(PathBuf::from("out/GNN.md"))),
            step_count: Some(6),
            ..StateUpdate::default()
        });
        state.apply(StateUpdate::new().error("later"));

        assert_eq!(state.markdown_output, "# GNN");
        assert_eq!(state.output_path, Some(PathBuf::from("out/GNN.md")));
        assert_eq!(state.step_count, 6);

        state.apply(StateUpdate {
            markdown_output: Some(String::new()),
            output_path: Some(None),
            ..StateUpdate::default()
        });
        assert_eq!(state.markdown_output, "");
        assert!(state.output_path.is_none());
    }
}
