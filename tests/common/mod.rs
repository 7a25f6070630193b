//! Shared fixtures for pipeline integration tests
//!
//! A small "graph neural network" research run: three queries (one of which
//! fails), two extraction batches (one of which fails), two components to
//! enrich (one of which fails), and one relationship call.

#![allow(dead_code)]

use rkg::oracle::MockOracle;
use rkg::search::MockSearch;
use rkg::{OracleError, SearchError, SearchResult, Settings};
use std::path::Path;

pub const TOPIC: &str = "Graph Neural Network";

pub const QUERIES: &str = r#"{"queries": ["gnn overview", "gnn message passing", "gnn broken", "gnn overview"]}"#;

pub const BATCH_ONE: &str = r#"{"concepts": [
    {"name": "Graph Neural Networks (GNN)", "type": "method",
     "description": "Neural networks operating on graph-structured data",
     "relevance_score": 1.0,
     "technical_details": "Node states are updated from their neighbours",
     "key_components": [
        "Message Passing: nodes exchange information with neighbours",
        "Readout: pools node states into a graph representation",
        "no separator here"
     ]},
    {"name": "GNN", "type": "method", "description": "", "relevance_score": 0.7},
    {"name": "Graph Convolutional Network", "type": "method",
     "description": "Spectral GNN variant", "relevance_score": 0.9}
]}"#;

pub const MESSAGE_PASSING: &str = r#"{"concepts": [
    {"name": "Message Passing", "type": "technology",
     "description": "Iterative neighbourhood aggregation",
     "relevance_score": 0.9, "aliases": ["MPNN"]}
]}"#;

pub const RELATIONSHIPS: &str = r#"{"relationships": [
    {"source": "GNN", "relation_type": "uses", "target": "message passing",
     "is_inferred": false, "source_urls": ["https://distill.pub/gnn-intro"]},
    {"source": "Readout", "relation_type": "part_of", "target": "Graph Neural Networks",
     "description": "Final pooling step"}
]}"#;

/// Search results; the first two share a batch at batch size 2.
pub fn overview_results() -> Vec<SearchResult> {
    vec![
        SearchResult::new(
            "A Gentle Introduction to Graph Neural Networks",
            "https://distill.pub/gnn-intro",
            "MARKER_ALPHA A GNN learns over graph data",
        ),
        SearchResult::new(
            "GNN survey",
            "https://arxiv.org/abs/1901.00596",
            "A comprehensive survey of graph neural networks",
        ),
    ]
}

pub fn message_passing_results() -> Vec<SearchResult> {
    vec![SearchResult::new(
        "Neural Message Passing for Quantum Chemistry",
        "https://arxiv.org/abs/1704.01212",
        "MARKER_BETA message passing neural networks",
    )]
}

pub fn search() -> MockSearch {
    MockSearch::new()
        .with_results("overview", overview_results())
        .with_results("message passing", message_passing_results())
        .with_failure("broken", SearchError::RateLimited)
}

/// Rules are matched in order against the user prompt. The component and
/// relationship prompts carry the search results too, so they come first.
pub fn oracle() -> MockOracle {
    MockOracle::new()
        .respond_when("Identify relationships", RELATIONSHIPS)
        .respond_when("Generate effective search queries", QUERIES)
        .respond_when("Research Topic: Message Passing", MESSAGE_PASSING)
        .fail_when(
            "Research Topic: Readout",
            OracleError::InvocationFailed("model overloaded".to_string()),
        )
        .respond_when("MARKER_ALPHA", BATCH_ONE)
        .fail_when(
            "MARKER_BETA",
            OracleError::InvocationFailed("context length exceeded".to_string()),
        )
}

pub fn settings(output_dir: &Path) -> Settings {
    let mut settings = Settings::default();
    settings.extraction.batch_size = 2;
    settings.output.dir = output_dir.to_path_buf();
    settings
}
