//! End-to-end pipeline runs against the in-crate mocks

mod common;

use rkg::oracle::MockOracle;
use rkg::search::{CodeResult, MockCodeSearch, MockSearch};
use rkg::{MarkdownRenderer, Pipeline, PipelineError, RelationType};
use std::sync::Arc;

fn pipeline(oracle: Arc<MockOracle>, search: MockSearch, dir: &std::path::Path) -> Pipeline {
    Pipeline::new(
        oracle,
        Arc::new(search),
        Box::new(MarkdownRenderer::new(dir)),
        common::settings(dir),
    )
}

#[tokio::test]
async fn full_run_builds_graph_and_records_failures() {
    let dir = tempfile::tempdir().unwrap();
    let oracle = Arc::new(common::oracle());
    let pipeline = pipeline(oracle.clone(), common::search(), dir.path());

    let state = pipeline.run(common::TOPIC).await.unwrap();

    assert_eq!(state.step_count, 6);
    assert_eq!(state.queries, vec!["gnn overview", "gnn message passing", "gnn broken"]);
    assert_eq!(state.search_results.len(), 3);
    // query, two batches, two enrichments, relationships
    assert_eq!(oracle.call_count(), 6);

    let names: Vec<&str> = state.concepts.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Graph Neural Network", "Message Passing", "Readout"]);

    let root = &state.concepts[0];
    assert_eq!(root.relevance_score, 1.0);
    assert!(root
        .citations
        .iter()
        .any(|c| c.url == "https://distill.pub/gnn-intro"));

    let message_passing = &state.concepts[1];
    assert_eq!(message_passing.description, "Iterative neighbourhood aggregation");
    assert!(message_passing.aliases.contains("MPNN"));
    assert_eq!(message_passing.relevance_score, 0.85);
    assert_eq!(
        state.concepts[2].description,
        "pools node states into a graph representation"
    );

    assert_eq!(state.relationships.len(), 2);
    let uses = &state.relationships[0];
    assert_eq!(
        (uses.source.as_str(), uses.relation_type, uses.target.as_str()),
        ("Graph Neural Network", RelationType::Uses, "Message Passing")
    );
    assert!(!uses.is_inferred);
    assert_eq!(uses.citations.len(), 1);
    let part_of = &state.relationships[1];
    assert_eq!(part_of.target, "Graph Neural Network");
    assert!(part_of.is_inferred);
    assert_eq!(part_of.confidence, 0.8);

    assert_eq!(
        state.errors,
        vec![
            "Search failed for query 'gnn broken': rate limited",
            "Entity extraction failed for batch 2 of 2: invocation failed: context length exceeded",
            "Component enrichment failed for 'Readout': invocation failed: model overloaded",
        ]
    );

    let main_page = dir.path().join("Graph_Neural_Network.md");
    assert_eq!(state.output_path.as_deref(), Some(main_page.as_path()));
    let markdown = std::fs::read_to_string(&main_page).unwrap();
    assert_eq!(markdown, state.markdown_output);
    assert!(markdown.contains("- [[Message Passing]]: Iterative neighbourhood aggregation"));
    assert!(markdown
        .contains("### Facts (Extracted from Sources)\n- **Fact**: [[Graph Neural Network]] uses [[Message Passing]]"));

    let pages = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(pages, 3);
    let readout = std::fs::read_to_string(dir.path().join("Readout.md")).unwrap();
    assert!(readout.contains("**Inferred**: [[Readout]] part_of [[Graph Neural Network]]"));
}

#[tokio::test]
async fn code_results_reach_the_main_page() {
    let dir = tempfile::tempdir().unwrap();
    let repo = CodeResult::Repository {
        name: "pytorch_geometric".to_string(),
        full_name: "pyg-team/pytorch_geometric".to_string(),
        description: "Graph Neural Network Library for PyTorch".to_string(),
        url: "https://github.com/pyg-team/pytorch_geometric".to_string(),
        stars: 21000,
    };
    let pipeline = pipeline(Arc::new(common::oracle()), common::search(), dir.path())
        .with_code_search(Arc::new(MockCodeSearch::with_results(vec![repo.clone()])));

    let state = pipeline.run(common::TOPIC).await.unwrap();

    assert_eq!(state.code_results, vec![repo]);
    assert!(state.markdown_output.contains(
        "## Code Examples\n\n- [pyg-team/pytorch_geometric](https://github.com/pyg-team/pytorch_geometric) (21000 stars)"
    ));
}

#[tokio::test]
async fn unreachable_oracle_aborts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    // query generation falls back to the bare topic, which matches every needle
    let search = MockSearch::new().with_results("", common::overview_results());
    let pipeline = pipeline(Arc::new(MockOracle::unavailable()), search, dir.path());

    let err = pipeline.run(common::TOPIC).await.unwrap_err();

    assert!(matches!(err, PipelineError::OracleUnavailable(_)));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn no_search_results_still_completes() {
    let dir = tempfile::tempdir().unwrap();
    let oracle = Arc::new(common::oracle());
    let pipeline = pipeline(oracle.clone(), MockSearch::new(), dir.path());

    let state = tokio_test::block_on(pipeline.run(common::TOPIC)).unwrap();

    assert_eq!(state.step_count, 6);
    assert!(state.search_results.is_empty());
    assert!(state.concepts.is_empty());
    assert_eq!(
        state.errors,
        vec!["Query entity 'Graph Neural Network' not extracted from search results"]
    );
    // only query generation reaches the oracle
    assert_eq!(oracle.call_count(), 1);
    assert!(dir.path().join("Graph_Neural_Network.md").exists());
}
