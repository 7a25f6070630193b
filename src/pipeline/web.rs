//! Web search stage, with optional code search

use super::state::{ResearchState, StateUpdate};
use crate::search::{CodeSearchProvider, SearchProvider};
use std::sync::Arc;
use tracing::{info, warn};

/// Runs every generated query through the search provider, in order.
pub struct WebSearcher {
    search: Arc<dyn SearchProvider>,
    code_search: Option<Arc<dyn CodeSearchProvider>>,
}

impl WebSearcher {
    pub fn new(search: Arc<dyn SearchProvider>) -> Self {
        Self {
            search,
            code_search: None,
        }
    }

    pub fn with_code_search(mut self, code_search: Arc<dyn CodeSearchProvider>) -> Self {
        self.code_search = Some(code_search);
        self
    }

    pub async fn run(&self, state: &ResearchState) -> StateUpdate {
        info!(queries = state.queries.len(), "searching web");
        let mut update = StateUpdate::default();

        for query in &state.queries {
            match self.search.search(query).await {
                Ok(results) => {
                    info!(query = %query, count = results.len(), "query returned results");
                    update.search_results.extend(results);
                }
                Err(e) => {
                    warn!(query = %query, error = %e, "search failed");
                    update
                        .errors
                        .push(format!("Search failed for query '{}': {}", query, e));
                }
            }
        }

        if let Some(code_search) = &self.code_search {
            match code_search.search_code(&state.topic).await {
                Ok(results) => {
                    info!(count = results.len(), "code search returned results");
                    update.code_results = results;
                }
                Err(e) => {
                    warn!(error = %e, "code search failed");
                    update.errors.push(format!("Code search failed: {}", e));
                }
            }
        }

        info!(total = update.search_results.len(), "web search complete");
        update
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{CodeResult, MockCodeSearch, MockSearch, SearchError, SearchResult};

    fn state_with_queries(queries: &[&str]) -> ResearchState {
        let mut state = ResearchState::new("GNN");
        state.queries = queries.iter().map(|q| q.to_string()).collect();
        state
    }

    #[tokio::test]
    async fn failed_query_does_not_stop_others() {
        let search = MockSearch::new()
            .with_results("overview", vec![SearchResult::new("A", "https://a.example", "a")])
            .with_failure("broken", SearchError::RateLimited)
            .with_results("papers", vec![SearchResult::new("B", "https://b.example", "b")]);
        let stage = WebSearcher::new(Arc::new(search));

        let update = stage
            .run(&state_with_queries(&["gnn overview", "gnn broken", "gnn papers"]))
            .await;

        let urls: Vec<&str> = update.search_results.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.example", "https://b.example"]);
        assert_eq!(
            update.errors,
            vec!["Search failed for query 'gnn broken': rate limited"]
        );
        assert!(update.code_results.is_empty());
    }

    #[tokio::test]
    async fn code_results_are_collected() {
        let snippet = CodeResult::Code {
            name: "gcn.py".to_string(),
            path: "models/gcn.py".to_string(),
            repository: "someone/gnn".to_string(),
            url: "https://github.com/someone/gnn/blob/main/models/gcn.py".to_string(),
            content: "class GCN: ...".to_string(),
            language: "python".to_string(),
        };
        let stage = WebSearcher::new(Arc::new(MockSearch::new()))
            .with_code_search(Arc::new(MockCodeSearch::with_results(vec![snippet.clone()])));

        let update = stage.run(&state_with_queries(&[])).await;

        assert_eq!(update.code_results, vec![snippet]);
    }

    #[tokio::test]
    async fn code_search_failure_is_recorded() {
        let stage = WebSearcher::new(Arc::new(MockSearch::new())).with_code_search(Arc::new(
            MockCodeSearch::failing(SearchError::Http("connection reset".to_string())),
        ));

        let update = stage.run(&state_with_queries(&["q"])).await;

        assert_eq!(update.errors, vec!["Code search failed: http error: connection reset"]);
    }
}
