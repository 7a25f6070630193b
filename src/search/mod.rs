//! Search collaborators: web search and code-hosting search
//!
//! The pipeline talks to both through traits so stages can run against
//! scripted mocks in tests and real HTTP clients in production.

mod brave;
mod github;

pub use brave::BraveSearch;
pub use github::GitHubCodeSearch;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// One web search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub description: String,
    /// The query that produced this hit, when known
    #[serde(default)]
    pub query: Option<String>,
}

impl SearchResult {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            description: description.into(),
            query: None,
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }
}

/// A code-search hit: either a file snippet or a repository summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CodeResult {
    Code {
        name: String,
        path: String,
        repository: String,
        url: String,
        content: String,
        language: String,
    },
    Repository {
        name: String,
        full_name: String,
        description: String,
        url: String,
        stars: u64,
    },
}

impl CodeResult {
    pub fn url(&self) -> &str {
        match self {
            Self::Code { url, .. } | Self::Repository { url, .. } => url,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SearchError {
    #[error("http error: {0}")]
    Http(String),
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("failed to parse search response: {0}")]
    Parse(String),
    #[error("rate limited")]
    RateLimited,
}

/// Web search provider.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError>;
}

/// Code-hosting search provider, keyed by topic.
#[async_trait]
pub trait CodeSearchProvider: Send + Sync {
    async fn search_code(&self, topic: &str) -> Result<Vec<CodeResult>, SearchError>;
}

/// Scripted web search for tests. Unmatched queries return no results.
#[derive(Default)]
pub struct MockSearch {
    rules: Vec<(String, Result<Vec<SearchResult>, SearchError>)>,
    queries: Mutex<Vec<String>>,
}

impl MockSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `results` for queries containing `needle`.
    pub fn with_results(mut self, needle: impl Into<String>, results: Vec<SearchResult>) -> Self {
        self.rules.push((needle.into(), Ok(results)));
        self
    }

    /// Fail queries containing `needle`.
    pub fn with_failure(mut self, needle: impl Into<String>, error: SearchError) -> Self {
        self.rules.push((needle.into(), Err(error)));
        self
    }

    /// Queries received so far, in order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SearchProvider for MockSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.to_string());
        }
        let reply = self
            .rules
            .iter()
            .find(|(needle, _)| query.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| Ok(Vec::new()));
        reply.map(|results| {
            results
                .into_iter()
                .map(|r| r.with_query(query))
                .collect()
        })
    }
}

/// Scripted code search for tests.
pub struct MockCodeSearch {
    reply: Result<Vec<CodeResult>, SearchError>,
}

impl MockCodeSearch {
    pub fn with_results(results: Vec<CodeResult>) -> Self {
        Self { reply: Ok(results) }
    }

    pub fn failing(error: SearchError) -> Self {
        Self { reply: Err(error) }
    }
}

#[async_trait]
impl CodeSearchProvider for MockCodeSearch {
    async fn search_code(&self, _topic: &str) -> Result<Vec<CodeResult>, SearchError> {
        self.reply.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_search_tags_results_with_query() {
        let search = MockSearch::new().with_results(
            "gnn",
            vec![SearchResult::new("GNN intro", "https://a.example", "graphs")],
        );

        let results = search.search("gnn overview").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].query.as_deref(), Some("gnn overview"));

        assert!(search.search("unrelated").await.unwrap().is_empty());
        assert_eq!(search.queries(), vec!["gnn overview", "unrelated"]);
    }

    #[tokio::test]
    async fn mock_search_failure() {
        let search = MockSearch::new().with_failure("bad", SearchError::RateLimited);
        assert!(matches!(
            search.search("bad query").await,
            Err(SearchError::RateLimited)
        ));
    }

    #[test]
    fn code_result_serializes_with_type_tag() {
        let repo = CodeResult::Repository {
            name: "pyg".to_string(),
            full_name: "pyg-team/pytorch_geometric".to_string(),
            description: "Graph Neural Network Library for PyTorch".to_string(),
            url: "https://github.com/pyg-team/pytorch_geometric".to_string(),
            stars: 20000,
        };
        let json = serde_json::to_value(&repo).unwrap();
        assert_eq!(json["type"], "repository");
        assert_eq!(repo.url(), "https://github.com/pyg-team/pytorch_geometric");
    }
}
