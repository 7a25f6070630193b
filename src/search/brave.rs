//! Brave Search web client

use super::{SearchError, SearchProvider, SearchResult};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

const BRAVE_URL: &str = "https://api.search.brave.com/res/v1/web/search";

#[derive(Debug, Deserialize)]
struct BraveResponse {
    #[serde(default)]
    web: Option<BraveWeb>,
}

#[derive(Debug, Deserialize)]
struct BraveWeb {
    #[serde(default)]
    results: Vec<BraveHit>,
}

#[derive(Debug, Deserialize)]
struct BraveHit {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    description: String,
}

/// Web search through the Brave Search API.
pub struct BraveSearch {
    client: Client,
    api_key: String,
    max_results: usize,
    base_url: String,
}

impl BraveSearch {
    pub fn new(api_key: impl Into<String>, max_results: usize) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_key: api_key.into(),
            max_results,
            base_url: BRAVE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[async_trait]
impl SearchProvider for BraveSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError> {
        let count = self.max_results.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .header("Accept", "application/json")
            .header("X-Subscription-Token", &self.api_key)
            .query(&[("q", query), ("count", count.as_str())])
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, query, "Brave search request failed");
                SearchError::Http(e.to_string())
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(SearchError::RateLimited);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SearchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: BraveResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(e.to_string()))?;

        let results: Vec<SearchResult> = body
            .web
            .map(|web| web.results)
            .unwrap_or_default()
            .into_iter()
            .map(|hit| SearchResult::new(hit.title, hit.url, hit.description).with_query(query))
            .collect();

        info!(count = results.len(), query, "web search complete");
        Ok(results)
    }
}
