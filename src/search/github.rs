//! GitHub code and repository search

use super::{CodeResult, CodeSearchProvider, SearchError};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

const GITHUB_API: &str = "https://api.github.com";

/// Code snippets longer than this are truncated.
const MAX_CONTENT_CHARS: usize = 5000;

/// Repositories fetched alongside code hits.
const MAX_REPOSITORIES: usize = 2;

#[derive(Debug, Deserialize)]
struct SearchPage<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct CodeItem {
    #[serde(default)]
    name: String,
    #[serde(default)]
    path: String,
    /// API URL of the file, used to fetch its content
    #[serde(default)]
    url: String,
    #[serde(default)]
    html_url: String,
    repository: RepoRef,
}

#[derive(Debug, Deserialize)]
struct RepoRef {
    #[serde(default)]
    full_name: String,
}

#[derive(Debug, Deserialize)]
struct RepoItem {
    #[serde(default)]
    name: String,
    #[serde(default)]
    full_name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    html_url: String,
    #[serde(default)]
    stargazers_count: u64,
}

/// Searches GitHub for code files and repositories about a topic.
///
/// A 403 from the search API means the rate limit is spent; that yields no
/// results rather than an error.
pub struct GitHubCodeSearch {
    client: Client,
    token: Option<String>,
    language: String,
    max_results: usize,
    base_url: String,
}

impl GitHubCodeSearch {
    pub fn new(token: Option<String>, language: impl Into<String>, max_results: usize) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(concat!("rkg/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self {
            client,
            token: token.filter(|t| !t.is_empty()),
            language: language.into(),
            max_results,
            base_url: GITHUB_API.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header("X-GitHub-Api-Version", "2022-11-28");
        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    async fn search_page<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<T>, SearchError> {
        let request = self
            .client
            .get(format!("{}/search/{}", self.base_url, endpoint))
            .header("Accept", "application/vnd.github+json")
            .query(params);
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| SearchError::Http(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            warn!(endpoint, "GitHub API rate limit exceeded");
            return Ok(Vec::new());
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SearchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let page: SearchPage<T> = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(e.to_string()))?;
        Ok(page.items)
    }

    /// Fetch a file's raw content. Failures yield `None`.
    async fn file_content(&self, api_url: &str) -> Option<String> {
        if api_url.is_empty() {
            return None;
        }
        let request = self
            .client
            .get(api_url)
            .header("Accept", "application/vnd.github.raw+json");
        match self.authorized(request).send().await {
            Ok(response) if response.status().is_success() => response.text().await.ok(),
            Ok(response) => {
                debug!(status = %response.status(), api_url, "file content unavailable");
                None
            }
            Err(e) => {
                debug!(error = %e, api_url, "failed to fetch file content");
                None
            }
        }
    }
}

/// Cap `content` at `MAX_CONTENT_CHARS`, marking the cut.
fn truncate_content(content: String) -> String {
    if content.chars().count() <= MAX_CONTENT_CHARS {
        return content;
    }
    let mut cut: String = content.chars().take(MAX_CONTENT_CHARS).collect();
    cut.push_str("\n# ... (truncated)");
    cut
}

#[async_trait]
impl CodeSearchProvider for GitHubCodeSearch {
    async fn search_code(&self, topic: &str) -> Result<Vec<CodeResult>, SearchError> {
        let q = format!("{} language:{}", topic, self.language);

        let code_items: Vec<CodeItem> = self
            .search_page(
                "code",
                &[
                    ("q", q.clone()),
                    ("per_page", self.max_results.min(30).to_string()),
                    ("sort", "indexed".to_string()),
                ],
            )
            .await?;

        let mut results = Vec::new();
        for item in code_items.into_iter().take(self.max_results) {
            let Some(content) = self.file_content(&item.url).await else {
                continue;
            };
            if content.is_empty() {
                continue;
            }
            results.push(CodeResult::Code {
                name: item.name,
                path: item.path,
                repository: item.repository.full_name,
                url: item.html_url,
                content: truncate_content(content),
                language: self.language.clone(),
            });
        }

        let repos: Vec<RepoItem> = self
            .search_page(
                "repositories",
                &[
                    ("q", q),
                    ("per_page", MAX_REPOSITORIES.to_string()),
                    ("sort", "stars".to_string()),
                    ("order", "desc".to_string()),
                ],
            )
            .await?;

        results.extend(repos.into_iter().take(MAX_REPOSITORIES).map(|repo| {
            CodeResult::Repository {
                name: repo.name,
                full_name: repo.full_name,
                description: repo.description.unwrap_or_default(),
                url: repo.html_url,
                stars: repo.stargazers_count,
            }
        }));

        info!(count = results.len(), topic, "code search complete");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_content_is_untouched() {
        assert_eq!(truncate_content("print(1)".to_string()), "print(1)");
    }

    #[test]
    fn long_content_is_capped_and_marked() {
        let long = "x".repeat(MAX_CONTENT_CHARS + 10);
        let cut = truncate_content(long);
        assert!(cut.starts_with(&"x".repeat(MAX_CONTENT_CHARS)));
        assert!(cut.ends_with("# ... (truncated)"));
    }

    #[test]
    fn parses_repository_page() {
        let body = r#"{"total_count": 1, "items": [
            {"name": "dgl", "full_name": "dmlc/dgl", "description": null,
             "html_url": "https://github.com/dmlc/dgl", "stargazers_count": 13000}
        ]}"#;
        let page: SearchPage<RepoItem> = serde_json::from_str(body).unwrap();
        assert_eq!(page.items[0].full_name, "dmlc/dgl");
        assert!(page.items[0].description.is_none());
    }

    #[test]
    fn empty_token_counts_as_none() {
        let search = GitHubCodeSearch::new(Some(String::new()), "python", 3);
        assert!(search.token.is_none());
    }
}
