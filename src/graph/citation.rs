//! Source citations attached to concepts and relationships

use crate::search::SearchResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A reference to the web source a fact was taken from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub snippet: Option<String>,
    /// When the source was fetched
    pub accessed_at: DateTime<Utc>,
}

impl Citation {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            snippet: None,
            accessed_at: Utc::now(),
        }
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    /// Format as a markdown link.
    pub fn to_markdown(&self) -> String {
        format!("[{}]({})", self.title, self.url)
    }
}

impl From<&SearchResult> for Citation {
    fn from(result: &SearchResult) -> Self {
        Citation::new(&result.url, &result.title).with_snippet(&result.description)
    }
}

/// Append `incoming` citations to `existing`, skipping URLs already present.
///
/// The first occurrence of a URL keeps its title and snippet.
pub fn union_citations(existing: &mut Vec<Citation>, incoming: impl IntoIterator<Item = Citation>) {
    for citation in incoming {
        if !existing.iter().any(|c| c.url == citation.url) {
            existing.push(citation);
        }
    }
}
