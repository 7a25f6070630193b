//! Structured-extraction oracle: the text-generation service behind every
//! extraction, expansion and inference call.
//!
//! Defines the client trait, request and error types. Two implementations:
//! - `OpenAiOracle`: chat-completions over HTTP (production)
//! - `MockOracle`: returns scripted responses keyed on prompt content (testing)
//!
//! The oracle returns raw text. Callers decode it with [`payload::decode`],
//! which strips markdown code fences and fails closed on schema mismatches.

mod openai;
pub mod payload;

pub use openai::OpenAiOracle;

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// One structured-output request.
#[derive(Debug, Clone)]
pub struct OracleRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f32,
}

impl OracleRequest {
    pub fn new(
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            temperature,
        }
    }
}

/// Errors from oracle calls.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OracleError {
    /// The service cannot be reached at all (connection refused, bad credentials)
    #[error("oracle not available: {0}")]
    Unavailable(String),
    /// The service answered with an error for this call
    #[error("invocation failed: {0}")]
    InvocationFailed(String),
    /// The response did not match the expected schema
    #[error("response parse error: {0}")]
    Parse(String),
    #[error("oracle call timed out after {0:?}")]
    Timeout(Duration),
}

impl OracleError {
    /// True for failures that mean no call can succeed.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Client trait for the structured-extraction oracle.
///
/// Abstracts over transport so pipeline stages don't depend on how the
/// text-generation service is reached.
#[async_trait]
pub trait StructuredOracle: Send + Sync {
    /// Send a request and return the raw response text (expected to be JSON).
    async fn generate(&self, request: &OracleRequest) -> Result<String, OracleError>;
}

/// A scripted reply for the mock.
struct Rule {
    needle: String,
    reply: Result<String, OracleError>,
    delay: Option<Duration>,
}

/// Mock oracle for testing. Replies are chosen by substring match on the
/// user prompt, so concurrent calls get deterministic answers.
pub struct MockOracle {
    rules: Vec<Rule>,
    fallback: Option<Result<String, OracleError>>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl Default for MockOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl MockOracle {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            fallback: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock whose every call fails as unreachable.
    pub fn unavailable() -> Self {
        Self::new().otherwise_fail(OracleError::Unavailable(
            "mock oracle configured as unavailable".to_string(),
        ))
    }

    /// Reply with `response` when the user prompt contains `needle`.
    pub fn respond_when(mut self, needle: impl Into<String>, response: impl Into<String>) -> Self {
        self.rules.push(Rule {
            needle: needle.into(),
            reply: Ok(response.into()),
            delay: None,
        });
        self
    }

    /// Fail with `error` when the user prompt contains `needle`.
    pub fn fail_when(mut self, needle: impl Into<String>, error: OracleError) -> Self {
        self.rules.push(Rule {
            needle: needle.into(),
            reply: Err(error),
            delay: None,
        });
        self
    }

    /// Like `respond_when`, but sleep for `delay` before replying.
    pub fn respond_slowly_when(
        mut self,
        needle: impl Into<String>,
        response: impl Into<String>,
        delay: Duration,
    ) -> Self {
        self.rules.push(Rule {
            needle: needle.into(),
            reply: Ok(response.into()),
            delay: Some(delay),
        });
        self
    }

    /// Reply used when no rule matches.
    pub fn otherwise(mut self, response: impl Into<String>) -> Self {
        self.fallback = Some(Ok(response.into()));
        self
    }

    /// Failure used when no rule matches.
    pub fn otherwise_fail(mut self, error: OracleError) -> Self {
        self.fallback = Some(Err(error));
        self
    }

    /// Number of calls received so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// User prompts received so far, in arrival order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl StructuredOracle for MockOracle {
    async fn generate(&self, request: &OracleRequest) -> Result<String, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(request.user_prompt.clone());
        }

        let rule = self
            .rules
            .iter()
            .find(|r| request.user_prompt.contains(&r.needle));

        match rule {
            Some(rule) => {
                if let Some(delay) = rule.delay {
                    tokio::time::sleep(delay).await;
                }
                rule.reply.clone()
            }
            None => self.fallback.clone().unwrap_or_else(|| {
                Err(OracleError::InvocationFailed(
                    "no mock response matches prompt".to_string(),
                ))
            }),
        }
    }
}
