//! Run settings: YAML file, then environment overrides
//!
//! Settings are plain values handed to constructors. Nothing in the crate
//! reads them from global state.

use crate::canon::SingularizePolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Substrings that mark a key as a template placeholder.
const PLACEHOLDER_PATTERNS: [&str; 4] = ["your_key", "replace_me", "api_key_here", "xxx"];

const MIN_KEY_LEN: usize = 20;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("{0} is not set")]
    MissingKey(&'static str),
    #[error("{name} appears invalid: {reason}")]
    InvalidKey { name: &'static str, reason: String },
    #[error("invalid setting: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub model: String,
    /// Override for OpenAI-compatible endpoints
    pub base_url: Option<String>,
    pub query_temperature: f32,
    pub extraction_temperature: f32,
    pub expansion_temperature: f32,
    pub relationship_temperature: f32,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4-turbo-preview".to_string(),
            base_url: None,
            query_temperature: 0.8,
            extraction_temperature: 0.6,
            expansion_temperature: 0.6,
            relationship_temperature: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub max_results_per_query: usize,
    pub max_queries_per_topic: usize,
    /// Also search code hosting for examples
    pub code_search: bool,
    pub max_code_results: usize,
    pub code_language: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results_per_query: 10,
            max_queries_per_topic: 5,
            code_search: true,
            max_code_results: 3,
            code_language: "python".to_string(),
        }
    }
}

/// Settings for the batch extraction stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub batch_size: usize,
    /// Minimum score for adopting the top concept when none matches the topic
    pub fallback_threshold: f64,
    pub batch_timeout_secs: u64,
    pub singularize: SingularizePolicy,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            fallback_threshold: 0.8,
            batch_timeout_secs: 120,
            singularize: SingularizePolicy::Legacy,
        }
    }
}

impl ExtractionConfig {
    pub fn batch_timeout(&self) -> Duration {
        Duration::from_secs(self.batch_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionConfig {
    pub component_score: f64,
    /// Make one enrichment call per component
    pub enrich: bool,
    /// Search results passed to each enrichment call
    pub context_results: usize,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            component_score: 0.85,
            enrich: true,
            context_results: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output/logseq"),
        }
    }
}

/// Everything a run needs. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub openai_api_key: Option<String>,
    pub brave_search_api_key: Option<String>,
    /// Optional; raises code-search rate limits
    pub github_token: Option<String>,
    pub oracle: OracleConfig,
    pub search: SearchConfig,
    pub extraction: ExtractionConfig,
    pub expansion: ExpansionConfig,
    pub output: OutputConfig,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            brave_search_api_key: None,
            github_token: None,
            oracle: OracleConfig::default(),
            search: SearchConfig::default(),
            extraction: ExtractionConfig::default(),
            expansion: ExpansionConfig::default(),
            output: OutputConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Default config file: `<config_dir>/rkg/config.yaml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("rkg").join("config.yaml"))
    }

    /// Parse settings from YAML text.
    pub fn from_yaml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load settings from `path`, or from the default path if it exists,
    /// then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match path {
            Some(path) => Self::read_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(default) => Self::read_file(&default)?,
                None => Self::default(),
            },
        };
        settings.apply_env(|name| std::env::var(name).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text, path)
    }

    /// Overlay environment variables. `lookup` returns a variable's value.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("OPENAI_API_KEY") {
            self.openai_api_key = Some(key);
        }
        if let Some(key) = get("BRAVE_SEARCH_API_KEY") {
            self.brave_search_api_key = Some(key);
        }
        if let Some(token) = get("GITHUB_TOKEN") {
            self.github_token = Some(token);
        }
        if let Some(model) = get("RKG_MODEL") {
            self.oracle.model = model;
        }
        if let Some(url) = get("RKG_OPENAI_BASE_URL") {
            self.oracle.base_url = Some(url);
        }
        if let Some(dir) = get("RKG_OUTPUT_DIR") {
            self.output.dir = PathBuf::from(dir);
        }
        if let Some(level) = get("RKG_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(size) = get("RKG_BATCH_SIZE") {
            self.extraction.batch_size = size
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("RKG_BATCH_SIZE={}", size)))?;
        }
        if let Some(policy) = get("RKG_SINGULARIZE") {
            self.extraction.singularize = match policy.trim().to_lowercase().as_str() {
                "legacy" => SingularizePolicy::Legacy,
                "conservative" => SingularizePolicy::Conservative,
                other => {
                    return Err(ConfigError::Invalid(format!("RKG_SINGULARIZE={}", other)));
                }
            };
        }
        Ok(())
    }

    /// Check ranges that would make a run meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.extraction.batch_size == 0 {
            return Err(ConfigError::Invalid("extraction.batch_size must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.extraction.fallback_threshold) {
            return Err(ConfigError::Invalid(
                "extraction.fallback_threshold must be within [0, 1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.expansion.component_score) {
            return Err(ConfigError::Invalid(
                "expansion.component_score must be within [0, 1]".into(),
            ));
        }
        if self.search.max_queries_per_topic == 0 {
            return Err(ConfigError::Invalid(
                "search.max_queries_per_topic must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// The validated oracle key.
    pub fn openai_key(&self) -> Result<&str, ConfigError> {
        validate_api_key("OPENAI_API_KEY", self.openai_api_key.as_deref())
    }

    /// The validated web search key.
    pub fn brave_key(&self) -> Result<&str, ConfigError> {
        validate_api_key("BRAVE_SEARCH_API_KEY", self.brave_search_api_key.as_deref())
    }
}

/// Reject empty, short, or placeholder keys. Returns the trimmed key.
pub fn validate_api_key<'a>(
    name: &'static str,
    value: Option<&'a str>,
) -> Result<&'a str, ConfigError> {
    let key = value.map(str::trim).unwrap_or_default();
    if key.is_empty() {
        return Err(ConfigError::MissingKey(name));
    }
    let len = key.chars().count();
    if len < MIN_KEY_LEN {
        return Err(ConfigError::InvalidKey {
            name,
            reason: format!(
                "too short, expected at least {} characters, got {}",
                MIN_KEY_LEN, len
            ),
        });
    }
    let lower = key.to_lowercase();
    if PLACEHOLDER_PATTERNS.iter().any(|p| lower.contains(p)) {
        return Err(ConfigError::InvalidKey {
            name,
            reason: "looks like a placeholder".to_string(),
        });
    }
    Ok(key)
}
