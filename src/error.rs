//! Fatal pipeline errors
//!
//! Everything recoverable is recorded in the run's error list instead.

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// No oracle call could reach the service
    #[error("extraction oracle unreachable: {0}")]
    OracleUnavailable(String),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
