//! rkg: research knowledge-graph generator
//!
//! Turns a free-text research topic into a deduplicated, relevance-ranked set
//! of concepts and relationships, written out as linked markdown pages.
//!
//! # Pipeline
//!
//! - **Queries**: the oracle proposes web search queries for the topic
//! - **Search**: web results (and optionally code) are collected per query
//! - **Extraction**: results are split into batches, extracted concurrently,
//!   then canonicalized and merged into one concept set
//! - **Expansion**: the root concept's key components become concepts
//! - **Relationships**: the oracle links the concepts
//! - **Render**: one markdown page per concept
//!
//! # Example
//!
//! ```
//! use rkg::Normalizer;
//!
//! let mut normalizer = Normalizer::new();
//! assert_eq!(normalizer.normalize("large language models"), "Large Language Model");
//! ```

pub mod canon;
pub mod config;
pub mod error;
pub mod graph;
pub mod oracle;
pub mod pipeline;
pub mod search;

pub use canon::{merge_concepts, Normalizer, SingularizePolicy};
pub use config::{ConfigError, Settings};
pub use error::{PipelineError, Result};
pub use graph::{Citation, Concept, ConceptType, RelationType, Relationship};
pub use oracle::{MockOracle, OpenAiOracle, OracleError, OracleRequest, StructuredOracle};
pub use pipeline::{MarkdownRenderer, Pipeline, ResearchState, Stage, StateUpdate};
pub use search::{CodeResult, SearchError, SearchProvider, SearchResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
