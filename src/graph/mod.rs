//! Core graph data structures: concepts, relationships, and their evidence

mod citation;
mod code;
mod concept;
mod relationship;
mod validate;


pub use citation::{union_citations, Citation};
pub use code::{AlgorithmStep, CodeBlock, CodeLanguage, LogicFlow};
pub use concept::{sort_by_relevance, Concept, ConceptType};
pub use relationship::{RelationType, Relationship};
pub use validate::{validate_concepts, validate_relationships};
