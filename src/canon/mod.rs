//! Canonicalization: concept name normalization and duplicate merging

mod merge;
mod normalizer;

pub use merge::merge_concepts;
pub use normalizer::{Normalizer, SingularizePolicy};

pub(crate) use normalizer::split_trailing_parenthetical;
