//! Relationship: a typed, directed link between two concept names

use super::citation::Citation;
use super::concept::clamp_unit;
use serde::{Deserialize, Serialize};

/// Relationship kinds between concepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    IsA,
    Uses,
    PartOf,
    DevelopedBy,
    AppliedTo,
    Improves,
    #[default]
    RelatedTo,
}

impl RelationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IsA => "is_a",
            Self::Uses => "uses",
            Self::PartOf => "part_of",
            Self::DevelopedBy => "developed_by",
            Self::AppliedTo => "applied_to",
            Self::Improves => "improves",
            Self::RelatedTo => "related_to",
        }
    }

    /// Parse a relation tag; unknown tags become `RelatedTo`.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "is_a" => Self::IsA,
            "uses" => Self::Uses,
            "part_of" => Self::PartOf,
            "developed_by" => Self::DevelopedBy,
            "applied_to" => Self::AppliedTo,
            "improves" => Self::Improves,
            _ => Self::RelatedTo,
        }
    }
}

impl std::fmt::Display for RelationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A relationship between two concepts, referenced by name.
///
/// Endpoints are not checked against the concept set here; see
/// [`validate_relationships`](super::validate_relationships).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub source: String,
    pub relation_type: RelationType,
    pub target: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub citations: Vec<Citation>,
    #[serde(default)]
    pub is_inferred: bool,
    /// Confidence in [0, 1]
    pub confidence: f64,
}

impl Relationship {
    pub fn new(
        source: impl Into<String>,
        relation_type: RelationType,
        target: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            relation_type,
            target: target.into(),
            description: None,
            citations: Vec::new(),
            is_inferred: false,
            confidence: 1.0,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = clamp_unit(confidence);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn inferred(mut self) -> Self {
        self.is_inferred = true;
        self
    }

    /// True if either endpoint is `name`.
    pub fn touches(&self, name: &str) -> bool {
        self.source == name || self.target == name
    }

    pub fn to_markdown(&self) -> String {
        let kind = if self.is_inferred {
            "**Inferred**"
        } else {
            "**Fact**"
        };
        let mut parts = vec![format!(
            "{}: [[{}]] {} [[{}]]",
            kind, self.source, self.relation_type, self.target
        )];
        if let Some(description) = &self.description {
            parts.push(format!("  - {}", description));
        }
        if !self.citations.is_empty() {
            let sources: Vec<String> = self.citations.iter().map(|c| c.to_markdown()).collect();
            parts.push(format!("  - Sources: {}", sources.join(", ")));
        }
        parts.join("\n")
    }
}
