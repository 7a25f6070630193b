//! Concept: a canonical entity in the research graph

use super::citation::Citation;
use super::code::{CodeBlock, LogicFlow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Fixed classification of a concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConceptType {
    Technology,
    Method,
    Person,
    Organization,
    Field,
    Application,
    Metric,
    Library,
    Framework,
    Project,
    #[default]
    Concept,
    Tool,
    Language,
    Algorithm,
    Pattern,
}

impl ConceptType {
    const ALL: [ConceptType; 15] = [
        Self::Technology,
        Self::Method,
        Self::Person,
        Self::Organization,
        Self::Field,
        Self::Application,
        Self::Metric,
        Self::Library,
        Self::Framework,
        Self::Project,
        Self::Concept,
        Self::Tool,
        Self::Language,
        Self::Algorithm,
        Self::Pattern,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Technology => "technology",
            Self::Method => "method",
            Self::Person => "person",
            Self::Organization => "organization",
            Self::Field => "field",
            Self::Application => "application",
            Self::Metric => "metric",
            Self::Library => "library",
            Self::Framework => "framework",
            Self::Project => "project",
            Self::Concept => "concept",
            Self::Tool => "tool",
            Self::Language => "language",
            Self::Algorithm => "algorithm",
            Self::Pattern => "pattern",
        }
    }

    /// Map an oracle type tag onto the enumeration.
    ///
    /// Exact names match first, then common synonyms. Anything else is `Concept`.
    pub fn from_tag(tag: &str) -> Self {
        let tag = tag.trim().to_lowercase();
        if let Some(exact) = Self::ALL.into_iter().find(|t| t.as_str() == tag) {
            return exact;
        }
        match tag.as_str() {
            "lib" | "package" | "module" | "sdk" => Self::Library,
            "api" | "platform" | "system" => Self::Technology,
            "service" => Self::Application,
            "technique" | "approach" | "process" | "model" => Self::Method,
            "standard" | "principle" | "theory" => Self::Concept,
            "architecture" | "design" => Self::Pattern,
            "company" | "institute" | "university" => Self::Organization,
            _ => Self::Concept,
        }
    }
}

impl std::fmt::Display for ConceptType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An extracted (or inferred) concept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    /// Canonical name once merged; raw oracle name before that
    pub name: String,
    pub concept_type: ConceptType,
    pub description: String,
    /// Relevance to the research topic, in [0, 1]
    pub relevance_score: f64,
    #[serde(default)]
    pub aliases: BTreeSet<String>,
    #[serde(default)]
    pub citations: Vec<Citation>,
    #[serde(default)]
    pub is_inferred: bool,

    #[serde(default)]
    pub technical_details: Option<String>,
    #[serde(default)]
    pub key_components: Vec<String>,
    #[serde(default)]
    pub implementation_notes: Option<String>,
    #[serde(default)]
    pub use_cases: Vec<String>,

    #[serde(default)]
    pub code_snippets: Vec<CodeBlock>,
    #[serde(default)]
    pub pseudocode: Vec<CodeBlock>,
    #[serde(default)]
    pub logic_flow: Option<LogicFlow>,
}

impl Concept {
    /// Create a concept with default relevance 0.5 and no details.
    pub fn new(
        name: impl Into<String>,
        concept_type: ConceptType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            concept_type,
            description: description.into(),
            relevance_score: 0.5,
            aliases: BTreeSet::new(),
            citations: Vec::new(),
            is_inferred: false,
            technical_details: None,
            key_components: Vec::new(),
            implementation_notes: None,
            use_cases: Vec::new(),
            code_snippets: Vec::new(),
            pseudocode: Vec::new(),
            logic_flow: None,
        }
    }

    /// Set the relevance score, clamped to [0, 1].
    pub fn with_relevance(mut self, score: f64) -> Self {
        self.relevance_score = clamp_unit(score);
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.insert(alias.into());
        self
    }

    pub fn with_citation(mut self, citation: Citation) -> Self {
        self.citations.push(citation);
        self
    }

    pub fn with_key_components(mut self, components: Vec<String>) -> Self {
        self.key_components = components;
        self
    }

    pub fn with_technical_details(mut self, details: impl Into<String>) -> Self {
        self.technical_details = Some(details.into());
        self
    }

    pub fn inferred(mut self) -> Self {
        self.is_inferred = true;
        self
    }

    /// Format as a Logseq wikilink.
    pub fn to_wikilink(&self) -> String {
        format!("[[{}]]", self.name)
    }
}

/// Clamp a score into [0, 1]; NaN becomes 0.
pub(crate) fn clamp_unit(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

/// Sort concepts by relevance, highest first. Stable for equal scores.
pub fn sort_by_relevance(concepts: &mut [Concept]) {
    concepts.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
}
