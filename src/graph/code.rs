//! Code snippets and algorithm descriptions attached to concepts

use serde::{Deserialize, Serialize};

/// Programming language of a code block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeLanguage {
    Python,
    Javascript,
    Typescript,
    Java,
    Cpp,
    C,
    Go,
    Rust,
    Sql,
    Bash,
    #[default]
    Pseudocode,
    Other,
}

impl CodeLanguage {
    const ALL: [CodeLanguage; 12] = [
        Self::Python,
        Self::Javascript,
        Self::Typescript,
        Self::Java,
        Self::Cpp,
        Self::C,
        Self::Go,
        Self::Rust,
        Self::Sql,
        Self::Bash,
        Self::Pseudocode,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Javascript => "javascript",
            Self::Typescript => "typescript",
            Self::Java => "java",
            Self::Cpp => "cpp",
            Self::C => "c",
            Self::Go => "go",
            Self::Rust => "rust",
            Self::Sql => "sql",
            Self::Bash => "bash",
            Self::Pseudocode => "pseudocode",
            Self::Other => "other",
        }
    }

    /// Lenient conversion from free text; unknown languages become `Other`.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|lang| lang.as_str() == label)
            .unwrap_or(Self::Other)
    }
}

/// A code snippet or pseudocode block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeBlock {
    #[serde(default)]
    pub language: CodeLanguage,
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub is_pseudocode: bool,
}

impl CodeBlock {
    pub fn new(language: CodeLanguage, code: impl Into<String>) -> Self {
        Self {
            language,
            code: code.into(),
            description: None,
            source_url: None,
            is_pseudocode: language == CodeLanguage::Pseudocode,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    pub fn to_markdown(&self) -> String {
        let tag = if self.is_pseudocode {
            "pseudocode"
        } else {
            self.language.as_str()
        };
        let mut lines = Vec::new();
        if let Some(description) = &self.description {
            lines.push(format!("*{}*", description));
            lines.push(String::new());
        }
        lines.push(format!("```{}", tag));
        lines.push(self.code.clone());
        lines.push("```".to_string());
        if let Some(url) = &self.source_url {
            lines.push(format!("*Source: {}*", url));
        }
        lines.join("\n")
    }
}

/// One numbered step of an algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmStep {
    pub step_number: u32,
    pub action: String,
    #[serde(default)]
    pub details: Option<String>,
}

/// Core logic flow of a concept, for re-implementation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogicFlow {
    #[serde(default)]
    pub input_spec: Vec<String>,
    #[serde(default)]
    pub output_spec: Vec<String>,
    #[serde(default)]
    pub algorithm_steps: Vec<AlgorithmStep>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub complexity: Option<String>,
}

impl LogicFlow {
    pub fn is_empty(&self) -> bool {
        self.input_spec.is_empty()
            && self.output_spec.is_empty()
            && self.algorithm_steps.is_empty()
            && self.dependencies.is_empty()
            && self.complexity.is_none()
    }

    pub fn to_markdown(&self) -> String {
        let mut lines = Vec::new();

        let mut bullet_section = |title: &str, items: &[String], code: bool| {
            if items.is_empty() {
                return;
            }
            lines.push(format!("**{}:**", title));
            for item in items {
                if code {
                    lines.push(format!("- `{}`", item));
                } else {
                    lines.push(format!("- {}", item));
                }
            }
            lines.push(String::new());
        };
        bullet_section("Inputs", &self.input_spec, false);
        bullet_section("Outputs", &self.output_spec, false);

        if !self.algorithm_steps.is_empty() {
            lines.push("**Algorithm Steps:**".to_string());
            for step in &self.algorithm_steps {
                lines.push(format!("{}. {}", step.step_number, step.action));
                if let Some(details) = &step.details {
                    lines.push(format!("   - {}", details));
                }
            }
            lines.push(String::new());
        }

        if !self.dependencies.is_empty() {
            lines.push("**Dependencies:**".to_string());
            for dep in &self.dependencies {
                lines.push(format!("- `{}`", dep));
            }
            lines.push(String::new());
        }

        if let Some(complexity) = &self.complexity {
            lines.push(format!("**Complexity:** {}", complexity));
            lines.push(String::new());
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_language_falls_back_to_other() {
        assert_eq!(CodeLanguage::from_label(" Rust "), CodeLanguage::Rust);
        assert_eq!(CodeLanguage::from_label("cobol"), CodeLanguage::Other);
    }

    #[test]
    fn pseudocode_block_uses_pseudocode_fence() {
        let block = CodeBlock::new(CodeLanguage::Pseudocode, "for x in xs: visit(x)")
            .with_description("Traversal");
        let md = block.to_markdown();
        assert!(md.starts_with("*Traversal*"));
        assert!(md.contains("```pseudocode\nfor x in xs: visit(x)\n```"));
    }

    #[test]
    fn logic_flow_renders_numbered_steps() {
        let flow = LogicFlow {
            algorithm_steps: vec![
                AlgorithmStep {
                    step_number: 1,
                    action: "Aggregate neighbours".to_string(),
                    details: Some("mean pooling".to_string()),
                },
                AlgorithmStep {
                    step_number: 2,
                    action: "Update node state".to_string(),
                    details: None,
                },
            ],
            complexity: Some("O(|E|)".to_string()),
            ..Default::default()
        };

        let md = flow.to_markdown();
        assert!(md.contains("1. Aggregate neighbours\n   - mean pooling"));
        assert!(md.contains("2. Update node state"));
        assert!(md.contains("**Complexity:** O(|E|)"));
        assert!(!flow.is_empty());
        assert!(LogicFlow::default().is_empty());
    }
}
