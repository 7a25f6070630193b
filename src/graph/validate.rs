//! Data-quality checks over concepts and relationships
//!
//! These never reject anything; they return human-readable issues for logging.

use super::concept::Concept;
use super::relationship::Relationship;
use std::collections::HashSet;

/// Report concepts with empty names, missing descriptions, or uncited facts.
pub fn validate_concepts(concepts: &[Concept]) -> Vec<String> {
    let mut issues = Vec::new();
    for concept in concepts {
        if concept.name.is_empty() {
            issues.push("Concept with empty name found".to_string());
        }
        if concept.description.is_empty() {
            issues.push(format!("Concept '{}' missing description", concept.name));
        }
        if concept.citations.is_empty() && !concept.is_inferred {
            issues.push(format!("Concept '{}' missing citations", concept.name));
        }
    }
    issues
}

/// Report relationships whose endpoints are not in `concepts`, and uncited facts.
pub fn validate_relationships(relationships: &[Relationship], concepts: &[Concept]) -> Vec<String> {
    let names: HashSet<&str> = concepts.iter().map(|c| c.name.as_str()).collect();
    let mut issues = Vec::new();
    for rel in relationships {
        if !names.contains(rel.source.as_str()) {
            issues.push(format!("Relationship references unknown source: {}", rel.source));
        }
        if !names.contains(rel.target.as_str()) {
            issues.push(format!("Relationship references unknown target: {}", rel.target));
        }
        if !rel.is_inferred && rel.citations.is_empty() {
            issues.push(format!(
                "Non-inferred relationship missing citations: {} -> {}",
                rel.source, rel.target
            ));
        }
    }
    issues
}
