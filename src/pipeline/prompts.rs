//! Prompt templates for the oracle calls

use crate::graph::Concept;
use crate::oracle::payload::{schema_hint, ExtractionPayload, QueryPayload, RelationshipPayload};
use crate::search::SearchResult;

const QUERY_SYSTEM: &str = "You are a research assistant specialized in generating effective web search queries.

Generate diverse, specific search queries that gather comprehensive information about a research topic.

Requirements:
- Generate 3-5 search queries
- Mix broad overview queries with specific technical queries
- Include queries for definitions, applications, and recent developments
- Avoid redundant queries
- Return valid JSON";

const EXTRACTION_SYSTEM: &str = "You are an expert at extracting structured knowledge from text for educational and implementation purposes.

Extract key concepts with detailed explanations that help a reader understand and implement the technology.

Requirements:
- Extract only the most significant concepts directly relevant to the research topic
- Classify each concept by type: technology, method, person, organization, field, application, metric, library, framework, project, concept, tool, language, algorithm, pattern
- Descriptions explain what the concept is, how it works and which problems it solves
- key_components entries use the form \"Name: short explanation\"
- Include alternative names in aliases
- Use only facts stated in the sources

Relevance scores (0.0-1.0):
- 1.0: the research topic itself or a true synonym
- 0.8-0.9: core components essential to the topic
- 0.6-0.7: techniques directly used by the topic
- 0.4-0.5: application domains or related methods
- below 0.4: do not include
A concept whose name merely contains the topic name is not a core component.

Optional fields (technical_details, key_components, implementation_notes, use_cases) are included only when the sources support them.
Return valid JSON";

const RELATIONSHIP_SYSTEM: &str = "You are an expert at identifying relationships between concepts.

Identify explicit relationships (stated in sources) and inferred relationships (logical connections).

Relationship types:
- is_a: type or inheritance (\"GNN is_a Neural Network\")
- uses: usage (\"GNN uses Message Passing\")
- part_of: component (\"Attention Mechanism part_of Transformer\")
- developed_by: attribution (\"GraphSAGE developed_by Stanford\")
- applied_to: application domain (\"GNN applied_to Drug Discovery\")
- improves: enhancement (\"GAT improves GCN\")
- related_to: anything else

Requirements:
- is_inferred=false only for relationships explicitly stated in the sources, with their source_urls
- is_inferred=true for relationships you infer
- Descriptions are 2-4 sentences on how and why the concepts connect
- confidence is between 0.0 and 1.0
- Return valid JSON";

fn with_schema(prompt: &str, schema: String) -> String {
    format!("{}\n\nResponse JSON schema:\n{}", prompt, schema)
}

pub fn query_system() -> String {
    with_schema(QUERY_SYSTEM, schema_hint::<QueryPayload>())
}

pub fn query_user(topic: &str) -> String {
    format!(
        "Research Topic: {}\n\nGenerate effective search queries to research this topic comprehensively.",
        topic
    )
}

pub fn extraction_system() -> String {
    with_schema(EXTRACTION_SYSTEM, schema_hint::<ExtractionPayload>())
}

pub fn extraction_user(topic: &str, results_text: &str) -> String {
    format!(
        "Research Topic: {}\n\nSearch Results:\n{}\n\nExtract key concepts and entities from these search results.",
        topic, results_text
    )
}

pub fn relationship_system() -> String {
    with_schema(RELATIONSHIP_SYSTEM, schema_hint::<RelationshipPayload>())
}

pub fn relationship_user(concepts: &[Concept], context: &str) -> String {
    let listing: Vec<String> = concepts
        .iter()
        .map(|c| format!("- {} ({}): {}", c.name, c.concept_type, c.description))
        .collect();
    format!(
        "Concepts:\n{}\n\nContext from Search Results:\n{}\n\nIdentify relationships between these concepts. Clearly distinguish facts from inferences.",
        listing.join("\n"),
        context
    )
}

/// Render search results as prompt context.
pub fn format_results(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| format!("Source: {}\nURL: {}\nContent: {}", r.title, r.url, r.description))
        .collect::<Vec<_>>()
        .join("\n\n")
}
