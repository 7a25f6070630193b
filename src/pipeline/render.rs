//! Rendering: Logseq-style markdown pages
//!
//! The main page is named after the topic. Every other concept gets its own
//! page; concept names appear as `[[wikilinks]]` so the pages link up.

use super::state::ResearchState;
use crate::graph::{Concept, Relationship};
use crate::search::CodeResult;
use chrono::Utc;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const MAX_FILENAME_CHARS: usize = 200;
const EXCERPT_CHARS: usize = 100;
const FALLBACK_STEM: &str = "untitled";

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What a renderer produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    /// Contents of the main page
    pub markdown: String,
    pub path: PathBuf,
}

/// Persists the final concepts and relationships.
pub trait Renderer: Send + Sync {
    fn render(&self, state: &ResearchState) -> Result<Rendered, RenderError>;
}

/// Make `name` safe to use as a file name.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for ch in name.chars() {
        let mapped = match ch {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c => c,
        };
        if mapped == '_' || mapped.is_whitespace() {
            pending_sep = true;
        } else {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(mapped);
        }
    }
    out.chars().take(MAX_FILENAME_CHARS).collect()
}

/// File stem for a page; names with nothing usable left become `untitled`.
fn page_stem(name: &str) -> String {
    let stem = sanitize_filename(name);
    if stem.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        stem
    }
}

fn excerpt(text: &str) -> String {
    if text.chars().count() > EXCERPT_CHARS {
        let cut: String = text.chars().take(EXCERPT_CHARS).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

fn push_section(lines: &mut Vec<String>, title: &str, body: &str) {
    lines.push(format!("## {}", title));
    lines.push(body.to_string());
    lines.push(String::new());
}

fn push_list(lines: &mut Vec<String>, title: &str, items: &[String]) {
    lines.push(format!("## {}", title));
    lines.push(String::new());
    lines.extend(items.iter().map(|item| format!("- {}", item)));
    lines.push(String::new());
}

fn push_details(lines: &mut Vec<String>, concept: &Concept) {
    if let Some(details) = &concept.technical_details {
        push_section(lines, "Technical Details", details);
    }
    if !concept.key_components.is_empty() {
        push_list(lines, "Key Components", &concept.key_components);
    }
    if let Some(notes) = &concept.implementation_notes {
        push_section(lines, "Implementation Notes", notes);
    }
    if !concept.use_cases.is_empty() {
        push_list(lines, "Use Cases", &concept.use_cases);
    }
}

/// Full page for one concept.
pub fn concept_page(concept: &Concept, relationships: &[Relationship]) -> String {
    let mut lines = vec![
        format!("# {}", concept.name),
        String::new(),
        format!("**Type**: {}", concept.concept_type),
        String::new(),
    ];
    push_section(&mut lines, "Description", &concept.description);
    push_details(&mut lines, concept);

    if let Some(flow) = concept.logic_flow.as_ref().filter(|f| !f.is_empty()) {
        lines.push("## Core Logic Flow".to_string());
        lines.push(String::new());
        lines.push(flow.to_markdown());
    }

    for (title, heading, blocks) in [
        ("Pseudocode", "Algorithm", &concept.pseudocode),
        ("Code Examples", "Example", &concept.code_snippets),
    ] {
        if blocks.is_empty() {
            continue;
        }
        lines.push(format!("## {}", title));
        lines.push(String::new());
        for (idx, block) in blocks.iter().enumerate() {
            if blocks.len() > 1 {
                lines.push(format!("### {} {}", heading, idx + 1));
                lines.push(String::new());
            }
            lines.push(block.to_markdown());
            lines.push(String::new());
        }
    }

    if !concept.aliases.is_empty() {
        let aliases: Vec<&str> = concept.aliases.iter().map(String::as_str).collect();
        lines.push(format!("**Aliases**: {}", aliases.join(", ")));
        lines.push(String::new());
    }

    if !concept.citations.is_empty() {
        lines.push("## Sources".to_string());
        lines.push(String::new());
        lines.extend(concept.citations.iter().map(|c| format!("- {}", c.to_markdown())));
        lines.push(String::new());
    }

    let touching: Vec<&Relationship> = relationships
        .iter()
        .filter(|r| r.touches(&concept.name))
        .collect();
    if !touching.is_empty() {
        lines.push("## Relationships".to_string());
        lines.push(String::new());
        lines.extend(touching.iter().map(|r| format!("- {}", r.to_markdown())));
        lines.push(String::new());
    }

    lines.join("\n")
}

fn code_result_markdown(result: &CodeResult) -> String {
    match result {
        CodeResult::Code {
            name,
            repository,
            url,
            content,
            language,
            ..
        } => format!(
            "### {} ({})\n\n*Source: [{}]({})*\n\n```{}\n{}\n```\n",
            name, repository, repository, url, language, content
        ),
        CodeResult::Repository {
            full_name,
            description,
            url,
            stars,
            ..
        } => format!("- [{}]({}) ({} stars): {}", full_name, url, stars, description),
    }
}

/// Main page for the topic.
pub fn topic_page(state: &ResearchState) -> String {
    let mut lines = vec![
        format!("# {}", state.topic),
        String::new(),
        format!(
            "*Research conducted: {}*",
            Utc::now().format("%Y-%m-%d %H:%M UTC")
        ),
        String::new(),
    ];

    // Highest relevance wins; ties keep the earlier concept.
    let main = state
        .concepts
        .iter()
        .reduce(|best, c| if c.relevance_score > best.relevance_score { c } else { best });
    if let Some(main) = main {
        push_section(&mut lines, "Description", &main.description);
        push_details(&mut lines, main);
    }

    let main_name = main.map(|c| c.name.as_str()).unwrap_or_default();
    let mut related: Vec<&Concept> = state
        .concepts
        .iter()
        .filter(|c| c.name != main_name)
        .collect();
    related.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
    if !related.is_empty() {
        lines.push("## Related Concepts".to_string());
        lines.push(String::new());
        lines.extend(
            related
                .iter()
                .map(|c| format!("- {}: {}", c.to_wikilink(), excerpt(&c.description))),
        );
        lines.push(String::new());
    }

    lines.push("## Relationships".to_string());
    lines.push(String::new());
    lines.push("### Facts (Extracted from Sources)".to_string());
    lines.extend(
        state
            .relationships
            .iter()
            .filter(|r| !r.is_inferred)
            .map(|r| format!("- {}", r.to_markdown())),
    );
    lines.push(String::new());
    lines.push("### Inferred Relationships".to_string());
    lines.extend(
        state
            .relationships
            .iter()
            .filter(|r| r.is_inferred)
            .map(|r| format!("- {}", r.to_markdown())),
    );
    lines.push(String::new());

    if !state.code_results.is_empty() {
        lines.push("## Code Examples".to_string());
        lines.push(String::new());
        lines.extend(state.code_results.iter().map(code_result_markdown));
        lines.push(String::new());
    }

    // Sorted by title, then URL; one line per distinct source.
    let sources: BTreeSet<(&str, &str)> = state
        .concepts
        .iter()
        .flat_map(|c| &c.citations)
        .map(|c| (c.title.as_str(), c.url.as_str()))
        .collect();
    lines.push("## Sources".to_string());
    lines.push(String::new());
    lines.extend(sources.iter().map(|(title, url)| format!("- [{}]({})", title, url)));
    lines.push(String::new());

    lines.join("\n")
}

/// Writes one markdown file per concept into a directory.
pub struct MarkdownRenderer {
    output_dir: PathBuf,
}

impl MarkdownRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), RenderError> {
        std::fs::write(path, contents).map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Renderer for MarkdownRenderer {
    fn render(&self, state: &ResearchState) -> Result<Rendered, RenderError> {
        std::fs::create_dir_all(&self.output_dir).map_err(|source| RenderError::Io {
            path: self.output_dir.clone(),
            source,
        })?;

        let main_stem = page_stem(&state.topic);
        let main_path = self.output_dir.join(format!("{}.md", main_stem));
        let markdown = topic_page(state);
        self.write(&main_path, &markdown)?;

        // Lowercased, so case-insensitive file systems never merge two pages.
        let mut taken: HashSet<String> = HashSet::from([main_stem.to_lowercase()]);
        for concept in &state.concepts {
            if concept.name.trim().is_empty() {
                continue;
            }
            let base = page_stem(&concept.name);
            if base == main_stem {
                continue;
            }
            let mut stem = base.clone();
            let mut n = 2;
            while !taken.insert(stem.to_lowercase()) {
                stem = format!("{}_{}", base, n);
                n += 1;
            }
            if stem != base {
                warn!(concept = %concept.name, stem = %stem, "page name collision, renamed");
            }
            let path = self.output_dir.join(format!("{}.md", stem));
            self.write(&path, &concept_page(concept, &state.relationships))?;
            debug!(path = %path.display(), "wrote concept page");
        }

        info!(path = %main_path.display(), pages = state.concepts.len(), "rendered markdown");
        Ok(Rendered {
            markdown,
            path: main_path,
        })
    }
}
