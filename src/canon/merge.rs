//! Concept merge engine
//!
//! Folds duplicate concept records into one record per canonical name.
//!
//! Precedence within a group:
//! - The highest `relevance_score` wins description, type and detail fields;
//!   ties go to the first-seen record.
//! - Aliases are unioned, plus every member's raw name that differs from the
//!   canonical name. The canonical name itself is never an alias.
//! - Citations are unioned by URL in input order; the first occurrence wins.
//! - Fields the winner lacks are filled from the losers, best score first.

use super::normalizer::Normalizer;
use crate::graph::{union_citations, Concept};
use std::collections::HashMap;

/// Merge `concepts` by canonical name. Output is in first-seen group order.
pub fn merge_concepts(concepts: Vec<Concept>, normalizer: &mut Normalizer) -> Vec<Concept> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<Concept>> = HashMap::new();

    for concept in concepts {
        let canonical = normalizer.normalize(&concept.name);
        groups
            .entry(canonical.clone())
            .or_insert_with(|| {
                order.push(canonical);
                Vec::new()
            })
            .push(concept);
    }

    order
        .into_iter()
        .filter_map(|name| {
            let members = groups.remove(&name)?;
            Some(merge_group(name, members))
        })
        .collect()
}

fn merge_group(canonical: String, members: Vec<Concept>) -> Concept {
    let winner_idx = members
        .iter()
        .enumerate()
        .fold(0, |best, (i, c)| {
            if c.relevance_score > members[best].relevance_score {
                i
            } else {
                best
            }
        });

    // Input-order passes: aliases, citations, inferred flag.
    let mut aliases = std::collections::BTreeSet::new();
    let mut citations = Vec::new();
    let mut all_inferred = true;
    for member in &members {
        if member.name != canonical {
            aliases.insert(member.name.clone());
        }
        aliases.extend(member.aliases.iter().cloned());
        union_citations(&mut citations, member.citations.iter().cloned());
        all_inferred &= member.is_inferred;
    }
    aliases.remove(&canonical);
    aliases.remove("");

    let mut members = members;
    let mut merged = members.remove(winner_idx);
    let mut losers = members;
    losers.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));

    merged.name = canonical;
    merged.aliases = aliases;
    merged.citations = citations;
    merged.is_inferred = all_inferred;

    let lacks_components = merged.key_components.is_empty();
    let lacks_use_cases = merged.use_cases.is_empty();
    let lacks_snippets = merged.code_snippets.is_empty();
    let lacks_pseudocode = merged.pseudocode.is_empty();

    for loser in losers {
        if merged.description.is_empty() && !loser.description.is_empty() {
            merged.description = loser.description;
        }
        if merged.technical_details.is_none() {
            merged.technical_details = loser.technical_details;
        }
        if merged.implementation_notes.is_none() {
            merged.implementation_notes = loser.implementation_notes;
        }
        if merged.logic_flow.is_none() {
            merged.logic_flow = loser.logic_flow;
        }
        if lacks_components {
            union_into(&mut merged.key_components, loser.key_components);
        }
        if lacks_use_cases {
            union_into(&mut merged.use_cases, loser.use_cases);
        }
        if lacks_snippets {
            union_into(&mut merged.code_snippets, loser.code_snippets);
        }
        if lacks_pseudocode {
            union_into(&mut merged.pseudocode, loser.pseudocode);
        }
    }

    merged
}

fn union_into<T: PartialEq>(target: &mut Vec<T>, incoming: Vec<T>) {
    for item in incoming {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}
