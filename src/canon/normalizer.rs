//! Concept name canonicalization
//!
//! Maps raw concept names onto one canonical spelling per run. The normalizer
//! is memoized: once a name has been canonicalized, every equivalent spelling
//! (plural, lowercase, accented, with or without a parenthetical acronym)
//! resolves to the same string.
//!
//! The memo tables are plain maps behind `&mut self`. Callers that fan out
//! concurrent work must normalize only after fan-in.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// How a trailing "s" is treated when building the singular lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SingularizePolicy {
    /// Drop a trailing "s" from any name longer than three characters.
    /// "Networks" -> "Network", but also "Gauss" -> "Gaus".
    #[default]
    Legacy,
    /// As `Legacy`, but leave names ending in "ss", "us" or "is" alone.
    Conservative,
}

impl SingularizePolicy {
    /// Return `name` without its plural "s", or `None` if it stays as is.
    fn strip<'a>(&self, name: &'a str) -> Option<&'a str> {
        let lower = name.to_lowercase();
        if !lower.ends_with('s') || lower.chars().count() <= 3 {
            return None;
        }
        if *self == Self::Conservative
            && (lower.ends_with("ss") || lower.ends_with("us") || lower.ends_with("is"))
        {
            return None;
        }
        // The last char is an ASCII 's' or 'S', one byte wide.
        Some(&name[..name.len() - 1])
    }
}

/// Memoized concept-name normalizer.
#[derive(Debug, Default, Clone)]
pub struct Normalizer {
    /// lookup key (lowercase) -> canonical name
    canonical_map: HashMap<String, String>,
    known_concepts: BTreeSet<String>,
    policy: SingularizePolicy,
}

/// Lookup keys derived from one raw name.
struct Keys {
    singular: String,
    plain: String,
    original: String,
    acronym: Option<String>,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: SingularizePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Canonicalize `raw_name`, registering every equivalent form.
    pub fn normalize(&mut self, raw_name: &str) -> String {
        let cleaned = fold_accents(&collapse_whitespace(raw_name));

        let (stripped, parenthetical) = split_trailing_parenthetical(&cleaned);
        let (base, acronym) = match parenthetical {
            Some(inner) => pair_acronym(stripped, inner),
            None => (stripped, None),
        };

        let plain = base.to_lowercase();
        let singular = match self.policy.strip(&plain) {
            Some(s) => s.to_string(),
            None => plain.clone(),
        };
        let keys = Keys {
            singular,
            plain,
            original: cleaned.to_lowercase(),
            acronym: acronym.map(str::to_lowercase),
        };

        if let Some(existing) = self.lookup(&keys) {
            self.register(&keys, &existing);
            return existing;
        }

        let canonical = if is_acronym(base) {
            base.to_string()
        } else {
            match self.policy.strip(base) {
                Some(singular) => title_case(singular),
                None => title_case(base),
            }
        };

        self.register(&keys, &canonical);
        canonical
    }

    /// Register `alias` as another spelling of `canonical`.
    pub fn add_alias(&mut self, alias: &str, canonical: &str) {
        self.canonical_map
            .insert(alias.to_lowercase(), canonical.to_string());
        self.known_concepts.insert(canonical.to_string());
    }

    /// Every canonical name produced so far.
    pub fn known_concepts(&self) -> &BTreeSet<String> {
        &self.known_concepts
    }

    /// The cleaned input is tried first: a canonical that kept a
    /// parenthetical must resolve to itself, not to its stripped base.
    fn lookup(&self, keys: &Keys) -> Option<String> {
        [
            Some(&keys.original),
            Some(&keys.singular),
            Some(&keys.plain),
            keys.acronym.as_ref(),
        ]
            .into_iter()
            .flatten()
            .find_map(|key| self.canonical_map.get(key))
            .cloned()
    }

    /// Point every key at `canonical` without overwriting existing entries.
    fn register(&mut self, keys: &Keys, canonical: &str) {
        let all = [
            Some(&keys.singular),
            Some(&keys.plain),
            Some(&keys.original),
            keys.acronym.as_ref(),
        ];
        for key in all.into_iter().flatten() {
            self.canonical_map
                .entry(key.clone())
                .or_insert_with(|| canonical.to_string());
        }
        self.canonical_map
            .entry(canonical.to_lowercase())
            .or_insert_with(|| canonical.to_string());
        self.known_concepts.insert(canonical.to_string());
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decompose, drop combining marks, recompose: "Fréchet" -> "Frechet".
fn fold_accents(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).nfc().collect()
}

/// Split "Name (Inner)" into ("Name", Some("Inner")).
///
/// Only one group, and only when it closes the string.
pub(crate) fn split_trailing_parenthetical(s: &str) -> (&str, Option<&str>) {
    let trimmed = s.trim_end();
    let Some(without_close) = trimmed.strip_suffix(')') else {
        return (trimmed, None);
    };
    match without_close.rfind('(') {
        Some(open) => (
            without_close[..open].trim_end(),
            Some(without_close[open + 1..].trim()),
        ),
        None => (trimmed, None),
    }
}

/// 2–5 ASCII uppercase letters.
fn is_acronym(s: &str) -> bool {
    (2..=5).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_uppercase())
}

fn initials(phrase: &str) -> String {
    phrase
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Resolve "ACR (Expansion)" / "Expansion (ACR)" to the expansion as base.
///
/// Returns (base, acronym). Pairs only when the acronym spells the expansion's
/// initials; otherwise the parenthetical is dropped.
fn pair_acronym<'a>(outer: &'a str, inner: &'a str) -> (&'a str, Option<&'a str>) {
    if is_acronym(outer) && !is_acronym(inner) && initials(inner) == outer {
        return (inner, Some(outer));
    }
    if is_acronym(inner) && initials(outer) == inner {
        return (outer, Some(inner));
    }
    (outer, None)
}

/// Uppercase the first letter of every alphabetic run, lowercase the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_and_title_cases() {
        let mut n = Normalizer::new();
        assert_eq!(n.normalize("  graph   neural\tnetwork "), "Graph Neural Network");
    }

    #[test]
    fn strips_accents() {
        let mut n = Normalizer::new();
        assert_eq!(n.normalize("Fréchet distance"), "Frechet Distance");
        assert_eq!(n.normalize("frechet distance"), "Frechet Distance");
    }

    #[test]
    fn strips_trailing_parenthetical() {
        let mut n = Normalizer::new();
        assert_eq!(n.normalize("Vision Transformer (ViT)"), "Vision Transformer");
        assert_eq!(n.normalize("Transformer (2017 paper)"), "Transformer");
    }

    #[test]
    fn keeps_acronyms_verbatim() {
        let mut n = Normalizer::new();
        assert_eq!(n.normalize("BERT"), "BERT");
        assert_eq!(n.normalize("bert"), "BERT");
        // six letters is not an acronym
        assert_eq!(n.normalize("ABCDEF"), "Abcdef");
    }

    #[test]
    fn plural_converges_with_singular() {
        let mut n = Normalizer::new();
        let plural = n.normalize("Graph Neural Networks");
        assert_eq!(plural, "Graph Neural Network");
        assert_eq!(n.normalize("graph neural network"), plural);
        assert_eq!(n.normalize("GRAPH NEURAL NETWORKS"), plural);
    }

    #[test]
    fn acronym_with_expansion_converges_in_any_order() {
        let forms = [
            "GNN (Graph Neural Network)",
            "Graph Neural Networks",
            "graph neural network",
            "Graph Neural Network (GNN)",
            "GNN",
        ];

        for start in 0..forms.len() {
            let mut n = Normalizer::new();
            let results: Vec<String> = forms
                .iter()
                .cycle()
                .skip(start)
                .take(forms.len())
                .map(|f| n.normalize(f))
                .collect();
            assert!(
                results.iter().all(|r| r == &results[0]),
                "forms diverged starting at {}: {:?}",
                start,
                results
            );
        }
    }

    #[test]
    fn acronym_without_matching_initials_is_not_paired() {
        let mut n = Normalizer::new();
        assert_eq!(n.normalize("BERT (language model)"), "BERT");
        assert_eq!(n.normalize("language model"), "Language Model");
    }

    #[test]
    fn normalize_is_idempotent() {
        let inputs = [
            "Graph Neural Networks",
            "GNN (Graph Neural Network)",
            "Fréchet Inception Distance",
            "self-attention",
            "Process",
            "Gauss",
            "iPhone",
            "Straße",
            "",
            "  ",
            "k-means (clustering)",
        ];
        let mut n = Normalizer::new();
        for input in inputs {
            let once = n.normalize(input);
            let twice = n.normalize(&once);
            assert_eq!(once, twice, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn canonical_with_remaining_parenthetical_is_a_fixed_point() {
        let mut n = Normalizer::new();
        let inputs = [
            "Transformer (deep learning) (2017)",
            "BERT (language model) (Google)",
            "k-means (clustering) (Lloyd)",
            "Attention (ML) (Transformers)",
        ];
        for input in inputs {
            let once = n.normalize(input);
            assert_eq!(n.normalize(&once), once, "not a fixed point for {:?}", input);
            assert_eq!(n.normalize(input), once);
        }
        assert_eq!(n.normalize("Transformer (deep learning) (2017)"), "Transformer (Deep Learning)");
    }

    #[test]
    fn stripped_base_seen_first_still_keeps_parenthetical_canonical_stable() {
        let mut n = Normalizer::new();
        assert_eq!(n.normalize("Transformer"), "Transformer");
        let once = n.normalize("Transformer (deep learning) (2017)");
        assert_eq!(n.normalize(&once), once);
    }

    #[test]
    fn empty_input_yields_empty_name() {
        let mut n = Normalizer::new();
        assert_eq!(n.normalize(""), "");
        assert_eq!(n.normalize("   "), "");
    }

    #[test]
    fn legacy_policy_singularizes_any_long_s_word() {
        let mut n = Normalizer::new();
        assert_eq!(n.normalize("Gauss"), "Gaus");
        assert_eq!(n.normalize("Bias"), "Bia");
        // three characters or fewer are left alone
        assert_eq!(n.normalize("gas"), "Gas");
    }

    #[test]
    fn conservative_policy_leaves_ss_us_is_endings() {
        let mut n = Normalizer::with_policy(SingularizePolicy::Conservative);
        assert_eq!(n.normalize("Gauss"), "Gauss");
        assert_eq!(n.normalize("Corpus"), "Corpus");
        assert_eq!(n.normalize("Analysis"), "Analysis");
        assert_eq!(n.normalize("Transformers"), "Transformer");
    }

    #[test]
    fn title_case_matches_word_boundaries() {
        assert_eq!(title_case("self-attention"), "Self-Attention");
        assert_eq!(title_case("gpt-4 turbo"), "Gpt-4 Turbo");
        assert_eq!(title_case("3d vision"), "3D Vision");
    }

    #[test]
    fn add_alias_resolves_to_canonical() {
        let mut n = Normalizer::new();
        let canonical = n.normalize("Large Language Model");
        n.add_alias("LLM", &canonical);
        assert_eq!(n.normalize("llm"), canonical);
        assert!(n.known_concepts().contains(&canonical));
    }

    #[test]
    fn split_parenthetical_only_trailing() {
        assert_eq!(
            split_trailing_parenthetical("Graph Neural Network (GNN)"),
            ("Graph Neural Network", Some("GNN"))
        );
        assert_eq!(
            split_trailing_parenthetical("f(x) smoothing"),
            ("f(x) smoothing", None)
        );
        assert_eq!(split_trailing_parenthetical("odd)"), ("odd)", None));
    }
}
