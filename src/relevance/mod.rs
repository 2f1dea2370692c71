//! Query-time relevance resolution.
//!
//! Given a hit's page index and the query's stem/synonym sets aggregated
//! across all translated language variants, this module computes which page
//! terms and which reading-order positions justify the hit. Resolution is
//! read-only over page indices and pure: it never fails on empty inputs.

use crate::geometry;
use crate::index::PageIndex;
use crate::stem::{self, StemEntry};
use crate::synonym::{self, SynonymEntry};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One translated variant of a query phrase, as supplied by the external
/// translation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationVariant {
    /// ISO 639-1 code of this variant
    pub language_code: String,
    /// The variant's words
    pub content: Vec<String>,
}

/// The query's term data for one phrase, aggregated across all of its
/// translation variants. Transient: built per request, discarded after the
/// response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryTermSet {
    /// Stem → surface terms and languages, union-merged over variants
    pub stems: BTreeMap<String, StemEntry>,
    /// Query word → its stem, across all variants
    pub stem_map: BTreeMap<String, String>,
    /// Lower-cased union of all translated surface terms
    pub flat_terms: BTreeSet<String>,
    /// Synonym entries matching the query
    pub synonyms: Vec<SynonymEntry>,
}

impl QueryTermSet {
    /// Aggregate stems, stem map and flat terms over all translation
    /// variants of a query phrase.
    pub fn from_translations(
        variants: &[TranslationVariant],
        synonyms: Vec<SynonymEntry>,
    ) -> Self {
        let mut set = QueryTermSet {
            synonyms,
            ..Default::default()
        };
        for variant in variants {
            let words: Vec<&str> = variant.content.iter().map(String::as_str).collect();
            stem::merge_stems(
                &mut set.stems,
                stem::stems_for_words(words.iter().copied(), &variant.language_code),
            );
            set.stem_map
                .extend(stem::stem_map_for_words(words.iter().copied(), &variant.language_code));
            set.flat_terms
                .extend(variant.content.iter().map(|term| term.to_lowercase()));
        }
        set
    }
}

/// The page terms and reading-order positions considered relevant for one
/// hit. Positions are page-relative indices into the page's flattened
/// reading-order word sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelevantTermSet {
    /// Relevant surface words (stem matches plus synonym matches)
    pub terms: BTreeSet<String>,
    /// Page-relative positions of synonym phrase matches
    pub positions: BTreeSet<usize>,
}

/// Extend a stem table so hyphenated stems also register under each
/// hyphen-split part, letting a partial match on either half of a compound
/// stem succeed. Collisions with existing stems union-merge, never overwrite.
pub fn extend_hyphenated_stems(
    stems: &BTreeMap<String, StemEntry>,
) -> BTreeMap<String, StemEntry> {
    let mut extended = stems.clone();
    for (stem_key, entry) in stems {
        if !stem_key.contains('-') {
            continue;
        }
        for part in stem_key.split('-').filter(|p| !p.is_empty()) {
            let merged = extended.entry(part.to_string()).or_default();
            merged.terms.extend(entry.terms.iter().cloned());
            merged.languages.extend(entry.languages.iter().cloned());
        }
    }
    extended
}

/// Resolve which page terms and positions are relevant for one hit.
///
/// `hit_language` is the language the search engine detected for the page at
/// feed time.
pub fn resolve(page: &PageIndex, hit_language: &str, query: &QueryTermSet) -> RelevantTermSet {
    let page_words: Vec<String> = geometry::flatten(&page.boxes, f32::INFINITY, f32::INFINITY)
        .into_iter()
        .map(|flat| flat.word)
        .collect();

    let mut terms = relevant_stem_terms(page, hit_language, &query.stems);
    terms.extend(relevant_synonym_terms(page, &page_words, &query.synonyms));
    let positions = relevant_synonym_positions(&page_words, &query.synonyms, &page.stems);
    RelevantTermSet { terms, positions }
}

/// Surface terms pulled in by applicable query stems.
///
/// A query stem applies to this hit if the hit's language is among its
/// tagged languages — unless no query stem at all carries the hit's
/// language, in which case the language signal is ambiguous and every stem
/// applies broadly.
fn relevant_stem_terms(
    page: &PageIndex,
    hit_language: &str,
    query_stems: &BTreeMap<String, StemEntry>,
) -> BTreeSet<String> {
    let page_stems = extend_hyphenated_stems(&page.stems);
    let language_known = query_stems
        .values()
        .any(|entry| entry.languages.contains(hit_language));

    let mut terms = BTreeSet::new();
    for (stem_key, entry) in query_stems {
        if language_known && !entry.languages.contains(hit_language) {
            continue;
        }
        if let Some(page_entry) = page_stems.get(stem_key) {
            terms.extend(page_entry.terms.iter().cloned());
        }
    }
    terms
}

/// Synonym-matched surface terms.
///
/// An alternate that literally occurs as a consecutive phrase in the page's
/// reading-order word sequence is relevant itself; an alternate that happens
/// to be a known page stem additionally pulls in every surface term mapped
/// to that stem.
fn relevant_synonym_terms(
    page: &PageIndex,
    page_words: &[String],
    synonyms: &[SynonymEntry],
) -> BTreeSet<String> {
    let mut relevant = BTreeSet::new();

    for entry in synonyms.iter().filter(|e| !e.main_term.is_empty()) {
        for term in entry.terms.iter().chain(std::iter::once(&entry.main_term)) {
            // The stem check uses the parenthesis-stripped term before any
            // slash split, matching how page stems were built.
            let stripped = synonym::strip_parenthesised(term);
            if let Some(page_entry) = page.stems.get(&stripped) {
                relevant.extend(page_entry.terms.iter().cloned());
            }
        }
    }

    for alternate in synonym::expand_alternates(synonyms) {
        if synonym::contains_phrase(&alternate, page_words) {
            relevant.insert(alternate);
        }
    }
    relevant
}

/// Page-relative positions of all synonym phrase matches.
///
/// Besides literal matches, an alternate whose words each resolve to a known
/// page stem is matched through the Cartesian product of those stems'
/// surface terms — covering pages that contain an inflected form of every
/// word in the phrase but not the literal phrase itself.
fn relevant_synonym_positions(
    page_words: &[String],
    synonyms: &[SynonymEntry],
    page_stems: &BTreeMap<String, StemEntry>,
) -> BTreeSet<usize> {
    let mut positions = BTreeSet::new();
    for alternate in synonym::expand_alternates(synonyms) {
        positions.extend(synonym::locate_phrase(&alternate, page_words));

        if let Some(combinations) = stem_surface_combinations(&alternate, page_stems) {
            for combination in combinations {
                positions.extend(synonym::locate_phrase(&combination.join(" "), page_words));
            }
        }
    }
    positions
}

/// All surface-term combinations for a phrase whose words are each a known
/// stem; `None` when any word has no stem entry.
fn stem_surface_combinations(
    phrase: &str,
    page_stems: &BTreeMap<String, StemEntry>,
) -> Option<Vec<Vec<String>>> {
    let per_word: Option<Vec<Vec<String>>> = phrase
        .split_whitespace()
        .map(|word| {
            page_stems
                .get(word)
                .map(|entry| entry.terms.iter().cloned().collect::<Vec<_>>())
        })
        .collect();
    per_word.map(cartesian_product)
}

/// Cartesian product of the per-word surface-term lists.
fn cartesian_product(lists: Vec<Vec<String>>) -> Vec<Vec<String>> {
    let mut combinations: Vec<Vec<String>> = vec![Vec::new()];
    for list in lists {
        let mut next = Vec::with_capacity(combinations.len() * list.len());
        for combination in &combinations {
            for item in &list {
                let mut extended = combination.clone();
                extended.push(item.clone());
                next.push(extended);
            }
        }
        combinations = next;
    }
    combinations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::DocBox;
    use crate::index::PageDimensions;
    use indexmap::IndexMap;

    fn stem_entry(terms: &[&str], languages: &[&str]) -> StemEntry {
        StemEntry {
            terms: terms.iter().map(|t| t.to_string()).collect(),
            languages: languages.iter().map(|l| l.to_string()).collect(),
        }
    }

    fn page_with(
        words: &[(&str, DocBox)],
        stems: &[(&str, StemEntry)],
    ) -> PageIndex {
        let mut boxes: IndexMap<String, Vec<DocBox>> = IndexMap::new();
        for (word, b) in words {
            boxes.entry(word.to_string()).or_default().push(*b);
        }
        PageIndex {
            boxes,
            stems: stems
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            dimensions: PageDimensions {
                scale: 1.0,
                thumb_scale: 1.0,
                orig_width: 600.0,
                orig_height: 800.0,
            },
        }
    }

    fn row(x: f32, y: f32) -> DocBox {
        DocBox::new(x, x + 10.0, y, y + 10.0)
    }

    #[test]
    fn test_query_term_set_aggregates_variants() {
        let variants = vec![
            TranslationVariant {
                language_code: "en".to_string(),
                content: vec!["Signal".to_string()],
            },
            TranslationVariant {
                language_code: "fr".to_string(),
                content: vec!["signal".to_string()],
            },
        ];
        let query = QueryTermSet::from_translations(&variants, vec![]);
        let entry = query.stems.get("signal").expect("merged stem");
        assert!(entry.languages.contains("en"));
        assert!(entry.languages.contains("fr"));
        assert!(query.flat_terms.contains("signal"));
        assert_eq!(query.stem_map.get("Signal").map(String::as_str), Some("signal"));
    }

    #[test]
    fn test_stem_match_with_matching_language() {
        let page = page_with(
            &[("signals", row(10.0, 0.0))],
            &[("signal", stem_entry(&["signals"], &["en"]))],
        );
        let query = QueryTermSet {
            stems: [("signal".to_string(), stem_entry(&["signal"], &["en"]))].into(),
            ..Default::default()
        };
        let relevant = resolve(&page, "en", &query);
        assert!(relevant.terms.contains("signals"));
    }

    #[test]
    fn test_stem_skipped_for_other_language() {
        let page = page_with(
            &[("signals", row(10.0, 0.0))],
            &[("signal", stem_entry(&["signals"], &["en"]))],
        );
        // One query stem is tagged with the hit language, so language
        // filtering is active and the French-only stem does not apply.
        let query = QueryTermSet {
            stems: [
                ("signal".to_string(), stem_entry(&["signal"], &["fr"])),
                ("corp".to_string(), stem_entry(&["corps"], &["en"])),
            ]
            .into(),
            ..Default::default()
        };
        let relevant = resolve(&page, "en", &query);
        assert!(!relevant.terms.contains("signals"));
    }

    #[test]
    fn test_stems_apply_broadly_when_language_ambiguous() {
        let page = page_with(
            &[("signals", row(10.0, 0.0))],
            &[("signal", stem_entry(&["signals"], &["en"]))],
        );
        // No query stem carries "de": ambiguous, so the stem applies anyway.
        let query = QueryTermSet {
            stems: [("signal".to_string(), stem_entry(&["signal"], &["fr"]))].into(),
            ..Default::default()
        };
        let relevant = resolve(&page, "de", &query);
        assert!(relevant.terms.contains("signals"));
    }

    #[test]
    fn test_hyphenated_stem_extension() {
        let page = page_with(
            &[("firefly", row(10.0, 0.0))],
            &[("fire-fly", stem_entry(&["firefly"], &["en"]))],
        );
        for part in ["fire", "fly"] {
            let query = QueryTermSet {
                stems: [(part.to_string(), stem_entry(&[part], &["en"]))].into(),
                ..Default::default()
            };
            let relevant = resolve(&page, "en", &query);
            assert!(relevant.terms.contains("firefly"), "part {part:?} must match");
        }
    }

    #[test]
    fn test_synonym_literal_phrase_match() {
        let page = page_with(
            &[
                ("the", row(0.0, 100.0)),
                ("signal", row(20.0, 100.0)),
                ("corps", row(40.0, 100.0)),
                ("met", row(60.0, 100.0)),
            ],
            &[],
        );
        let query = QueryTermSet {
            synonyms: vec![SynonymEntry {
                main_term: "army".to_string(),
                terms: vec!["signal corps".to_string()],
            }],
            ..Default::default()
        };
        let relevant = resolve(&page, "en", &query);
        assert!(relevant.terms.contains("signal corps"));
        // Reading order: the(0) signal(1) corps(2) met(3)
        assert_eq!(relevant.positions, [1, 2].into());
    }

    #[test]
    fn test_synonym_alternate_as_page_stem() {
        let page = page_with(
            &[("signalling", row(0.0, 100.0))],
            &[("signal", stem_entry(&["signalling"], &["en"]))],
        );
        let query = QueryTermSet {
            synonyms: vec![SynonymEntry {
                main_term: "signal".to_string(),
                terms: vec![],
            }],
            ..Default::default()
        };
        let relevant = resolve(&page, "en", &query);
        assert!(relevant.terms.contains("signalling"));
    }

    #[test]
    fn test_synonym_inflected_phrase_via_stem_product() {
        // The page contains "signals corps", not the literal "signal corp".
        let page = page_with(
            &[("signals", row(0.0, 100.0)), ("corps", row(20.0, 100.0))],
            &[
                ("signal", stem_entry(&["signals"], &["en"])),
                ("corp", stem_entry(&["corps"], &["en"])),
            ],
        );
        let query = QueryTermSet {
            synonyms: vec![SynonymEntry {
                main_term: "signal corp".to_string(),
                terms: vec![],
            }],
            ..Default::default()
        };
        let relevant = resolve(&page, "en", &query);
        assert_eq!(relevant.positions, [0, 1].into());
    }

    #[test]
    fn test_empty_inputs_are_normal() {
        let page = page_with(&[], &[]);
        let relevant = resolve(&page, "en", &QueryTermSet::default());
        assert!(relevant.terms.is_empty());
        assert!(relevant.positions.is_empty());
    }

    #[test]
    fn test_cartesian_product_shape() {
        let lists = vec![
            vec!["a".to_string(), "b".to_string()],
            vec!["x".to_string()],
        ];
        let product = cartesian_product(lists);
        assert_eq!(product.len(), 2);
        assert!(product.contains(&vec!["a".to_string(), "x".to_string()]));
        assert!(product.contains(&vec!["b".to_string(), "x".to_string()]));
    }
}
