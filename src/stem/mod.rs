//! Per-language stem tables built from words observed on a page or in a query.
//!
//! Stemming groups inflected surface words under a language-specific Snowball
//! root. Unsupported language codes fall back to the English ruleset, exactly
//! like the original language table (`ca`, `pl` and `bn` have no Snowball
//! stemmer). Stemming is a pure function per (word, language).

use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Language code recorded when detection failed or the code is unsupported.
pub const UNKNOWN_LANGUAGE: &str = "un";

/// Language codes with an entry in the stemmer table.
const KNOWN_LANGUAGES: [&str; 11] = [
    "de", "en", "fr", "ca", "it", "es", "ru", "pl", "bn", "da", UNKNOWN_LANGUAGE,
];

/// Surface terms and contributing languages grouped under one stem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StemEntry {
    /// Surface words that map to this stem
    pub terms: BTreeSet<String>,
    /// Language codes that contributed terms
    pub languages: BTreeSet<String>,
}

/// Normalize a language code to one the stemmer table knows.
fn normalize_language(language_code: &str) -> &str {
    if KNOWN_LANGUAGES.contains(&language_code) {
        language_code
    } else {
        UNKNOWN_LANGUAGE
    }
}

/// Snowball algorithm for a (normalized) language code.
fn algorithm_for(language_code: &str) -> Algorithm {
    match language_code {
        "de" => Algorithm::German,
        "fr" => Algorithm::French,
        "it" => Algorithm::Italian,
        "es" => Algorithm::Spanish,
        "ru" => Algorithm::Russian,
        "da" => Algorithm::Danish,
        // en, plus ca/pl/bn/un which have no Snowball ruleset
        _ => Algorithm::English,
    }
}

/// Group words by their language-specific stem.
///
/// Each resulting [`StemEntry`] carries the contributing surface words and the
/// (normalized) language code.
pub fn stems_for_words<'a, I>(words: I, language_code: &str) -> BTreeMap<String, StemEntry>
where
    I: IntoIterator<Item = &'a str>,
{
    let language = normalize_language(language_code);
    let stemmer = Stemmer::create(algorithm_for(language));
    let mut stems: BTreeMap<String, StemEntry> = BTreeMap::new();
    for word in words {
        let entry = stems.entry(stemmer.stem(word).into_owned()).or_default();
        entry.terms.insert(word.to_string());
        entry.languages.insert(language.to_string());
    }
    stems
}

/// Map each word to its stem, for reconstructing which stem a specific query
/// word belongs to.
pub fn stem_map_for_words<'a, I>(words: I, language_code: &str) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = &'a str>,
{
    let stemmer = Stemmer::create(algorithm_for(normalize_language(language_code)));
    words
        .into_iter()
        .map(|word| (word.to_string(), stemmer.stem(word).into_owned()))
        .collect()
}

/// Union-merge stem tables from several language variants of a query.
///
/// A stem seen in two languages retains all contributing languages and all
/// contributing surface terms; nothing is overwritten.
pub fn merge_stems(into: &mut BTreeMap<String, StemEntry>, from: BTreeMap<String, StemEntry>) {
    for (stem, entry) in from {
        let merged = into.entry(stem).or_default();
        merged.terms.extend(entry.terms);
        merged.languages.extend(entry.languages);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stems_group_inflections() {
        let stems = stems_for_words(["signals", "signal", "corps"], "en");
        let entry = stems.get("signal").expect("signal stem");
        assert!(entry.terms.contains("signals"));
        assert!(entry.terms.contains("signal"));
        assert!(entry.languages.contains("en"));
        assert!(stems.contains_key("corp"));
    }

    #[test]
    fn test_unsupported_language_falls_back() {
        // Polish has no Snowball ruleset but sits in the table; a code the
        // table has never heard of is recorded as "un". Both stem with the
        // English rules.
        let stems = stems_for_words(["running"], "pl");
        let entry = stems.get("run").expect("pl stem");
        assert!(entry.languages.contains("pl"));

        let unknown = stems_for_words(["running"], "zz");
        let entry = unknown.get("run").expect("fallback stem");
        assert!(entry.languages.contains(UNKNOWN_LANGUAGE));
    }

    #[test]
    fn test_stem_map_inverse_orientation() {
        let map = stem_map_for_words(["signals", "signal"], "en");
        assert_eq!(map.get("signals").map(String::as_str), Some("signal"));
        assert_eq!(map.get("signal").map(String::as_str), Some("signal"));
    }

    #[test]
    fn test_merge_unions_terms_and_languages() {
        let mut merged = stems_for_words(["signals"], "en");
        merge_stems(&mut merged, stems_for_words(["signal"], "fr"));
        let entry = merged.get("signal").expect("merged stem");
        assert!(entry.terms.contains("signals"));
        assert!(entry.terms.contains("signal"));
        assert!(entry.languages.contains("en"));
        assert!(entry.languages.contains("fr"));
    }

    #[test]
    fn test_deterministic_for_same_input() {
        let a = stems_for_words(["signals", "running", "corps"], "en");
        let b = stems_for_words(["corps", "signals", "running"], "en");
        assert_eq!(a, b);
    }
}
