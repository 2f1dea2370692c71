//! Phrase-level matching of multi-word synonym entries against an ordered
//! word sequence.
//!
//! Synonym entries come from a bilingual dictionary and often carry flavour
//! text in parentheses or slash-joined alternates; [`expand_alternates`]
//! normalizes them into plain phrases before matching. Phrase matching is
//! order- and adjacency-sensitive: a phrase matches only where its tokens
//! appear consecutively.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A main term plus alternate terms/phrases considered equivalent for
/// relevance purposes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynonymEntry {
    /// The dictionary head word
    pub main_term: String,
    /// Alternate terms or phrases
    pub terms: Vec<String>,
}

/// Remove the first parenthesised span (first `(` through first `)`,
/// inclusive) and trim the remainder.
///
/// # Examples
///
/// ```
/// use pagemark::synonym::strip_parenthesised;
///
/// assert_eq!(strip_parenthesised("metal (rare)"), "metal");
/// assert_eq!(strip_parenthesised("(all) gone"), "gone");
/// assert_eq!(strip_parenthesised("plain"), "plain");
/// ```
pub fn strip_parenthesised(term: &str) -> String {
    match (term.find('('), term.find(')')) {
        (Some(open), Some(close)) if open < close => {
            let mut result = term[..open].to_string();
            if close + 1 < term.len() {
                result.push_str(&term[close + 1..]);
            }
            result.trim().to_string()
        },
        _ => term.trim().to_string(),
    }
}

/// Flatten synonym entries into plain alternate phrases.
///
/// Entries with an empty main term are skipped. Each term (alternates plus
/// the main term) has its parenthesised span removed and is then split on
/// `/` into independent alternates, each trimmed.
///
/// # Examples
///
/// ```
/// use pagemark::synonym::{expand_alternates, SynonymEntry};
///
/// let entries = vec![SynonymEntry {
///     main_term: "ore".to_string(),
///     terms: vec!["metal (rare)/alloy".to_string()],
/// }];
/// assert_eq!(expand_alternates(&entries), vec!["metal", "alloy", "ore"]);
/// ```
pub fn expand_alternates(entries: &[SynonymEntry]) -> Vec<String> {
    let mut alternates = Vec::new();
    for entry in entries.iter().filter(|e| !e.main_term.is_empty()) {
        for term in entry.terms.iter().chain(std::iter::once(&entry.main_term)) {
            let stripped = strip_parenthesised(term);
            for part in stripped.split('/') {
                let part = part.trim();
                if !part.is_empty() {
                    alternates.push(part.to_string());
                }
            }
        }
    }
    alternates
}

/// Check whether the phrase's whitespace-split tokens appear consecutively
/// anywhere in `words`.
///
/// This is not a bag-of-words test: order and adjacency matter.
///
/// # Examples
///
/// ```
/// use pagemark::synonym::contains_phrase;
///
/// let words: Vec<String> =
///     ["the", "signal", "corps", "met"].iter().map(|w| w.to_string()).collect();
/// assert!(contains_phrase("signal corps", &words));
///
/// let scattered: Vec<String> =
///     ["signal", "met", "corps"].iter().map(|w| w.to_string()).collect();
/// assert!(!contains_phrase("signal corps", &scattered));
/// ```
pub fn contains_phrase(phrase: &str, words: &[String]) -> bool {
    let tokens: Vec<&str> = phrase.split_whitespace().collect();
    if tokens.is_empty() {
        return false;
    }
    let mut start = 0;
    while let Some(offset) = words[start..].iter().position(|w| w == tokens[0]) {
        let at = start + offset;
        if phrase_matches_at(&tokens, words, at) {
            return true;
        }
        start = at + 1;
    }
    false
}

/// Return the positions of every non-overlapping consecutive full match of
/// the phrase in `words`.
///
/// The scan runs left to right and resumes after each match's end, so
/// disjoint occurrences are all found but overlapping re-matches are not.
///
/// # Examples
///
/// ```
/// use pagemark::synonym::locate_phrase;
///
/// let words: Vec<String> =
///     ["x", "ab", "cd", "y", "ab", "cd"].iter().map(|w| w.to_string()).collect();
/// let positions: Vec<usize> = locate_phrase("ab cd", &words).into_iter().collect();
/// assert_eq!(positions, vec![1, 2, 4, 5]);
/// ```
pub fn locate_phrase(phrase: &str, words: &[String]) -> BTreeSet<usize> {
    let mut positions = BTreeSet::new();
    let tokens: Vec<&str> = phrase.split_whitespace().collect();
    if tokens.is_empty() {
        return positions;
    }
    let mut start = 0;
    while start < words.len() {
        match words[start..].iter().position(|w| w == tokens[0]) {
            Some(offset) => {
                let at = start + offset;
                if phrase_matches_at(&tokens, words, at) {
                    positions.extend(at..at + tokens.len());
                    start = at + tokens.len();
                } else {
                    start = at + 1;
                }
            },
            None => break,
        }
    }
    positions
}

/// Full consecutive token match starting at `at`.
fn phrase_matches_at(tokens: &[&str], words: &[String], at: usize) -> bool {
    at + tokens.len() <= words.len()
        && words[at..at + tokens.len()]
            .iter()
            .zip(tokens)
            .all(|(word, token)| word == token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_strip_parenthesised_variants() {
        assert_eq!(strip_parenthesised("metal (rare)/alloy"), "metal /alloy");
        assert_eq!(strip_parenthesised("(all) gone"), "gone");
        assert_eq!(strip_parenthesised("tail (note)"), "tail");
        assert_eq!(strip_parenthesised("no parens"), "no parens");
        // Mismatched parens are left alone
        assert_eq!(strip_parenthesised(") odd ("), ") odd (");
    }

    #[test]
    fn test_expand_alternates_normalizes() {
        let entries = vec![
            SynonymEntry {
                main_term: "ore".to_string(),
                terms: vec!["metal (rare)/alloy".to_string()],
            },
            SynonymEntry {
                main_term: String::new(),
                terms: vec!["dropped".to_string()],
            },
        ];
        assert_eq!(expand_alternates(&entries), vec!["metal", "alloy", "ore"]);
    }

    #[test]
    fn test_contains_phrase_consecutive_only() {
        let sequence = words(&["the", "signal", "corps", "met"]);
        assert!(contains_phrase("signal corps", &sequence));
        assert!(contains_phrase("the signal corps met", &sequence));
        assert!(!contains_phrase("signal corps", &words(&["signal", "met", "corps"])));
        assert!(!contains_phrase("", &sequence));
    }

    #[test]
    fn test_contains_phrase_retries_later_occurrences() {
        // The first "signal" is not followed by "corps"; the scan must not
        // stop there.
        let sequence = words(&["signal", "flare", "signal", "corps"]);
        assert!(contains_phrase("signal corps", &sequence));
    }

    #[test]
    fn test_locate_phrase_disjoint_matches() {
        let sequence = words(&["x", "ab", "cd", "y", "ab", "cd"]);
        let positions: Vec<usize> = locate_phrase("ab cd", &sequence).into_iter().collect();
        assert_eq!(positions, vec![1, 2, 4, 5]);
    }

    #[test]
    fn test_locate_phrase_no_overlapping_rematch() {
        // "ab ab" at 0..2 consumes the middle token; only one match.
        let sequence = words(&["ab", "ab", "ab"]);
        let positions: Vec<usize> = locate_phrase("ab ab", &sequence).into_iter().collect();
        assert_eq!(positions, vec![0, 1]);
    }

    #[test]
    fn test_locate_phrase_single_token() {
        let sequence = words(&["to", "be", "or", "not", "to", "be"]);
        let positions: Vec<usize> = locate_phrase("be", &sequence).into_iter().collect();
        assert_eq!(positions, vec![1, 5]);
    }
}
