//! Prefix suggestions and did-you-mean expansion

use std::collections::BTreeSet;

use rusqlite::Connection;

use crate::error::Result;
use crate::store::records;
use crate::store::{KeyRange, RangeScan, TermIndex};

/// Continuations longer than this are not expanded.
const MAX_EXPANSION: usize = 15;

/// Distinct expressions starting with `prefix`, sorted ascending, at most `max`.
///
/// With no dictionary names the global expression index is scanned instead.
pub fn suggest_prefix(
    conn: &Connection,
    prefix: &str,
    max: usize,
    dictionaries: &[String],
) -> Result<Vec<String>> {
    if max == 0 {
        return Ok(Vec::new());
    }
    let mut found = BTreeSet::new();
    if dictionaries.is_empty() {
        let scan = RangeScan::new(conn, TermIndex::Expression, None, KeyRange::prefix(prefix));
        collect_distinct(scan, max, &mut found)?;
    } else {
        for dictionary in dictionaries {
            let scan = RangeScan::new(
                conn,
                TermIndex::DictionaryExpression,
                Some(dictionary.as_str()),
                KeyRange::prefix(prefix),
            );
            collect_distinct(scan, max, &mut found)?;
        }
    }
    Ok(found.into_iter().take(max).collect())
}

/// Takes up to `max` new distinct expressions from an ordered scan.
fn collect_distinct(
    scan: RangeScan<'_>,
    max: usize,
    found: &mut BTreeSet<String>,
) -> Result<()> {
    let mut taken = BTreeSet::new();
    for term in scan {
        let term = term?;
        taken.insert(term.expression);
        if taken.len() >= max {
            break;
        }
    }
    found.extend(taken);
    Ok(())
}

/// `word` extended by each prefix of `next_chars`, then by each prefix of
/// `next_chars` with whitespace removed when it had any. Duplicates dropped.
pub fn did_you_mean_candidates(word: &str, next_chars: &str) -> Vec<String> {
    let mut candidates = Vec::new();
    let mut push_prefixes = |chars: Vec<char>| {
        let mut candidate = word.to_string();
        for c in chars.into_iter().take(MAX_EXPANSION) {
            candidate.push(c);
            if !candidates.contains(&candidate) {
                candidates.push(candidate.clone());
            }
        }
    };

    push_prefixes(next_chars.chars().collect());
    if next_chars.chars().any(char::is_whitespace) {
        push_prefixes(next_chars.chars().filter(|c| !c.is_whitespace()).collect());
    }
    candidates
}

/// Alternatives for `word` that exist in the selected dictionaries (all when
/// empty), with `word` itself first when it exists too.
///
/// Empty unless at least one alternative other than `word` was found.
pub fn suggest_did_you_mean(
    conn: &Connection,
    word: &str,
    next_chars: &str,
    max: usize,
    dictionaries: &[String],
) -> Result<Vec<String>> {
    let candidates: Vec<String> = did_you_mean_candidates(word, next_chars)
        .into_iter()
        .filter(|c| c != word)
        .collect();
    let existing = records::existing_expressions(conn, &candidates, dictionaries)?;
    let alternatives: Vec<String> = candidates
        .into_iter()
        .filter(|c| existing.contains(c))
        .collect();
    if alternatives.is_empty() {
        return Ok(Vec::new());
    }

    let word_exists =
        !records::existing_expressions(conn, &[word.to_string()], dictionaries)?.is_empty();
    let mut results = Vec::with_capacity(alternatives.len() + 1);
    if word_exists {
        results.push(word.to_string());
    }
    results.extend(alternatives);
    results.truncate(max);
    if results.iter().all(|r| r == word) {
        return Ok(Vec::new());
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Term;
    use crate::store::{Store, StoreRecord};

    fn store_with(terms: &[(&str, &str)]) -> Store {
        let mut store = Store::open_in_memory().unwrap();
        let txn = store.write().unwrap();
        for (dictionary, expression) in terms {
            Term::new(dictionary, expression, "", vec![]).put(&txn).unwrap();
        }
        txn.commit().unwrap();
        store
    }

    #[test]
    fn test_candidates_with_whitespace() {
        assert_eq!(
            did_you_mean_candidates("color", " ful"),
            vec!["color ", "color f", "color fu", "color ful", "colorf", "colorfu", "colorful"]
        );
    }

    #[test]
    fn test_candidates_capped() {
        let next: String = "abcdefghijklmnopqrstuvwxyz".to_string();
        let candidates = did_you_mean_candidates("x", &next);
        assert_eq!(candidates.len(), MAX_EXPANSION);
        assert_eq!(candidates.last().map(String::as_str), Some("xabcdefghijklmno"));
    }

    #[test]
    fn test_did_you_mean() {
        let store = store_with(&[("d", "colorful")]);
        let read = store.read().unwrap();
        assert_eq!(suggest_did_you_mean(&read, "color", " ful", 5, &[]).unwrap(), vec!["colorful"]);

        let store = store_with(&[("d", "colorful"), ("d", "color")]);
        let read = store.read().unwrap();
        assert_eq!(
            suggest_did_you_mean(&read, "color", " ful", 5, &["d".to_string()]).unwrap(),
            vec!["color", "colorful"]
        );
    }

    #[test]
    fn test_did_you_mean_needs_alternative() {
        let store = store_with(&[("d", "color")]);
        let read = store.read().unwrap();
        assert!(suggest_did_you_mean(&read, "color", "ful", 5, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_prefix_per_dictionary_and_global() {
        let store = store_with(&[
            ("a", "cat"),
            ("a", "cattle"),
            ("b", "catalog"),
            ("b", "cat"),
            ("b", "dog"),
        ]);
        let read = store.read().unwrap();
        let dicts = vec!["a".to_string(), "b".to_string()];
        assert_eq!(
            suggest_prefix(&read, "cat", usize::MAX, &dicts).unwrap(),
            vec!["cat", "catalog", "cattle"]
        );
        assert_eq!(suggest_prefix(&read, "cat", 2, &dicts).unwrap(), vec!["cat", "catalog"]);
        assert_eq!(
            suggest_prefix(&read, "cat", 10, &["b".to_string()]).unwrap(),
            vec!["cat", "catalog"]
        );
        assert_eq!(suggest_prefix(&read, "ca", 10, &[]).unwrap(), vec!["cat", "catalog", "cattle"]);
        assert!(suggest_prefix(&read, "cat", 0, &dicts).unwrap().is_empty());
    }
}
