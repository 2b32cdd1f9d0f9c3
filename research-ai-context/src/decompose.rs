//! Heuristic splitting of a research question into independent sub-queries.
//!
//! The rules are tried in order and the first one that produces more than one
//! part wins:
//!
//! 1. split on `;`
//! 2. split on `,` (commas are treated exactly like semicolons)
//! 3. split on the word ` and `, matched case-insensitively
//! 4. otherwise the whole query is a single sub-query
//!
//! This is not a parser. A comma inside a title or an "and" inside a proper noun
//! is split like any other separator.
//!
//! Rule 3 lower-cases the query before splitting, so its parts come back
//! lower-cased while the parts of rules 1 and 2 keep their original case.
//! Callers that display sub-queries should expect both forms.
//!
//! ```
//! use research_ai_context::decompose;
//!
//! assert_eq!(decompose("find X; compare Y"), vec!["find X", "compare Y"]);
//! assert_eq!(decompose("find X and Y"), vec!["find x", "y"]);
//! assert_eq!(decompose("what is retrieval?"), vec!["what is retrieval?"]);
//! ```

use regex::Regex;
use std::sync::LazyLock;

static AND_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i) and ").expect("separator pattern is valid"));

/// Split `query` into sub-queries.
///
/// Parts are trimmed and empty parts are dropped. A query made only of
/// separators and whitespace yields an empty vector.
pub fn decompose(query: &str) -> Vec<String> {
    let by_semicolon = split_parts(query, ';');
    if by_semicolon.len() != 1 {
        // Either several real parts, or nothing but separators.
        return by_semicolon;
    }

    let by_comma = split_parts(&query.replace(',', ";"), ';');
    if by_comma.len() != 1 {
        return by_comma;
    }

    if AND_SEPARATOR.is_match(query) {
        let lowered = query.to_lowercase();
        let parts: Vec<String> = lowered
            .split(" and ")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        if !parts.is_empty() {
            return parts;
        }
    }

    vec![query.trim().to_string()]
}

fn split_parts(query: &str, separator: char) -> Vec<String> {
    query
        .split(separator)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semicolons_take_precedence() {
        assert_eq!(
            decompose("find X; compare Y, Z and W"),
            vec!["find X", "compare Y, Z and W"]
        );
    }

    #[test]
    fn test_commas_split_when_no_semicolons() {
        assert_eq!(
            decompose("history of FAISS, uses of HNSW , "),
            vec!["history of FAISS", "uses of HNSW"]
        );
    }

    #[test]
    fn test_and_split_lowercases_parts() {
        // Case-folding only happens on the " and " rule.
        assert_eq!(decompose("find X and Y"), vec!["find x", "y"]);
        assert_eq!(
            decompose("Compare BM25 AND Dense Retrieval"),
            vec!["compare bm25", "dense retrieval"]
        );
    }

    #[test]
    fn test_and_inside_proper_noun_is_still_split() {
        assert_eq!(
            decompose("papers by Johnson and Johnson"),
            vec!["papers by johnson", "johnson"]
        );
    }

    #[test]
    fn test_and_requires_surrounding_spaces() {
        assert_eq!(decompose("android sandbox"), vec!["android sandbox"]);
    }

    #[test]
    fn test_single_query_is_trimmed() {
        assert_eq!(decompose("  What Is RAG?  "), vec!["What Is RAG?"]);
    }

    #[test]
    fn test_separator_only_query_yields_nothing() {
        assert!(decompose(" ; ;; ").is_empty());
        assert!(decompose("").is_empty());
        assert!(decompose(",").is_empty());
        assert!(decompose(" , , ").is_empty());
        assert!(decompose(" ;, ").is_empty());
    }

    #[test]
    fn test_single_comma_part_falls_through_to_and() {
        assert_eq!(decompose(", Cats and Dogs"), vec![", cats", "dogs"]);
    }
}
