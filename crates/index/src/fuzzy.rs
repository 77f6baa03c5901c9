//! Approximate title matching for providers without rich metadata.

use crate::{MAX_RESULTS, Match};
use mediadex_catalog::CatalogEntry;
use mediadex_identity::{Identity, normalize};
use std::collections::HashSet;
use strsim::normalized_levenshtein;

const TOKEN_SORT_SCALE: f64 = 0.95;
const PARTIAL_SCALE: f64 = 0.9;
/// Partial matching only kicks in once one side is this much longer.
const PARTIAL_LENGTH_RATIO: f64 = 1.5;

#[derive(Debug, Clone)]
struct Candidate {
    text: String,
    sorted: String,
    owner: usize,
}

/// A flat list of normalized names and aliases, each pointing back at the
/// entry it came from.
#[derive(Debug, Clone, Default)]
pub struct FuzzyIndex {
    owners: Vec<Identity>,
    candidates: Vec<Candidate>,
}
impl FuzzyIndex {
    pub fn build<'a>(entries: impl IntoIterator<Item = &'a CatalogEntry>) -> Self {
        let mut index = Self::default();
        for entry in entries {
            let owner = index.owners.len();
            index.owners.push(entry.identity().clone());
            for name in entry.names() {
                let text = normalize(name);
                if text.is_empty() {
                    continue;
                }
                let sorted = sort_tokens(&text);
                index.candidates.push(Candidate { text, sorted, owner });
            }
        }
        tracing::debug!(entries = index.owners.len(), candidates = index.candidates.len(), "Built fuzzy index");
        index
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Best-scoring entries for the query, one result per entry.
    ///
    /// There is no score cutoff: anything in the index is a candidate. A blank
    /// query lists the first entries in build order.
    pub fn search(&self, query: &str) -> Vec<Match> {
        let query = normalize(query);
        if query.is_empty() {
            return self
                .owners
                .iter()
                .take(MAX_RESULTS)
                .map(|identity| Match { identity: identity.clone(), score: 0.0 })
                .collect();
        }
        let sorted = sort_tokens(&query);
        let mut scored: Vec<(usize, f64)> = self
            .candidates
            .iter()
            .enumerate()
            .map(|(position, candidate)| (position, weighted_ratio(&query, &sorted, candidate)))
            .collect();
        scored.sort_by(|(a_position, a_score), (b_position, b_score)| {
            b_score.total_cmp(a_score).then(a_position.cmp(b_position))
        });

        let mut seen = HashSet::new();
        let mut results = Vec::new();
        for (position, score) in scored {
            let owner = self.candidates[position].owner;
            if !seen.insert(owner) {
                continue;
            }
            results.push(Match { identity: self.owners[owner].clone(), score });
            if results.len() == MAX_RESULTS {
                break;
            }
        }
        results
    }
}

fn sort_tokens(text: &str) -> String {
    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn weighted_ratio(query: &str, sorted: &str, candidate: &Candidate) -> f64 {
    let mut best = normalized_levenshtein(query, &candidate.text)
        .max(normalized_levenshtein(sorted, &candidate.sorted) * TOKEN_SORT_SCALE);
    let (query_len, candidate_len) = (query.chars().count(), candidate.text.chars().count());
    let (short, long) = if query_len <= candidate_len {
        (query, candidate.text.as_str())
    } else {
        (candidate.text.as_str(), query)
    };
    let ratio = query_len.max(candidate_len) as f64 / query_len.min(candidate_len).max(1) as f64;
    if ratio >= PARTIAL_LENGTH_RATIO {
        best = best.max(partial_ratio(short, long) * PARTIAL_SCALE);
    }
    best
}

/// Best similarity between `short` and any window of `long` of the same length.
fn partial_ratio(short: &str, long: &str) -> f64 {
    let width = short.chars().count();
    let chars: Vec<char> = long.chars().collect();
    if width == 0 || chars.len() <= width {
        return normalized_levenshtein(short, long);
    }
    chars
        .windows(width)
        .map(|window| normalized_levenshtein(short, &window.iter().collect::<String>()))
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediadex_identity::Kind;
    use rstest::rstest;

    fn webtoon(name: &str) -> CatalogEntry {
        CatalogEntry::new(Kind::Webtoon, name, "en")
    }

    fn catalog() -> FuzzyIndex {
        let entries = [
            webtoon("One Piece").with_aliases(["Wan Pisu", "One Piece Party"]),
            webtoon("Tower of God"),
            webtoon("Pokémon Adventures"),
            webtoon("The God of High School"),
        ];
        FuzzyIndex::build(&entries)
    }

    #[rstest]
    #[case("one peice", "one piece")]
    #[case("wan pisu", "one piece")]
    #[case("tower god", "tower of god")]
    #[case("god of tower", "tower of god")]
    #[case("pokemon", "pokemon adventures")]
    #[case("high school", "the god of high school")]
    fn test_best_match(#[case] query: &str, #[case] expected: &str) {
        let results = catalog().search(query);
        assert_eq!(results[0].identity.key(), expected);
    }

    #[test]
    fn test_one_result_per_entry() {
        let results = catalog().search("one piece");
        let owners: Vec<_> = results.iter().map(|result| result.identity.key()).collect();
        assert_eq!(owners.iter().filter(|key| **key == "one piece").count(), 1);
        assert_eq!(results.len(), 4);
    }

    #[test]
    fn test_blank_query_browses() {
        let entries: Vec<_> = (0..30).map(|i| webtoon(&format!("Series {i}"))).collect();
        let index = FuzzyIndex::build(&entries);
        for query in ["", "   ", "!!"] {
            let results = index.search(query);
            assert_eq!(results.len(), MAX_RESULTS);
            assert_eq!(results[0].identity.key(), "series 0");
            assert_eq!(results[24].identity.key(), "series 24");
        }
    }

    #[test]
    fn test_results_capped() {
        let entries: Vec<_> = (0..30).map(|i| webtoon(&format!("Series {i}"))).collect();
        assert_eq!(FuzzyIndex::build(&entries).search("series").len(), MAX_RESULTS);
    }

    #[test]
    fn test_scores_descend() {
        let results = catalog().search("god");
        assert!(results.windows(2).all(|pair| pair[0].score >= pair[1].score));
    }

    #[rstest]
    #[case("piece", "one piece", 1.0)]
    #[case("abc", "abc", 1.0)]
    #[case("xyz", "abcdef", 0.0)]
    fn test_partial_ratio(#[case] short: &str, #[case] long: &str, #[case] expected: f64) {
        assert!((partial_ratio(short, long) - expected).abs() < f64::EPSILON);
    }
}
