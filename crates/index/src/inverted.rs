//! Field-boosted BM25 inverted index.

use crate::schema::Schema;
use crate::tokenizer::{QueryToken, query_tokens, stem, tokenize};
use crate::{MAX_RESULTS, MIN_QUERY_CHARS, Match};
use mediadex_catalog::CatalogEntry;
use mediadex_identity::Identity;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Bound;

const K1: f64 = 1.2;
const B: f64 = 0.75;

#[derive(Debug, Clone)]
struct Document {
    identity: Identity,
    boost: f64,
    /// Number of terms in each schema field.
    lengths: Vec<usize>,
}

#[derive(Debug, Clone, Copy)]
struct Posting {
    document: usize,
    field: usize,
    frequency: usize,
}

#[derive(Debug, Clone, Default)]
struct Term {
    idf: f64,
    postings: Vec<Posting>,
}

/// Accumulates documents, then freezes them into an [`InvertedIndex`].
#[derive(Debug)]
pub struct InvertedIndexBuilder {
    schema: Schema,
    documents: Vec<Document>,
    postings: BTreeMap<String, Vec<Posting>>,
}
impl InvertedIndexBuilder {
    pub fn new(schema: Schema) -> Self {
        Self { schema, documents: Vec::new(), postings: BTreeMap::new() }
    }

    /// Index one entry. Entries are expected to be distinct identities; the
    /// order they are added in breaks ties between equal scores.
    pub fn add(&mut self, entry: &CatalogEntry) {
        let document = self.documents.len();
        let mut lengths = Vec::with_capacity(self.schema.fields().len());
        for (field, text) in self.schema.texts(entry).enumerate() {
            let terms = tokenize(text);
            lengths.push(terms.len());
            let mut frequencies: BTreeMap<String, usize> = BTreeMap::new();
            for term in terms {
                *frequencies.entry(term).or_default() += 1;
            }
            for (term, frequency) in frequencies {
                self.postings.entry(term).or_default().push(Posting { document, field, frequency });
            }
        }
        self.documents.push(Document {
            identity: entry.identity().clone(),
            boost: entry.popularity_boost() as f64,
            lengths,
        });
    }

    pub fn build(self) -> InvertedIndex {
        let total = self.documents.len() as f64;
        let field_count = self.schema.fields().len();
        let average_lengths = (0..field_count)
            .map(|field| {
                let sum: usize = self.documents.iter().map(|document| document.lengths[field]).sum();
                if self.documents.is_empty() { 0.0 } else { sum as f64 / total }
            })
            .collect();
        let mut stems: HashMap<String, Vec<String>> = HashMap::new();
        let terms = self
            .postings
            .into_iter()
            .map(|(term, postings)| {
                let containing = postings.iter().map(|posting| posting.document).collect::<BTreeSet<_>>().len() as f64;
                let idf = (1.0 + ((total - containing + 0.5) / (containing + 0.5)).abs()).ln();
                stems.entry(stem(&term)).or_default().push(term.clone());
                (term, Term { idf, postings })
            })
            .collect();
        tracing::debug!(documents = self.documents.len(), fields = field_count, "Built inverted index");
        InvertedIndex { schema: self.schema, documents: self.documents, terms, stems, average_lengths }
    }
}

/// An immutable BM25 index over the title and keyword fields of a catalog.
///
/// Every query token is required. All but the last token match indexed terms
/// sharing their stem; the last token matches any indexed term it is a prefix
/// of, raw or stemmed, so that partially-typed titles still find something.
#[derive(Debug, Clone)]
pub struct InvertedIndex {
    schema: Schema,
    documents: Vec<Document>,
    terms: BTreeMap<String, Term>,
    stems: HashMap<String, Vec<String>>,
    average_lengths: Vec<f64>,
}
impl InvertedIndex {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn search(&self, query: &str) -> Vec<Match> {
        if query.trim().chars().count() < MIN_QUERY_CHARS {
            return Vec::new();
        }
        let tokens = query_tokens(query);
        let Some(last) = tokens.len().checked_sub(1) else {
            return Vec::new();
        };

        let mut scores: Option<HashMap<usize, f64>> = None;
        for (position, token) in tokens.iter().enumerate() {
            let terms = if position == last { self.prefixed(token) } else { self.stemmed(token) };
            let matched = self.score_terms(&terms);
            let combined = match scores.take() {
                None => matched,
                Some(mut accumulated) => {
                    accumulated.retain(|document, _| matched.contains_key(document));
                    for (document, score) in accumulated.iter_mut() {
                        *score += matched[document];
                    }
                    accumulated
                },
            };
            if combined.is_empty() {
                return Vec::new();
            }
            scores = Some(combined);
        }

        let mut ranked: Vec<(usize, f64)> = scores
            .unwrap_or_default()
            .into_iter()
            .map(|(document, score)| (document, score * self.documents[document].boost))
            .collect();
        ranked.sort_by(|(a_document, a_score), (b_document, b_score)| {
            b_score.total_cmp(a_score).then(a_document.cmp(b_document))
        });
        ranked.truncate(MAX_RESULTS);
        ranked
            .into_iter()
            .map(|(document, score)| Match { identity: self.documents[document].identity.clone(), score })
            .collect()
    }

    fn stemmed(&self, token: &QueryToken) -> BTreeSet<&str> {
        self.stems.get(&token.stem).into_iter().flatten().map(String::as_str).collect()
    }

    fn prefixed(&self, token: &QueryToken) -> BTreeSet<&str> {
        let mut terms: BTreeSet<&str> = self.with_prefix(&token.raw).collect();
        terms.extend(self.with_prefix(&token.stem));
        terms
    }

    fn with_prefix<'a, 'p>(&'a self, prefix: &'p str) -> impl Iterator<Item = &'a str> + use<'a, 'p> {
        self.terms
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .map(|(term, _)| term.as_str())
            .take_while(move |term| term.starts_with(prefix))
    }

    /// Summed BM25 contribution of the given terms to each document containing
    /// at least one of them.
    fn score_terms(&self, terms: &BTreeSet<&str>) -> HashMap<usize, f64> {
        let mut scores = HashMap::new();
        for term in terms {
            let Some(Term { idf, postings }) = self.terms.get(*term) else {
                continue;
            };
            for posting in postings {
                *scores.entry(posting.document).or_default() += idf * self.weight(posting);
            }
        }
        scores
    }

    fn weight(&self, posting: &Posting) -> f64 {
        let length = self.documents[posting.document].lengths[posting.field] as f64;
        let average = self.average_lengths[posting.field];
        let relative = if average > 0.0 { length / average } else { 0.0 };
        let frequency = posting.frequency as f64;
        let saturation = ((K1 + 1.0) * frequency) / (K1 * (1.0 - B + B * relative) + frequency);
        saturation * self.schema.fields()[posting.field].boost
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediadex_catalog::SearchField;
    use mediadex_identity::Kind;
    use rstest::rstest;

    fn index(schema: Schema, entries: &[CatalogEntry]) -> InvertedIndex {
        let mut builder = InvertedIndexBuilder::new(schema);
        for entry in entries {
            builder.add(entry);
        }
        builder.build()
    }

    fn manga(name: &str) -> CatalogEntry {
        CatalogEntry::new(Kind::Manga, name, "fr")
    }

    fn names(results: &[Match]) -> Vec<&str> {
        results.iter().map(|result| result.identity.key()).collect()
    }

    fn catalog() -> InvertedIndex {
        index(
            Schema::default(),
            &[
                manga("One Piece"),
                manga("One Punch Man"),
                manga("Running Man Legends"),
                manga("Catwoman"),
                manga("Spider-Man"),
            ],
        )
    }

    #[rstest]
    #[case("one piece", &["one piece"])]
    #[case("one pi", &["one piece"])]
    #[case("one p", &["one piece", "one punch man"])]
    #[case("runs man", &["running man legends"])]
    #[case("cats", &["catwoman"])]
    #[case("spider man", &["spider man"])]
    #[case("one titan", &[])]
    #[case("zzz", &[])]
    fn test_search(#[case] query: &str, #[case] expected: &[&str]) {
        let results = catalog().search(query);
        let mut found = names(&results);
        found.sort();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_prefixed_terms_outlive_query() {
        let index = catalog();
        let terms = {
            let token = QueryToken { raw: "pun".to_string(), stem: stem("pun") };
            index.prefixed(&token)
        };
        assert_eq!(terms.into_iter().collect::<Vec<_>>(), ["punch"]);
    }

    #[rstest]
    #[case("")]
    #[case("ab")]
    #[case("   ab   ")]
    #[case("on")]
    fn test_short_query_is_empty(#[case] query: &str) {
        assert!(catalog().search(query).is_empty());
    }

    #[test]
    fn test_results_capped() {
        let entries: Vec<_> = (0..40).map(|i| manga(&format!("Title {i}"))).collect();
        let results = index(Schema::default(), &entries).search("title");
        assert_eq!(results.len(), MAX_RESULTS);
        let expected: Vec<String> = (0..MAX_RESULTS).map(|i| format!("title {i}")).collect();
        assert_eq!(names(&results), expected);
    }

    #[test]
    fn test_popularity_boost() {
        let entries = [manga("Dragon Ball").with_popularity(1), manga("Dragon Quest").with_popularity(100)];
        let results = index(Schema::default(), &entries).search("dragon");
        assert_eq!(names(&results), ["dragon quest", "dragon ball"]);
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn test_missing_popularity_counts_as_one() {
        let entries = [manga("Dragon Ball"), manga("Dragon Quest").with_popularity(0)];
        let results = index(Schema::default(), &entries).search("dragon");
        assert_eq!(results[0].score, results[1].score);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let entries = [manga("Beta Test"), manga("Alpha Test")];
        let results = index(Schema::default(), &entries).search("test");
        assert_eq!(names(&results), ["beta test", "alpha test"]);
    }

    #[test]
    fn test_keyword_fields() {
        let schema = Schema::new([&SearchField::new("title_english", 2.0)]).unwrap();
        let entries = [
            manga("Shingeki no Kyojin").with_keyword("title_english", "Attack on Titan"),
            manga("Titan"),
            manga("Berserk"),
        ];
        let results = index(schema, &entries).search("titan");
        assert_eq!(names(&results), ["titan", "shingeki no kyojin"]);

        let schema = Schema::new([&SearchField::new("title_english", 2.0)]).unwrap();
        let results = index(schema, &entries).search("attack titan");
        assert_eq!(names(&results), ["shingeki no kyojin"]);
    }

    #[test]
    fn test_empty_index() {
        let index = index(Schema::default(), &[]);
        assert!(index.is_empty());
        assert!(index.search("anything").is_empty());
    }
}
