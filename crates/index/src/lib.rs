//! Search indexes over a deduplicated catalog.
//!
//! Two variants are built from the same input, depending on what the
//! providers of a kind can offer:
//!
//! - [`InvertedIndex`]: field-boosted BM25 over title and provider keyword
//!   fields, weighted by popularity. Used where providers supply rich
//!   per-entry metadata.
//! - [`FuzzyIndex`]: approximate string similarity over names and aliases.
//!   Used where they don't.
//!
//! Both are read-only once built; a refresh builds a new one.

pub mod error;
mod fuzzy;
mod inverted;
mod schema;
mod tokenizer;

pub use crate::fuzzy::FuzzyIndex;
pub use crate::inverted::{InvertedIndex, InvertedIndexBuilder};
pub use crate::schema::{Field, NAME_BOOST, NAME_FIELD, Schema};
use mediadex_catalog::CatalogEntry;
use mediadex_identity::Identity;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Maximum number of results any search returns.
pub const MAX_RESULTS: usize = 25;
/// Queries shorter than this (in characters, ignoring surrounding whitespace)
/// return nothing from the inverted index.
pub const MIN_QUERY_CHARS: usize = 3;

/// One search result.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub identity: Identity,
    pub score: f64,
}

/// Which index variant to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Strategy {
    #[default]
    Inverted,
    Fuzzy,
}
impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Inverted => "inverted",
            Strategy::Fuzzy => "fuzzy",
        }
    }
}
impl Display for Strategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}
impl FromStr for Strategy {
    type Err = crate::error::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "inverted" | "lunr" => Self::Inverted,
            "fuzzy" => Self::Fuzzy,
            _ => exn::bail!(crate::error::ErrorKind::UnknownStrategy(s.to_string())),
        })
    }
}

/// A built index of either variant.
#[derive(Debug, Clone)]
pub enum SearchIndex {
    Inverted(InvertedIndex),
    Fuzzy(FuzzyIndex),
}
impl SearchIndex {
    /// Build an index from deduplicated entries, in the order given.
    ///
    /// The schema only matters to the inverted variant.
    pub fn build<'a>(strategy: Strategy, schema: &Schema, entries: impl IntoIterator<Item = &'a CatalogEntry>) -> Self {
        match strategy {
            Strategy::Inverted => {
                let mut builder = InvertedIndexBuilder::new(schema.clone());
                for entry in entries {
                    builder.add(entry);
                }
                Self::Inverted(builder.build())
            },
            Strategy::Fuzzy => Self::Fuzzy(FuzzyIndex::build(entries)),
        }
    }

    /// An index with nothing in it, for the generation published before the
    /// first refresh.
    pub fn empty(strategy: Strategy, schema: &Schema) -> Self {
        Self::build(strategy, schema, std::iter::empty())
    }

    pub fn strategy(&self) -> Strategy {
        match self {
            SearchIndex::Inverted(_) => Strategy::Inverted,
            SearchIndex::Fuzzy(_) => Strategy::Fuzzy,
        }
    }

    /// Ranked identities matching the query, at most [`MAX_RESULTS`].
    ///
    /// Never fails: a query that is too short or matches nothing is an empty
    /// result, not an error.
    pub fn search(&self, query: &str) -> Vec<Match> {
        match self {
            SearchIndex::Inverted(index) => index.search(query),
            SearchIndex::Fuzzy(index) => index.search(query),
        }
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        match self {
            SearchIndex::Inverted(index) => index.len(),
            SearchIndex::Fuzzy(index) => index.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
