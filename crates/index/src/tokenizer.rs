//! Text analysis shared by index construction and querying.
//!
//! Build side: split on whitespace and hyphens, lowercase, trim punctuation
//! from both ends of each token. Query side runs the same pipeline and then
//! stems each token.

use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

regex!(SEPARATOR_REGEX, r"[\s\-]+");
regex!(TRIMMER_REGEX, r"^\W+|\W+$");

static STEMMER: LazyLock<Stemmer> = LazyLock::new(|| Stemmer::create(Algorithm::English));

/// Build-side terms of a text, in order, duplicates included.
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    SEPARATOR_REGEX
        .split(text)
        .map(|token| TRIMMER_REGEX.replace_all(&token.to_lowercase(), "").into_owned())
        .filter(|token| !token.is_empty())
        .collect()
}

pub(crate) fn stem(term: &str) -> String {
    STEMMER.stem(term).into_owned()
}

/// A query token in both its indexed and stemmed form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct QueryToken {
    pub raw: String,
    pub stem: String,
}

pub(crate) fn query_tokens(query: &str) -> Vec<QueryToken> {
    tokenize(query)
        .into_iter()
        .map(|raw| {
            let stem = stem(&raw);
            QueryToken { raw, stem }
        })
        .collect()
}
