use mediadex_identity::{AddressableHash, Identity, Kind};
use std::collections::{BTreeMap, BTreeSet};

/// One provider's view of one title, as of one refresh.
///
/// The identity is derived from the kind and name when the entry is built and
/// can't drift from them afterwards: both are only reachable through
/// accessors. Entries are immutable once cached and are replaced wholesale on
/// the next refresh, never patched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    kind: Kind,
    name: String,
    identity: Identity,
    /// Alternative titles (romanized, translated, abbreviations)
    pub aliases: BTreeSet<String>,
    /// Language of this provider's release (e.g., "fr", "VOSTFR")
    pub language: String,
    /// Provider-declared popularity, if the provider has one
    pub popularity: Option<u64>,
    pub genres: BTreeSet<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub url: Option<String>,
    /// Extra searchable text keyed by the provider's declared search fields
    pub keywords: BTreeMap<String, String>,
    /// Opaque provider reference (site-internal ID, slug, ...)
    pub reference: Option<String>,
}
impl CatalogEntry {
    pub fn new(kind: Kind, name: impl Into<String>, language: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            identity: Identity::new(kind, &name),
            kind,
            name,
            aliases: BTreeSet::new(),
            language: language.into(),
            popularity: None,
            genres: BTreeSet::new(),
            description: None,
            thumbnail: None,
            url: None,
            keywords: BTreeMap::new(),
            reference: None,
        }
    }

    pub fn with_aliases(mut self, aliases: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    pub fn with_popularity(mut self, popularity: u64) -> Self {
        self.popularity = Some(popularity);
        self
    }

    pub fn with_genres(mut self, genres: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.genres.extend(genres.into_iter().map(Into::into));
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_keyword(mut self, field: impl Into<String>, text: impl Into<String>) -> Self {
        self.keywords.insert(field.into(), text.into());
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn hash(&self) -> AddressableHash {
        self.identity.hash()
    }

    /// The name followed by every alias.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// Relevance multiplier: the popularity, floored at 1 so that an unknown
    /// or zero popularity never zeroes a title out of the results.
    pub fn popularity_boost(&self) -> u64 {
        self.popularity.unwrap_or(0).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_identity_is_derived() {
        let entry = CatalogEntry::new(Kind::Manga, "One Piece!!", "fr");
        assert_eq!(entry.identity(), &Identity::new(Kind::Manga, "one piece"));
        assert_eq!(entry.hash(), Identity::new(Kind::Manga, "One Piece").hash());
        assert_eq!(entry.name(), "One Piece!!");
    }

    #[test]
    fn test_names_starts_with_name() {
        let entry = CatalogEntry::new(Kind::Anime, "Shingeki no Kyojin", "en")
            .with_aliases(["Attack on Titan", "AoT"]);
        let names: Vec<_> = entry.names().collect();
        assert_eq!(names, vec!["Shingeki no Kyojin", "AoT", "Attack on Titan"]);
    }

    #[rstest]
    #[case(None, 1)]
    #[case(Some(0), 1)]
    #[case(Some(1), 1)]
    #[case(Some(250), 250)]
    fn test_popularity_boost(#[case] popularity: Option<u64>, #[case] expected: u64) {
        let mut entry = CatalogEntry::new(Kind::Anime, "Naruto", "en");
        entry.popularity = popularity;
        assert_eq!(entry.popularity_boost(), expected);
    }
}
