//! Provider adapter capability and bundled implementations.
//!
//! This module defines the [`Provider`] trait, the one seam between the
//! catalog and the sites it scrapes. Each site is its own type implementing
//! the capabilities it actually has; shared behaviour lives in free functions
//! such as [`matches_query`] rather than in a base type.

mod file;
#[cfg(feature = "mock")]
mod mock;

pub use self::file::FileProvider;
#[cfg(feature = "mock")]
pub use self::mock::MockProvider;
use crate::error::{ErrorKind, Result};
use crate::models::CatalogEntry;
use async_trait::async_trait;
use mediadex_identity::{Kind, normalize};

/// A provider-declared keyword field and its relevance boost.
///
/// Entries carry the text for these fields in
/// [`CatalogEntry::keywords`]; the inverted index searches them alongside the
/// title.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchField {
    pub name: String,
    pub boost: f64,
}
impl SearchField {
    pub fn new(name: impl Into<String>, boost: f64) -> Self {
        Self { name: name.into(), boost }
    }
}

/// Capability interface of a content provider.
///
/// Both capabilities are optional: most sites can list their whole catalog
/// ([`enumerate()`](Self::enumerate)), some only answer searches
/// ([`search()`](Self::search)). The defaults raise
/// [`ErrorKind::Unsupported`].
///
/// Implementations own their timeouts and retries for individual HTTP calls;
/// the aggregator additionally bounds each whole call.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use mediadex_catalog::{CatalogEntry, Provider};
/// use mediadex_catalog::error::Result;
/// use mediadex_identity::Kind;
///
/// struct Static;
///
/// #[async_trait]
/// impl Provider for Static {
///     fn name(&self) -> &str {
///         "static"
///     }
///     fn kind(&self) -> Kind {
///         Kind::Manga
///     }
///     async fn enumerate(&self) -> Result<Vec<CatalogEntry>> {
///         Ok(vec![CatalogEntry::new(Kind::Manga, "Berserk", "en")])
///     }
/// }
/// ```
#[async_trait]
pub trait Provider: Send + Sync {
    /// Name of the configured provider. Each provider's name is **supposed**
    /// to be unique within a kind; aggregators refuse duplicates.
    fn name(&self) -> &str;

    /// The kind of content this provider lists.
    fn kind(&self) -> Kind;

    /// Keyword fields this provider fills in on its entries.
    fn search_fields(&self) -> Vec<SearchField> {
        Vec::new()
    }

    /// List every title the provider currently knows about.
    ///
    /// May fail with [`ErrorKind::SourceUnavailable`]: sites go down all the
    /// time and that is not exceptional.
    async fn enumerate(&self) -> Result<Vec<CatalogEntry>> {
        exn::bail!(ErrorKind::Unsupported("enumerate"))
    }

    /// Search the provider directly, for sites that can't be enumerated.
    async fn search(&self, _query: &str) -> Result<Vec<CatalogEntry>> {
        exn::bail!(ErrorKind::Unsupported("search"))
    }
}

/// Whether any of the entry's names contains the (normalized) query.
///
/// Plain substring matching over normalized names, for providers whose search
/// is implemented locally.
pub fn matches_query(entry: &CatalogEntry, query: &str) -> bool {
    let query = normalize(query);
    entry.names().any(|name| normalize(name).contains(&query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    struct Listing;

    #[async_trait]
    impl Provider for Listing {
        fn name(&self) -> &str {
            "listing"
        }
        fn kind(&self) -> Kind {
            Kind::Anime
        }
    }

    #[tokio::test]
    async fn test_capabilities_default_to_unsupported() {
        let err = Listing.enumerate().await.unwrap_err();
        assert_eq!(*err, ErrorKind::Unsupported("enumerate"));
        let err = Listing.search("naruto").await.unwrap_err();
        assert_eq!(*err, ErrorKind::Unsupported("search"));
        assert!(Listing.search_fields().is_empty());
    }

    #[rstest]
    #[case("tower", true)]
    #[case("TOWER OF", true)]
    #[case("kami no", true)]
    #[case("", true)]
    #[case("lore", false)]
    fn test_matches_query(#[case] query: &str, #[case] expected: bool) {
        let entry = CatalogEntry::new(Kind::Webtoon, "Tower of God", "en").with_aliases(["Kami no Tou"]);
        assert_eq!(matches_query(&entry, query), expected);
    }
}
