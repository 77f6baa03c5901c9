//! JSON catalog files on disk.
//!
//! Stands in for a scraping adapter wherever a catalog has already been
//! exported (fixtures, offline mirrors, the CLI). The file is re-read on
//! every call so a refresh picks up edits.

use super::{Provider, SearchField, matches_query};
use crate::error::{ErrorKind, Result};
use crate::models::CatalogEntry;
use async_trait::async_trait;
use exn::ResultExt;
use mediadex_identity::Kind;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::instrument;

/// On-disk shape of one catalog record.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Record {
    name: String,
    language: String,
    #[serde(default)]
    aliases: BTreeSet<String>,
    popularity: Option<u64>,
    #[serde(default)]
    genres: BTreeSet<String>,
    description: Option<String>,
    thumbnail: Option<String>,
    url: Option<String>,
    #[serde(default)]
    keywords: BTreeMap<String, String>,
    reference: Option<String>,
}
impl Record {
    fn into_entry(self, kind: Kind) -> CatalogEntry {
        let mut entry = CatalogEntry::new(kind, self.name, self.language);
        entry.aliases = self.aliases;
        entry.popularity = self.popularity;
        entry.genres = self.genres;
        entry.description = self.description;
        entry.thumbnail = self.thumbnail;
        entry.url = self.url;
        entry.keywords = self.keywords;
        entry.reference = self.reference;
        entry
    }
}

/// Provider backed by a JSON array of catalog records.
///
/// ```json
/// [
///   { "name": "One Piece", "language": "fr", "aliases": ["ワンピース"], "popularity": 98 }
/// ]
/// ```
#[derive(Debug, Clone)]
pub struct FileProvider {
    name: String,
    kind: Kind,
    path: PathBuf,
    search_fields: Vec<SearchField>,
}
impl FileProvider {
    pub fn new(name: impl Into<String>, kind: Kind, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            kind,
            path: path.into(),
            search_fields: Vec::new(),
        }
    }

    pub fn with_search_field(mut self, name: impl Into<String>, boost: f64) -> Self {
        self.search_fields.push(SearchField::new(name, boost));
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<CatalogEntry>> {
        // A missing or unreadable file is the on-disk equivalent of a site
        // being down: transient, retried at the next refresh.
        let bytes = tokio::fs::read(&self.path).await.or_raise(|| ErrorKind::SourceUnavailable(self.name.clone()))?;
        let records: Vec<Record> = serde_json::from_slice(&bytes)
            .or_raise(|| ErrorKind::InvalidData(format!("{}: {}", self.name, self.path.display())))?;
        Ok(records.into_iter().map(|record| record.into_entry(self.kind)).collect())
    }
}

#[async_trait]
impl Provider for FileProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> Kind {
        self.kind
    }

    fn search_fields(&self) -> Vec<SearchField> {
        self.search_fields.clone()
    }

    #[instrument(skip(self), fields(provider = %self.name, path = %self.path.display()))]
    async fn enumerate(&self) -> Result<Vec<CatalogEntry>> {
        let entries = self.load().await?;
        tracing::debug!(entries = entries.len(), "Catalog file loaded");
        Ok(entries)
    }

    async fn search(&self, query: &str) -> Result<Vec<CatalogEntry>> {
        Ok(self.load().await?.into_iter().filter(|entry| matches_query(entry, query)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn catalog(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_enumerate() {
        let file = catalog(
            r#"[
                {"name": "One Piece", "language": "fr", "aliases": ["OP"], "popularity": 98, "genres": ["Action"]},
                {"name": "Berserk", "language": "en", "keywords": {"title_english": "Berserk"}}
            ]"#,
        );
        let provider = FileProvider::new("local", Kind::Manga, file.path());
        let entries = provider.enumerate().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name(), "One Piece");
        assert_eq!(entries[0].kind(), Kind::Manga);
        assert_eq!(entries[0].popularity, Some(98));
        assert!(entries[0].aliases.contains("OP"));
        assert_eq!(entries[1].keywords.get("title_english").map(String::as_str), Some("Berserk"));
        assert_eq!(entries[1].popularity, None);
    }

    #[tokio::test]
    async fn test_missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileProvider::new("gone", Kind::Anime, dir.path().join("nope.json"));
        let err = provider.enumerate().await.unwrap_err();
        assert_eq!(*err, ErrorKind::SourceUnavailable("gone".to_string()));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_malformed_file_is_invalid() {
        let file = catalog(r#"{"name": "not a list"}"#);
        let provider = FileProvider::new("broken", Kind::Anime, file.path());
        let err = provider.enumerate().await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidData(_)));
    }

    #[tokio::test]
    async fn test_search_filters() {
        let file = catalog(
            r#"[
                {"name": "Tower of God", "language": "en", "aliases": ["Kami no Tou"]},
                {"name": "Lore Olympus", "language": "en"}
            ]"#,
        );
        let provider = FileProvider::new("webtoons", Kind::Webtoon, file.path()).with_search_field("author", 1.0);
        let results = provider.search("kami").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name(), "Tower of God");
        assert_eq!(provider.search_fields(), vec![SearchField::new("author", 1.0)]);
    }
}
