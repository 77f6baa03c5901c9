use mediadex_identity::{Identity, Kind};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Position of a chapter/episode within its title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Sequence {
    pub number: u32,
    /// Special releases slotted between two numbers (chapter 12.5)
    pub sub: Option<u32>,
}
impl Sequence {
    pub fn new(number: u32) -> Self {
        Self { number, sub: None }
    }

    pub fn special(number: u32, sub: u32) -> Self {
        Self { number, sub: Some(sub) }
    }
}
impl Display for Sequence {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self.sub {
            Some(sub) => write!(f, "{}.{}", self.number, sub),
            None => write!(f, "{}", self.number),
        }
    }
}

/// A provider-reported new chapter/episode.
///
/// Produced by the (external) polling collaborator, never stored here: the
/// catalog only uses it to look up display metadata by identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateEntry {
    pub identity: Identity,
    pub language: String,
    pub sequence: Sequence,
    pub url: String,
    /// Free-form display fields (chapter name, season, ...)
    pub fields: BTreeMap<String, String>,
}
impl UpdateEntry {
    pub fn new(
        kind: Kind,
        title: impl AsRef<str>,
        language: impl Into<String>,
        sequence: Sequence,
        url: impl Into<String>,
    ) -> Self {
        Self {
            identity: Identity::new(kind, title),
            language: language.into(),
            sequence,
            url: url.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn kind(&self) -> Kind {
        self.identity.kind()
    }

    /// What a user subscribes to: one title, in one language.
    ///
    /// Built from the addressable hash so it fits in constrained external
    /// identifiers whatever the title length.
    pub fn subscription_key(&self) -> String {
        format!("{}/{}/{}", self.kind(), self.identity.hash(), self.language)
    }

    /// Unique reference of this particular release.
    pub fn reference(&self) -> String {
        format!("{}/{}", self.subscription_key(), self.sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediadex_identity::HASH_LEN;

    #[test]
    fn test_sequence_display() {
        assert_eq!(Sequence::new(12).to_string(), "12");
        assert_eq!(Sequence::special(12, 5).to_string(), "12.5");
        assert!(Sequence::new(12) < Sequence::special(12, 5));
    }

    #[test]
    fn test_reference_is_bounded() {
        let title = "An Absurdly Long Light Novel Adaptation Title ".repeat(10);
        let update = UpdateEntry::new(Kind::Manga, &title, "fr", Sequence::new(1089), "https://example.com/1089");
        let hash = Identity::new(Kind::Manga, &title).hash();
        assert_eq!(update.subscription_key(), format!("manga/{hash}/fr"));
        assert_eq!(update.reference(), format!("manga/{hash}/fr/1089"));
        assert_eq!(update.reference().len(), "manga//fr/1089".len() + HASH_LEN);
    }
}
