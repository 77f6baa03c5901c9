use mediadex_catalog::CatalogEntry;
use mediadex_identity::{AddressableHash, Identity};

const ELLIPSIS: char = '…';

/// One ranked search result, ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub identity: Identity,
    pub hash: AddressableHash,
    pub name: String,
    pub language: String,
    pub score: f64,
}
impl SearchHit {
    pub fn new(entry: &CatalogEntry, score: f64) -> Self {
        Self {
            identity: entry.identity().clone(),
            hash: entry.hash(),
            name: entry.name().to_string(),
            language: entry.language.clone(),
            score,
        }
    }

    /// `Name (language)`, with the name cut to at most `max_chars` characters.
    pub fn label(&self, max_chars: usize) -> String {
        if self.name.chars().count() <= max_chars {
            return format!("{} ({})", self.name, self.language);
        }
        let mut name: String = self.name.chars().take(max_chars.saturating_sub(1)).collect();
        name.push(ELLIPSIS);
        format!("{name} ({})", self.language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediadex_identity::Kind;
    use rstest::rstest;

    #[rstest]
    #[case("One Piece", 80, "One Piece (fr)")]
    #[case("One Piece", 9, "One Piece (fr)")]
    #[case("One Piece", 8, "One Pie… (fr)")]
    #[case("Pokémon Adventures", 5, "Poké… (fr)")]
    #[case("One Piece", 1, "… (fr)")]
    fn test_label(#[case] name: &str, #[case] max_chars: usize, #[case] expected: &str) {
        let hit = SearchHit::new(&CatalogEntry::new(Kind::Manga, name, "fr"), 1.0);
        assert_eq!(hit.label(max_chars), expected);
    }

    #[test]
    fn test_hit_carries_identity() {
        let entry = CatalogEntry::new(Kind::Anime, "Cowboy Bebop", "ja");
        let hit = SearchHit::new(&entry, 2.5);
        assert_eq!(&hit.identity, entry.identity());
        assert_eq!(hit.hash, entry.identity().hash());
        assert_eq!(hit.language, "ja");
    }
}
