use crate::error::{Error, ErrorKind};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// The kind of content a title belongs to.
///
/// Kinds partition the catalog: each kind has its own aggregator, and the same
/// title name under two kinds is two different identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(rename_all = "lowercase"))]
pub enum Kind {
    /// Manga/scans, updated per chapter.
    Manga,
    /// Anime, updated per episode.
    Anime,
    /// Webtoons, updated per episode.
    Webtoon,
}
impl Kind {
    /// Every kind, in display order.
    pub const ALL: [Kind; 3] = [Kind::Manga, Kind::Anime, Kind::Webtoon];

    /// Returns the lowercase string form used inside identities.
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Manga => "manga",
            Kind::Anime => "anime",
            Kind::Webtoon => "webtoon",
        }
    }
}
impl FromStr for Kind {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "manga" | "mangas" | "scan" | "scans" => Self::Manga,
            "anime" | "animes" => Self::Anime,
            "webtoon" | "webtoons" => Self::Webtoon,
            _ => exn::bail!(ErrorKind::UnknownKind(s.to_string())),
        })
    }
}
impl Display for Kind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("manga", Kind::Manga)]
    #[case("Scans", Kind::Manga)]
    #[case(" ANIME ", Kind::Anime)]
    #[case("webtoons", Kind::Webtoon)]
    fn test_parse(#[case] input: &str, #[case] expected: Kind) {
        assert_eq!(input.parse::<Kind>().unwrap(), expected);
    }

    #[test]
    fn test_parse_unknown() {
        let err = "novel".parse::<Kind>().unwrap_err();
        assert_eq!(*err, ErrorKind::UnknownKind("novel".to_string()));
    }

    #[test]
    fn test_display_round_trips() {
        for kind in Kind::ALL {
            assert_eq!(kind.to_string().parse::<Kind>().unwrap(), kind);
        }
    }
}
