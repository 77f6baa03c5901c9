use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Characters dropped without leaving a word boundary, so "JoJo's" and "JoJos"
/// fold to the same key.
const APOSTROPHES: [char; 4] = ['\'', '’', '‘', 'ʼ'];

/// Folds a title into its canonical lookup key.
///
/// - Case folding is locale-insensitive (Unicode default lowercase mapping),
/// - diacritics are removed by NFKD decomposition and dropping combining marks,
///   which also maps compatibility forms (full-width letters, ligatures) to
///   their plain equivalents,
/// - apostrophes are removed, every other non-alphanumeric character becomes a
///   word boundary, and
/// - runs of boundaries collapse into a single space, trimmed at both ends.
///
/// Total and idempotent: `normalize(normalize(x)) == normalize(x)`, and the
/// empty string maps to itself.
///
/// # Examples
///
/// ```
/// use mediadex_identity::normalize;
/// assert_eq!(normalize("One Piece"), "one piece");
/// assert_eq!(normalize("one   piece!!"), "one piece");
/// assert_eq!(normalize("Pokémon: Ｓｅｒｉｅｓ"), "pokemon series");
/// assert_eq!(normalize(""), "");
/// ```
pub fn normalize(name: impl AsRef<str>) -> String {
    // Lowercase on both sides of the decomposition: some compatibility
    // characters only decompose into an uppercase letter (ℌ -> H), and some
    // lowercase mappings introduce a combining mark (İ -> i + U+0307).
    let folded = name
        .as_ref()
        .to_lowercase()
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();
    let mut key = String::with_capacity(folded.len());
    let mut boundary = false;
    for c in folded.chars() {
        if APOSTROPHES.contains(&c) {
            continue;
        }
        if !c.is_alphanumeric() {
            boundary = true;
            continue;
        }
        if boundary && !key.is_empty() {
            key.push(' ');
        }
        boundary = false;
        key.push(c);
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("One Piece", "one piece")]
    #[case("one   piece!!", "one piece")]
    #[case("  Pokémon  ", "pokemon")]
    #[case("Ñandú", "nandu")]
    #[case("Shingeki no Kyojin: The Final Season", "shingeki no kyojin the final season")]
    #[case("JoJo's Bizarre Adventure", "jojos bizarre adventure")]
    #[case("JoJo’s Bizarre Adventure", "jojos bizarre adventure")]
    #[case("Re:Zero", "re zero")]
    #[case("Ｆｕｌｌｗｉｄｔｈ", "fullwidth")]
    #[case("İstanbul", "istanbul")]
    #[case("Straße", "straße")]
    #[case("Tab\tand\nnewline", "tab and newline")]
    #[case("", "")]
    #[case("!!! ...", "")]
    fn test_normalize(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize(input), expected);
    }

    #[rstest]
    #[case("One Piece")]
    #[case("ℌello ǅemal")]
    #[case("½ Prince")]
    #[case("Ｆｕｌｌｗｉｄｔｈ Ｔｉｔｌｅ")]
    #[case("Kaguya-sama wa Kokurasetai ~Tensai-tachi no Renai Zunousen~")]
    #[case("ＫＥＬＶＩＮ K")]
    #[case("  ")]
    fn test_idempotent(#[case] input: &str) {
        let once = normalize(input);
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn test_compatibility_uppercase_is_folded() {
        assert_eq!(normalize("ℌ"), "h");
    }
}
