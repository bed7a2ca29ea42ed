//! Stop name normalization.

use unicode_normalization::UnicodeNormalization;

/// Normalize a stop or line name for comparison.
///
/// Case-folds, strips Latin diacritics, trims, and collapses runs of
/// whitespace to a single space.
///
/// # Examples
///
/// ```
/// use bus_server::domain::normalize_name;
///
/// assert_eq!(normalize_name("  Psar  Thmei "), "psar thmei");
/// assert_eq!(normalize_name("Café Évry"), "cafe evry");
/// ```
pub fn normalize_name(s: &str) -> String {
    let stripped: String = s
        .nfd()
        .filter(|c| !is_latin_diacritic(*c))
        .nfc()
        .collect::<String>()
        .to_lowercase();

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Combining marks from the diacritical blocks only.
///
/// Khmer vowel signs are combining marks too and must survive.
fn is_latin_diacritic(c: char) -> bool {
    matches!(
        c,
        '\u{0300}'..='\u{036F}'
            | '\u{1AB0}'..='\u{1AFF}'
            | '\u{1DC0}'..='\u{1DFF}'
            | '\u{20D0}'..='\u{20FF}'
            | '\u{FE20}'..='\u{FE2F}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_folds() {
        assert_eq!(normalize_name("CENTRAL Market"), "central market");
    }

    #[test]
    fn strips_precomposed_and_decomposed_accents() {
        assert_eq!(normalize_name("Hôtel"), "hotel");
        assert_eq!(normalize_name("Ho\u{0302}tel"), "hotel");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize_name("\tNational  Road\nNo 5 "), "national road no 5");
        assert_eq!(normalize_name("   "), "");
    }

    #[test]
    fn keeps_khmer_vowel_signs() {
        // ផ្សារ (psar): coeng and vowel sign are combining marks
        let psar = "ផ្សារ";
        assert_eq!(normalize_name(psar), psar);
    }
}
