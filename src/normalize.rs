//! Name normalization.
//!
//! FanGraphs reports names with their accents ("Julio Rodríguez"). URL slugs
//! and ASCII output need the bare Latin letters instead.

use unicode_normalization::UnicodeNormalization;

/// Combining diacritical marks block.
const COMBINING_MARKS: std::ops::RangeInclusive<char> = '\u{0300}'..='\u{036f}';

/// Strip diacritical marks from a name.
///
/// The input is decomposed (NFD) so that accented letters split into a base
/// letter followed by combining marks, and the marks are dropped.
pub fn normalize_name(name: &str) -> String {
    if name.is_ascii() {
        return name.to_string();
    }

    name.nfd().filter(|c| !COMBINING_MARKS.contains(c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_accents() {
        assert_eq!(normalize_name("Julio Rodríguez"), "Julio Rodriguez");
        assert_eq!(normalize_name("José Ramírez"), "Jose Ramirez");
        assert_eq!(normalize_name("Shōhei Ohtani"), "Shohei Ohtani");
        assert_eq!(normalize_name("Max Müller"), "Max Muller");
        assert_eq!(normalize_name("François Pérez"), "Francois Perez");
    }

    #[test]
    fn test_ascii_unchanged() {
        assert_eq!(normalize_name("Mike Trout"), "Mike Trout");
        assert_eq!(normalize_name("Bobby Witt Jr."), "Bobby Witt Jr.");
        assert_eq!(normalize_name(""), "");
    }

    #[test]
    fn test_idempotent() {
        for name in ["Julio Rodríguez", "Ronald Acuña Jr.", "Mike Trout", "Yoán Moncada"] {
            let once = normalize_name(name);
            assert_eq!(normalize_name(&once), once);
        }
    }

    #[test]
    fn test_precomposed_and_decomposed_agree() {
        // "í" as a single code point vs "i" + combining acute
        assert_eq!(normalize_name("Rodr\u{ed}guez"), normalize_name("Rodri\u{301}guez"));
    }
}
