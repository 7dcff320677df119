use std::cmp::Ordering;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// NFKD-decomposes then lowercases `text`.
///
/// Combining marks survive the decomposition, so `"café"` folds to
/// `"cafe\u{301}"` and does not match a stored `"Cafe"`.
pub fn normalize_search_text(text: &str) -> String {
    text.nfkd().collect::<String>().to_lowercase()
}

/// Ordering key with accents and case removed.
fn collation_key(text: &str) -> String {
    text.nfkd()
        .filter(|ch| !is_combining_mark(*ch))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Case- and accent-insensitive comparison with a raw-text tiebreak, so the
/// result is a total order.
pub fn locale_compare(left: &str, right: &str) -> Ordering {
    collation_key(left)
        .cmp(&collation_key(right))
        .then_with(|| left.cmp(right))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_search_text_lowercases_and_decomposes() {
        assert_eq!(normalize_search_text("Café"), "cafe\u{301}");
        assert_eq!(normalize_search_text("ＡＢＣ"), "abc");
    }

    #[test]
    fn locale_compare_ignores_case_and_accents_first() {
        assert_eq!(locale_compare("apple", "Banana"), Ordering::Less);
        assert_eq!(locale_compare("éclair", "eclipse"), Ordering::Less);
        assert_eq!(locale_compare("Zebra", "apple"), Ordering::Greater);
    }

    #[test]
    fn locale_compare_is_total_for_case_variants() {
        assert_ne!(locale_compare("Cat", "cat"), Ordering::Equal);
        assert_eq!(locale_compare("cat", "cat"), Ordering::Equal);
    }
}
