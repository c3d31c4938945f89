//! Text folding for search and ordering.
//!
//! Course codes and names are mostly Turkish and English. Ordering compares an
//! accent- and case-folded primary key first, so `Çevre` sorts next to `Cevre`
//! rather than after `Z`, and falls back to the raw strings to stay total.

use std::cmp::Ordering;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonical lowercase form used for matching
pub fn fold_case(s: &str) -> String {
    s.nfc().collect::<String>().to_lowercase()
}

/// Case-insensitive substring test
pub fn contains_folded(haystack: &str, needle: &str) -> bool {
    fold_case(haystack).contains(&fold_case(needle))
}

fn primary_key(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| if c == 'ı' { 'i' } else { c })
        .collect::<String>()
        .to_lowercase()
}

/// Locale-aware string comparison
pub fn compare(a: &str, b: &str) -> Ordering {
    primary_key(a)
        .cmp(&primary_key(b))
        .then_with(|| a.cmp(b))
}
