//! Similarity scoring.

use rapidfuzz::fuzz;

/// Lowercases a label. Whitespace is compared as written.
pub fn normalize_label(raw: &str) -> String {
    raw.to_lowercase()
}

/// Case-insensitive similarity of two labels on a 0..=100 scale.
///
/// Normalized indel similarity (twice the longest common subsequence over
/// the combined length), rounded to the nearest integer.
pub fn similarity(a: &str, b: &str) -> u8 {
    let a = normalize_label(a);
    let b = normalize_label(b);
    let ratio = fuzz::ratio(a.chars(), b.chars());
    (ratio * 100.0).round().clamp(0.0, 100.0) as u8
}
