//! Bag-type field parsing
//!
//! A bag-splitting row packs several products at once. It stores the product
//! codes and their bag counts as two parallel comma-separated fields:
//!
//! ```text
//! bag_codes  = "FG-25, FG-25S, FG-50"
//! bag_counts = "10, 4, 2"
//! ```

use rust_decimal::Decimal;

/// Split a comma-separated field into trimmed tokens
pub fn split_field(field: &str) -> impl Iterator<Item = &str> {
    field.split(',').map(str::trim)
}

/// Bag count packed for `code` in one row.
///
/// Codes are compared token by token after trimming, never by substring, so
/// `FG-25` does not match `FG-25S`. A missing or malformed count is 0.
pub fn bag_count(bag_codes: &str, bag_counts: &str, code: &str) -> Decimal {
    let code = code.trim();
    let counts: Vec<&str> = split_field(bag_counts).collect();

    split_field(bag_codes)
        .enumerate()
        .filter(|(_, token)| *token == code)
        .map(|(i, _)| {
            counts
                .get(i)
                .and_then(|count| count.parse::<Decimal>().ok())
                .unwrap_or(Decimal::ZERO)
        })
        .sum()
}

/// Whether `code` appears as a whole token of `bag_codes`
pub fn contains_code(bag_codes: &str, code: &str) -> bool {
    let code = code.trim();
    split_field(bag_codes).any(|token| token == code)
}
