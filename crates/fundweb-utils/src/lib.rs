//! Utility functions and helpers

use uuid::Uuid;

/// Format a number with thousands separators.
///
/// Only the integer part is grouped; a leading sign and a fractional part are
/// passed through untouched.
pub fn format_number<T: ToString>(n: T, separator: &str) -> String {
    let s = n.to_string();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s.as_str()),
    };
    let (int_part, frac_part) = match digits.find('.') {
        Some(pos) => (&digits[..pos], &digits[pos..]),
        None => (digits, ""),
    };

    let mut grouped = String::new();
    let mut count = 0;
    for c in int_part.chars().rev() {
        if count == 3 {
            grouped.push_str(&separator.chars().rev().collect::<String>());
            count = 0;
        }
        grouped.push(c);
        count += 1;
    }
    let int_part: String = grouped.chars().rev().collect();
    format!("{}{}{}", sign, int_part, frac_part)
}

/// Generate a unique object identifier of the form `PHID-<TYPE>-<suffix>`.
pub fn generate_phid(type_const: &str) -> String {
    format!("PHID-{}-{}", type_const, Uuid::new_v4().simple())
}
