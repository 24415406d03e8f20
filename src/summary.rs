//! Summary labels shown in each audience's footer.

use crate::presets::{PresetMapping, PresetValue};

/// Summary of an empty or undefined selection.
pub const EMPTY_SUMMARY: &str = "-";

const NEGATION_PREFIX: &str = "NOT ";

/// Derives the label for one selector value.
///
/// Empty values read `-`, values matching a preset read as its name, and
/// anything else is described raw.
pub fn summarize<V: PresetValue>(value: Option<&V>, presets: &PresetMapping<V>) -> String {
    match value {
        None => EMPTY_SUMMARY.to_string(),
        Some(value) if value.is_empty() => EMPTY_SUMMARY.to_string(),
        Some(value) => match presets.resolve(value) {
            Some(name) => name.to_string(),
            None => value.describe(),
        },
    }
}

/// Label Audience B shows while it mirrors Audience A.
pub fn negate(summary: &str) -> String {
    format!("{NEGATION_PREFIX}{summary}")
}

/// Formats an integer with `,` thousands separators.
pub fn thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
