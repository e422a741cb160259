use std::sync::LazyLock;

use regex::Regex;

static CURRENCY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)NT\$|TWD|\$|元").expect("hardcoded currency regex is valid")
});

// Last period followed by one or two digits at the end reads as a decimal point.
static DECIMAL_TAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<integer>.*)\.\d{1,2}$").expect("hardcoded decimal regex is valid")
});

/// Reduces an OCR'd money amount to its integer digits.
///
/// Currency markers, comma and whitespace separators are removed. A trailing
/// `.d` or `.dd` is taken as a decimal fraction and dropped, and every other
/// period is a thousands separator. The result is empty or all ASCII digits,
/// and normalizing it again returns it unchanged.
#[must_use]
pub fn normalize_amount(raw: &str) -> String {
    let without_currency = CURRENCY_RE.replace_all(raw, "");
    let compact = without_currency
        .chars()
        .filter(|ch| *ch != ',' && !ch.is_whitespace())
        .collect::<String>();

    let integer_part = DECIMAL_TAIL_RE
        .captures(&compact)
        .and_then(|capture| capture.name("integer"))
        .map_or(compact.as_str(), |integer| integer.as_str());

    integer_part.chars().filter(char::is_ascii_digit).collect()
}
