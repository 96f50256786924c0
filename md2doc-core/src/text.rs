//! Number formatting for body text and table cells

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9]+)(\.[0-9]+)?").unwrap());

static NUMERIC_CELL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?[0-9][0-9,]*(\.[0-9]+)?%?$").unwrap());

/// Insert thousands separators into every decimal number in `text`.
///
/// The integer part is grouped by three digits from the right; the fractional
/// part and every non-digit character are left as they are. Leading zeros are kept.
///
/// ```text
/// 销售额1234567.5元  ->  销售额1,234,567.5元
/// ```
pub fn format_thousands(text: &str) -> String {
    NUMBER
        .replace_all(text, |caps: &Captures| {
            let integer = group_digits(&caps[1]);
            match caps.get(2) {
                Some(fraction) => format!("{integer}{}", fraction.as_str()),
                None => integer,
            }
        })
        .into_owned()
}

fn group_digits(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// True when the whole (trimmed) cell is a number, optionally signed or a percentage.
pub fn looks_numeric(cell: &str) -> bool {
    NUMERIC_CELL.is_match(cell.trim())
}

/// Cell text as it should be shown: numeric cells get thousands separators.
pub fn format_cell(cell: &str) -> String {
    if looks_numeric(cell) {
        format_thousands(&cell.trim().replace(',', ""))
    } else {
        cell.to_string()
    }
}
