// Parsing, rounding and formatting helpers.
//
// This module centralizes all the "dirty" cell handling so the rest of the
// code can assume clean, typed values.
use num_format::{Locale, ToFormattedString};

use crate::types::Cell;

/// Round to two decimal places, half away from zero.
pub fn round2(n: f64) -> f64 {
    (n * 100.0).round() / 100.0
}

/// Coerce a cell into a finite `f64`.
///
/// - Numbers pass through, booleans become `1` / `0`.
/// - Text is trimmed; blank text counts as missing.
/// - Returns `None` for anything that does not give a finite number.
pub fn number_or_null(cell: &Cell) -> Option<f64> {
    let n = match cell {
        Cell::Empty => return None,
        Cell::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Cell::Number(n) => *n,
        Cell::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse::<f64>().ok()?
        }
    };
    n.is_finite().then_some(n)
}

/// Multiplying factor of a reading: anything missing, zero or unparseable is 1.
pub fn multiplier_or_one(cell: &Cell) -> f64 {
    match number_or_null(cell) {
        Some(mf) if mf != 0.0 => mf,
        _ => 1.0,
    }
}

/// Parse an SLA flag.
///
/// Recognized yes/no tokens are matched case-insensitively after trimming.
/// Anything else falls back to plain truthiness of the raw cell, so an
/// unrecognized non-empty string counts as `true`.
pub fn parse_yes_no(cell: &Cell) -> bool {
    let text = match cell {
        Cell::Empty => return false,
        Cell::Bool(b) => return *b,
        Cell::Number(n) => n.to_string(),
        Cell::Text(s) => s.clone(),
    };
    match text.trim().to_lowercase().as_str() {
        "yes" | "y" | "true" | "1" => return true,
        "no" | "n" | "false" | "0" => return false,
        _ => {}
    }
    match cell {
        Cell::Number(n) => *n != 0.0 && !n.is_nan(),
        Cell::Text(s) => !s.is_empty(),
        _ => false,
    }
}

/// Strict approval flag used by the meter register: only `yes` / `approved`.
pub fn is_affirmative(cell: &Cell) -> bool {
    let s = cell.to_key().trim().to_lowercase();
    s == "yes" || s == "approved"
}

/// `part / whole` as a percentage rounded to two decimals; `0` for an empty whole.
pub fn pct(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round2(part as f64 / whole as f64 * 100.0)
}

/// Sum the present values, or `None` when nothing is present.
pub fn sum_present<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    values
        .into_iter()
        .flatten()
        .fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
}

pub fn pct_or_dash(v: Option<f64>) -> String {
    match v {
        Some(v) if v.is_finite() => format!("{:.2}%", v),
        _ => "—".to_string(),
    }
}

pub fn num_or_dash(v: Option<f64>) -> String {
    match v {
        Some(v) if v.is_finite() => format_number(v, 2),
        _ => "—".to_string(),
    }
}

/// Fixed-decimal rendering with `en` thousands separators, e.g. `1,234.50`.
pub fn format_number(n: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, n.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let mut out = whole.parse::<u64>().unwrap_or(0).to_formatted_string(&Locale::en);
    if !frac.is_empty() {
        out.push('.');
        out.push_str(frac);
    }
    if n.is_sign_negative() && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.insert(0, '-');
    }
    out
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(round2(33.333333), 33.33);
        assert_eq!(round2(2.675_1), 2.68);
        assert_eq!(round2(-4.444), -4.44);
    }

    #[test]
    fn numeric_coercion() {
        assert_eq!(number_or_null(&Cell::from(" 12.5 ")), Some(12.5));
        assert_eq!(number_or_null(&Cell::Number(3.0)), Some(3.0));
        assert_eq!(number_or_null(&Cell::Bool(true)), Some(1.0));
        assert_eq!(number_or_null(&Cell::from("")), None);
        assert_eq!(number_or_null(&Cell::from("abc")), None);
        assert_eq!(number_or_null(&Cell::from("inf")), None);
        assert_eq!(number_or_null(&Cell::Number(f64::NAN)), None);
        assert_eq!(number_or_null(&Cell::Empty), None);
    }

    #[test]
    fn multiplier_defaults_to_one() {
        assert_eq!(multiplier_or_one(&Cell::Empty), 1.0);
        assert_eq!(multiplier_or_one(&Cell::Number(0.0)), 1.0);
        assert_eq!(multiplier_or_one(&Cell::from("x")), 1.0);
        assert_eq!(multiplier_or_one(&Cell::from("40")), 40.0);
    }

    #[test]
    fn yes_no_tokens() {
        for yes in ["Yes", " y ", "TRUE", "1"] {
            assert!(parse_yes_no(&Cell::from(yes)), "{yes}");
        }
        for no in ["No", "n", "False", " 0 "] {
            assert!(!parse_yes_no(&Cell::from(no)), "{no}");
        }
        assert!(parse_yes_no(&Cell::Number(1.0)));
        assert!(!parse_yes_no(&Cell::Number(0.0)));
        assert!(!parse_yes_no(&Cell::Empty));
        assert!(!parse_yes_no(&Cell::from("")));
    }

    #[test]
    fn yes_no_truthy_fallback() {
        assert!(parse_yes_no(&Cell::from("Pending")));
        assert!(parse_yes_no(&Cell::from("   ")));
        assert!(parse_yes_no(&Cell::Number(2.0)));
    }

    #[test]
    fn affirmative_only_accepts_yes_or_approved() {
        assert!(is_affirmative(&Cell::from(" Approved")));
        assert!(is_affirmative(&Cell::from("YES")));
        assert!(!is_affirmative(&Cell::from("y")));
        assert!(!is_affirmative(&Cell::Empty));
    }

    #[test]
    fn percentages() {
        assert_eq!(pct(3, 10), 30.0);
        assert_eq!(pct(1, 3), 33.33);
        assert_eq!(pct(5, 0), 0.0);
    }

    #[test]
    fn sums_skip_missing_values() {
        assert_eq!(sum_present([Some(1.5), None, Some(2.0)]), Some(3.5));
        assert_eq!(sum_present([None, None]), None);
        assert_eq!(sum_present(Vec::<Option<f64>>::new()), None);
    }

    #[test]
    fn formats_numbers() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-12.5, 2), "-12.50");
        assert_eq!(pct_or_dash(None), "—");
        assert_eq!(pct_or_dash(Some(5.0)), "5.00%");
        assert_eq!(format_int(9855usize), "9,855");
    }
}
