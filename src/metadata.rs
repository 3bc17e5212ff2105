//! Best-effort name and date candidates.
//!
//! Both extractors are heuristics: sentence-initial capitals show up as
//! names, and dates written across several words are never recognized.

use std::{collections::BTreeSet, sync::LazyLock};

use chrono::NaiveDate;
use regex::Regex;

static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z][a-z]+\s[A-Z][a-z]+\b")
        .expect("name pattern is a valid regex")
});

/// Single-token layouts tried in order. Month-first layouts come before
/// day-first ones, so `03/04/2015` is March 4th and `13/04/2015` falls
/// through to April 13th.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%m.%d.%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%m/%d/%y",
    "%d-%b-%Y",
    "%b-%d-%Y",
    "%Y-%b-%d",
];

/// Distinct "Capitalized Capitalized" word pairs, sorted.
pub fn candidate_names(text: &str) -> Vec<String> {
    NAME_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Every whitespace-delimited token that parses as a calendar date,
/// deduplicated and sorted ascending.
pub fn candidate_dates(text: &str) -> Vec<NaiveDate> {
    text.split_whitespace()
        .filter_map(parse_date_token)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Parse one token as a date. Surrounding punctuation is ignored and a
/// trailing time component (`2015-03-04T10:00`) is dropped.
///
/// Bare numbers other than eight-digit `YYYYMMDD` never parse: they carry
/// no month or day, and filling those in from the clock would make the
/// result depend on when the scan ran.
pub fn parse_date_token(token: &str) -> Option<NaiveDate> {
    let token = token.trim_matches(|c: char| {
        matches!(c, ',' | ';' | ':' | '.' | '(' | ')' | '[' | ']' | '"' | '\'')
    });
    if token.len() < 6 {
        return None;
    }

    let token = match token.split_once('T') {
        Some((date, time))
            if date.starts_with(|c: char| c.is_ascii_digit())
                && time.starts_with(|c: char| c.is_ascii_digit()) =>
        {
            date
        }
        _ => token,
    };

    if token.len() == 8 && token.bytes().all(|b| b.is_ascii_digit()) {
        return parse_compact(token);
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(token, format).ok())
}

fn parse_compact(digits: &str) -> Option<NaiveDate> {
    let year = digits[..4].parse().ok()?;
    let month = digits[4..6].parse().ok()?;
    let day = digits[6..].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
