//! Argument normalizers
//!
//! The model's emitted arguments are untrusted structured text. These
//! helpers fold user-friendly spellings into the canonical forms the
//! executors expect; anything that does not normalize cleanly is a
//! validation failure upstream.

use chrono::{Duration, Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

static DAY_MONTH_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})[-/](\d{1,2})[-/](\d{4})$").expect("valid regex"));

static CITY_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bcity\b").expect("valid regex"));

/// Text date formats accepted in addition to ISO, e.g. "19 Feb 2026"
const TEXT_DATE_FORMATS: &[&str] = &["%d %b %Y", "%d %B %Y", "%b %d %Y", "%B %d %Y"];

/// Normalize a date argument to ISO `YYYY-MM-DD`
///
/// Accepts `today`, `tomorrow`, ISO dates, `DD-MM-YYYY`, `DD/MM/YYYY` and a
/// few textual forms. Returns an error message suitable for a bad-argument
/// payload when nothing matches.
pub fn normalize_date(input: &str) -> Result<NaiveDate, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("date must not be empty".to_string());
    }

    match trimmed.to_ascii_lowercase().as_str() {
        "today" => return Ok(Local::now().date_naive()),
        "tomorrow" => return Ok(Local::now().date_naive() + Duration::days(1)),
        _ => {}
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }

    if let Some(caps) = DAY_MONTH_YEAR.captures(trimmed) {
        let day: u32 = caps[1].parse().map_err(|_| invalid_date(trimmed))?;
        let month: u32 = caps[2].parse().map_err(|_| invalid_date(trimmed))?;
        let year: i32 = caps[3].parse().map_err(|_| invalid_date(trimmed))?;
        return NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| invalid_date(trimmed));
    }

    for format in TEXT_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(date);
        }
    }

    Err(invalid_date(trimmed))
}

fn invalid_date(input: &str) -> String {
    format!("invalid date {input:?}: use YYYY-MM-DD, today or tomorrow")
}

/// Normalize a city argument
///
/// Strips a trailing/leading "city" word and title-cases the remainder, so
/// "pune city" and "new york" become "Pune" and "New York".
pub fn normalize_city(input: &str) -> Result<String, String> {
    let stripped = CITY_WORD.replace_all(input, "");
    let words: Vec<String> = stripped
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();

    if words.is_empty() {
        return Err("city must not be empty".to_string());
    }
    Ok(words.join(" "))
}

/// Normalize a currency code to upper case
///
/// Only shape is checked here; membership in the supported code set is the
/// registry's concern.
pub fn normalize_currency(input: &str) -> Result<String, String> {
    let code = input.trim().to_ascii_uppercase();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code)
    } else {
        Err(format!(
            "invalid currency code {input:?}: expected a 3-letter alphabetic code"
        ))
    }
}
