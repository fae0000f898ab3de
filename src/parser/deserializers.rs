use chrono::{NaiveDate, NaiveDateTime};

use crate::period::Period;

const DATETIME_FMTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

const DATE_FMT: &str = "%Y-%m-%d";

/// Parse a datetime cell. Accepts the documented export formats plus a bare
/// date (taken as midnight). Returns None for empty or unparseable input.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    for fmt in DATETIME_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(trimmed, DATE_FMT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parse a month cell: "2025-06", "Jun 2025", or "June 2025".
pub fn parse_month(s: &str) -> Option<Period> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some((y, m)) = trimmed.split_once('-') {
        return Period::new(y.trim().parse().ok()?, parse_month_component(m)?);
    }
    let mut parts = trimmed.split_whitespace();
    let name = parts.next()?;
    let year = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Period::new(year.parse().ok()?, parse_month_component(name)?)
}

/// Parse a year cell ("2025", or "2025.0" as pandas sometimes writes it).
pub fn parse_year(s: &str) -> Option<i32> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(y) = trimmed.parse::<i32>() {
        return Some(y);
    }
    let f: f64 = trimmed.parse().ok()?;
    if f.fract() == 0.0 {
        Some(f as i32)
    } else {
        None
    }
}

/// A month on its own: "6", "06", "Jun", or "June".
pub fn parse_month_component(s: &str) -> Option<u32> {
    let trimmed = s.trim();
    if let Ok(m) = trimmed.parse::<u32>() {
        return (1..=12).contains(&m).then_some(m);
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.len() < 3 {
        return None;
    }
    const NAMES: [&str; 12] = [
        "january",
        "february",
        "march",
        "april",
        "may",
        "june",
        "july",
        "august",
        "september",
        "october",
        "november",
        "december",
    ];
    NAMES
        .iter()
        .position(|name| name.starts_with(&lower) && lower.len() <= name.len())
        .map(|i| i as u32 + 1)
}

/// Parse a numeric cell. Empty cells are None; anything unparseable is
/// also None so the caller can decide whether that drops the row.
pub fn parse_f64(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Parse a percentage cell ("12.5" or "12.5%") into a fraction in [0, 1].
pub fn parse_pct(s: &str) -> Option<f64> {
    let trimmed = s.trim().trim_end_matches('%').trim_end();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().map(|v| v / 100.0)
}
