//! Display formatting for project rows.
//!
//! Nothing here fails: a value that cannot be read is shown as it came from
//! the store.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%d-%b-%y"];

const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Visual class of a situation badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum SituationStyle {
    Info,
    Warning,
    Success,
    Neutral,
}

impl SituationStyle {
    pub(crate) fn classify(situation: &str) -> Self {
        let lowered = situation.to_lowercase();
        if lowered.contains("ejecuc") {
            Self::Info
        } else if lowered.contains("suscrit") {
            Self::Warning
        } else if lowered.contains("finaliz") {
            Self::Success
        } else {
            Self::Neutral
        }
    }
}

/// `dd/mm/yyyy`, or the stored text when it is not a recognised date.
pub(crate) fn format_date(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return String::new();
    };
    match parse_date(raw.trim()) {
        Some(date) => date.format("%d/%m/%Y").to_string(),
        None => raw.to_string(),
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
    {
        return Some(date);
    }
    if let Some(datetime) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(datetime.date());
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|datetime| datetime.date_naive())
}

/// `$` and the amount rounded to whole units, thousands separated by `.`.
pub(crate) fn format_currency(value: Option<f64>) -> String {
    let Some(value) = value else {
        return "$0".to_string();
    };
    if !value.is_finite() {
        return value.to_string();
    }
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    if rounded < 0.0 {
        grouped.push('-');
    }
    grouped.push('$');
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }
    grouped
}
