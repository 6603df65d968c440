use std::sync::{Arc, LazyLock};

use chrono::{Local, NaiveDate};
use regex::Regex;

static RE_SPANISH_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s+de\s+(\w+)\s+de\s+(\d{4})")
        .expect("invalid regex: spanish date")
});

const RELATIVE_MARKERS: [&str; 4] = ["hoy", "ayer", "hora", "minuto"];

fn spanish_month(name: &str) -> Option<u32> {
    match name.to_lowercase().as_str() {
        "enero" => Some(1),
        "febrero" => Some(2),
        "marzo" => Some(3),
        "abril" => Some(4),
        "mayo" => Some(5),
        "junio" => Some(6),
        "julio" => Some(7),
        "agosto" => Some(8),
        "septiembre" | "setiembre" => Some(9),
        "octubre" => Some(10),
        "noviembre" => Some(11),
        "diciembre" => Some(12),
        _ => None,
    }
}

fn parse_spanish_date(text: &str) -> Option<String> {
    let caps = RE_SPANISH_DATE.captures(text)?;
    let day: u32 = caps[1].parse().ok()?;
    let month = spanish_month(&caps[2])?;
    let year: i32 = caps[3].parse().ok()?;
    // Day-of-month is not range checked; "123 de julio" stays day 123.
    Some(format!("{year:04}-{month:02}-{day:02}"))
}

fn is_relative(text: &str) -> bool {
    let lower = text.to_lowercase();
    RELATIVE_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Turns the date strings found on search result pages into `YYYY-MM-DD`.
///
/// Relative phrases ("hace 3 horas", "ayer") resolve to the clock's current
/// date, including "ayer": results that recent are counted on the day they
/// were fetched. Anything unrecognised is returned trimmed but otherwise
/// untouched, so the aggregator can decide whether it is usable.
///
/// The clock is consulted on every relative match and no result is cached.
#[derive(Clone)]
pub struct DateNormalizer {
    today: Arc<dyn Fn() -> NaiveDate + Send + Sync>,
}

impl DateNormalizer {
    pub fn new() -> Self {
        Self::with_clock(|| Local::now().date_naive())
    }

    pub fn with_clock(clock: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        Self {
            today: Arc::new(clock),
        }
    }

    pub fn normalize(&self, raw: &str) -> String {
        let trimmed = raw.trim();

        if let Some(date) = parse_spanish_date(trimmed) {
            return date;
        }

        if is_relative(trimmed) {
            return (self.today)().format("%Y-%m-%d").to_string();
        }

        trimmed.to_string()
    }
}

impl Default for DateNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DateNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DateNormalizer").finish_non_exhaustive()
    }
}

/// Normalizes against the local system clock.
pub fn normalize_date(raw: &str) -> String {
    DateNormalizer::new().normalize(raw)
}
