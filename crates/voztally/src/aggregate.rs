use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::fiscal::FiscalCalendar;
use crate::types::{FiscalMonth, NormalizedRecord, SummaryRow};

static RE_ISO_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2})(?:\D|$)").expect("invalid regex: iso date")
});

const CHART_WIDTH: usize = 40;

/// Reads the calendar date at the start of a normalized date string.
///
/// Anything not starting with `YYYY-MM-DD` yields `None`, as does a prefix
/// naming a day the month does not have or running into more digits
/// (`2025-07-123`). Trailing text such as a time of day is ignored.
pub fn calendar_date(normalized: &str) -> Option<NaiveDate> {
    let caps = RE_ISO_DATE.captures(normalized)?;
    NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub rows: Vec<SummaryRow>,
    /// Records left out because their date could not be read.
    pub skipped: usize,
}

impl Summary {
    pub fn total(&self) -> usize {
        self.rows.iter().map(|r| r.count).sum()
    }

    /// Mean articles per bucket. `None` when there are no buckets.
    pub fn mean(&self) -> Option<f64> {
        if self.rows.is_empty() {
            return None;
        }
        Some(self.total() as f64 / self.rows.len() as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn count_for(&self, bucket: FiscalMonth) -> usize {
        self.rows
            .iter()
            .find(|r| r.bucket == bucket)
            .map_or(0, |r| r.count)
    }
}

pub fn summarize(records: &[NormalizedRecord], calendar: &FiscalCalendar) -> Summary {
    let mut counts: BTreeMap<FiscalMonth, usize> = BTreeMap::new();
    let mut skipped = 0;

    for record in records {
        match calendar_date(&record.normalized_date) {
            Some(date) => *counts.entry(calendar.bucket_for(date)).or_default() += 1,
            None => {
                log::debug!(
                    "Skipping '{}' with unusable date '{}'",
                    record.url,
                    record.normalized_date
                );
                skipped += 1;
            }
        }
    }

    Summary {
        rows: counts
            .into_iter()
            .map(|(bucket, count)| SummaryRow { bucket, count })
            .collect(),
        skipped,
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.rows.is_empty() {
            return writeln!(f, "No dated articles to summarize.");
        }

        let max = self.rows.iter().map(|r| r.count).max().unwrap_or(1).max(1);
        writeln!(f, "Month     Count")?;
        for row in &self.rows {
            let width = (row.count * CHART_WIDTH).div_ceil(max);
            writeln!(f, "{}  {}", row, "█".repeat(width))?;
        }
        writeln!(f)?;
        writeln!(f, "  Total articles:   {}", self.total())?;
        if let Some(mean) = self.mean() {
            writeln!(f, "  Mean per month:   {:.2}", mean)?;
        }
        if self.skipped > 0 {
            writeln!(f, "  Undated (skipped): {}", self.skipped)?;
        }
        Ok(())
    }
}
