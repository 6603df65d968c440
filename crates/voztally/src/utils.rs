use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::aggregate::calendar_date;
use crate::config::ConfigError;
use crate::fiscal::FiscalCalendar;
use crate::types::{FiscalMonth, NormalizedRecord};

/// Presentation filters. They narrow what is shown and exported; the
/// records collected by a run are never altered.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RecordFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub min_year: Option<i32>,
    /// Keep only these fiscal months.
    pub months: Vec<FiscalMonth>,
}

impl RecordFilter {
    pub fn is_empty(&self) -> bool {
        self.start_date.is_none()
            && self.end_date.is_none()
            && self.min_year.is_none()
            && self.months.is_empty()
    }

    /// Records without a readable date are dropped as soon as any filter
    /// is set.
    pub fn apply(
        &self,
        records: &[NormalizedRecord],
        calendar: &FiscalCalendar,
    ) -> Vec<NormalizedRecord> {
        if self.is_empty() {
            return records.to_vec();
        }

        records
            .iter()
            .filter(|r| {
                let Some(date) = calendar_date(&r.normalized_date) else {
                    return false;
                };
                self.start_date.is_none_or(|start| date >= start)
                    && self.end_date.is_none_or(|end| date <= end)
                    && self.min_year.is_none_or(|year| date.year() >= year)
                    && (self.months.is_empty()
                        || self.months.contains(&calendar.bucket_for(date)))
            })
            .cloned()
            .collect()
    }

    pub fn validate(self) -> Result<Self, ConfigError> {
        if let Some(start) = self.start_date
            && let Some(end) = self.end_date
            && start > end
        {
            return Err(ConfigError::DateRange { start, end });
        }
        Ok(self)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordStats {
    pub dated: usize,
    pub undated: usize,
    pub by_variant: BTreeMap<String, usize>,
    pub total: usize,
}

impl RecordStats {
    pub fn from_records(records: &[NormalizedRecord]) -> RecordStats {
        let dated = records
            .iter()
            .filter(|r| calendar_date(&r.normalized_date).is_some())
            .count();
        let mut by_variant = BTreeMap::new();
        for record in records {
            *by_variant.entry(record.found_via.clone()).or_default() += 1;
        }

        RecordStats {
            dated,
            undated: records.len() - dated,
            by_variant,
            total: records.len(),
        }
    }
}

impl std::fmt::Display for RecordStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\nStatistics:")?;
        writeln!(f, "  Dated articles:    {}", self.dated)?;
        writeln!(f, "  Undated articles:  {}", self.undated)?;
        if self.by_variant.len() > 1 {
            for (variant, count) in &self.by_variant {
                writeln!(f, "  Found via '{}': {}", variant, count)?;
            }
        }
        writeln!(f, "  Total:             {}", self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawRecord;

    fn record(id: u32, date: &str, via: &str) -> NormalizedRecord {
        NormalizedRecord::from_raw(
            RawRecord::new(format!("t{id}"), format!("https://x/{id}"), date),
            date.to_string(),
            via,
        )
    }

    fn records() -> Vec<NormalizedRecord> {
        vec![
            record(1, "2023-12-31", "A"),
            record(2, "2024-06-10", "A"),
            record(3, "2024-06-20", "B"),
            record(4, "2025-01-05", "B"),
            record(5, "sin fecha", "A"),
        ]
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let kept = RecordFilter::default().apply(&records(), &FiscalCalendar::default());
        assert_eq!(kept.len(), 5);
    }

    #[test]
    fn test_min_year() {
        let filter = RecordFilter {
            min_year: Some(2024),
            ..Default::default()
        };
        let kept = filter.apply(&records(), &FiscalCalendar::default());
        let urls: Vec<&str> = kept.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["https://x/2", "https://x/3", "https://x/4"]);
    }

    #[test]
    fn test_date_range() {
        let filter = RecordFilter {
            start_date: Some(date("2024-06-10")),
            end_date: Some(date("2024-06-20")),
            ..Default::default()
        };
        let kept = filter.apply(&records(), &FiscalCalendar::default());
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_month_selection_uses_fiscal_buckets() {
        let filter = RecordFilter {
            months: vec!["2024-07".parse().unwrap()],
            ..Default::default()
        };
        let kept = filter.apply(&records(), &FiscalCalendar::default());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].url, "https://x/3");
    }

    #[test]
    fn test_filter_does_not_touch_input() {
        let all = records();
        let filter = RecordFilter {
            min_year: Some(2030),
            ..Default::default()
        };
        assert!(filter.apply(&all, &FiscalCalendar::default()).is_empty());
        assert_eq!(all.len(), 5);
    }

    #[test]
    fn test_validate_date_order() {
        let filter = RecordFilter {
            start_date: Some(date("2025-02-01")),
            end_date: Some(date("2025-01-01")),
            ..Default::default()
        };
        assert!(matches!(
            filter.validate(),
            Err(ConfigError::DateRange { .. })
        ));
    }

    #[test]
    fn test_stats() {
        let stats = RecordStats::from_records(&records());
        assert_eq!(stats.total, 5);
        assert_eq!(stats.dated, 4);
        assert_eq!(stats.undated, 1);
        assert_eq!(stats.by_variant.get("A"), Some(&3));
        assert_eq!(stats.by_variant.get("B"), Some(&2));
    }
}
