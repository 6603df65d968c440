use std::{fmt::Display, str::FromStr};

use chrono::{Datelike, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One search hit as it comes off a results page. Empty fields mean the
/// page did not carry them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub title: String,
    pub url: String,
    pub raw_date: String,
}

impl RawRecord {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        raw_date: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            raw_date: raw_date.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty()
            && !self.url.trim().is_empty()
            && !self.raw_date.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub title: String,
    pub url: String,
    pub raw_date: String,
    /// Either `YYYY-MM-DD` or the trimmed raw date when it could not be read.
    pub normalized_date: String,
    /// Name variant whose search first surfaced this article.
    pub found_via: String,
}

impl NormalizedRecord {
    pub fn from_raw(raw: RawRecord, normalized_date: String, found_via: &str) -> Self {
        Self {
            title: raw.title,
            url: raw.url,
            raw_date: raw.raw_date,
            normalized_date,
            found_via: found_via.to_string(),
        }
    }
}

impl Display for NormalizedRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.normalized_date, self.title)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid month '{0}'. Expected YYYY-MM")]
pub struct FiscalMonthParseError(String);

/// A `YYYY-MM` bucket key. Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FiscalMonth {
    year: i32,
    month: u32,
}

impl FiscalMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

impl Display for FiscalMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for FiscalMonth {
    type Err = FiscalMonthParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| FiscalMonthParseError(s.to_string()))?;
        if year.len() != 4 || month.len() != 2 {
            return Err(FiscalMonthParseError(s.to_string()));
        }
        let year = year
            .parse::<i32>()
            .map_err(|_| FiscalMonthParseError(s.to_string()))?;
        let month = month
            .parse::<u32>()
            .map_err(|_| FiscalMonthParseError(s.to_string()))?;
        FiscalMonth::new(year, month).ok_or_else(|| FiscalMonthParseError(s.to_string()))
    }
}

impl Serialize for FiscalMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FiscalMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl JsonSchema for FiscalMonth {
    fn schema_name() -> std::borrow::Cow<'static, str> {
        "FiscalMonth".into()
    }

    fn json_schema(_generator: &mut schemars::SchemaGenerator) -> schemars::Schema {
        schemars::json_schema!({
            "type": "string",
            "pattern": "^\\d{4}-\\d{2}$"
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub bucket: FiscalMonth,
    pub count: usize,
}

impl Display for SummaryRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:>5}", self.bucket, self.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fiscal_month_display_pads() {
        let month = FiscalMonth::new(2025, 3).unwrap();
        assert_eq!(month.to_string(), "2025-03");
    }

    #[test]
    fn test_fiscal_month_next_rolls_year() {
        let december = FiscalMonth::new(2025, 12).unwrap();
        assert_eq!(december.next(), FiscalMonth::new(2026, 1).unwrap());
    }

    #[test]
    fn test_fiscal_month_parse() {
        assert_eq!(
            "2025-11".parse::<FiscalMonth>().unwrap(),
            FiscalMonth::new(2025, 11).unwrap()
        );
        assert!("2025-13".parse::<FiscalMonth>().is_err());
        assert!("2025-1".parse::<FiscalMonth>().is_err());
        assert!("november".parse::<FiscalMonth>().is_err());
    }

    #[test]
    fn test_fiscal_month_ordering_is_chronological() {
        let mut months: Vec<FiscalMonth> = ["2026-01", "2025-12", "2025-02"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        months.sort();
        let keys: Vec<String> = months.iter().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["2025-02", "2025-12", "2026-01"]);
    }

    #[test]
    fn test_fiscal_month_serializes_as_string() {
        let row = SummaryRow {
            bucket: FiscalMonth::new(2025, 7).unwrap(),
            count: 4,
        };
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"bucket":"2025-07","count":4}"#);
    }

    #[test]
    fn test_raw_record_completeness() {
        assert!(RawRecord::new("t", "https://x/1", "hoy").is_complete());
        assert!(!RawRecord::new("", "https://x/1", "hoy").is_complete());
        assert!(!RawRecord::new("t", "", "hoy").is_complete());
        assert!(!RawRecord::new("t", "https://x/1", "  ").is_complete());
    }
}
