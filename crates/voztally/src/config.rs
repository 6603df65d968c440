use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::fiscal::{DEFAULT_CUTOFF_DAY, FiscalCalendar};
use crate::variants::name_variants;

pub const DEFAULT_MAX_PAGES: u32 = 15;
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_PAGE_DELAY_MS: u64 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Search term cannot be empty")]
    EmptySearchTerm,
    #[error("Fiscal cutoff day must be between 1 and 31, got {0}")]
    CutoffDay(u32),
    #[error("{0} must be greater than 0")]
    Zero(&'static str),
    #[error("Start date ({start}) cannot be after end date ({end})")]
    DateRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },
}

/// What to do with the rest of the run after a page fails to download.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Give up on the failing variant and move on to the next one.
    #[default]
    SkipVariant,
    /// Stop the whole run.
    AbortRun,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SearchConfig {
    pub search_term: String,
    pub max_pages_per_variant: u32,
    pub page_size: u32,
    pub fiscal_cutoff_day: u32,
    pub use_variant_expansion: bool,
    pub min_year_filter: Option<i32>,
    pub on_fetch_error: FailurePolicy,
    /// Pause between two page downloads, in milliseconds.
    pub page_delay_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            max_pages_per_variant: DEFAULT_MAX_PAGES,
            page_size: DEFAULT_PAGE_SIZE,
            fiscal_cutoff_day: DEFAULT_CUTOFF_DAY,
            use_variant_expansion: false,
            min_year_filter: None,
            on_fetch_error: FailurePolicy::default(),
            page_delay_ms: DEFAULT_PAGE_DELAY_MS,
        }
    }
}

impl SearchConfig {
    pub fn new(search_term: impl Into<String>) -> Self {
        Self {
            search_term: search_term.into(),
            ..Default::default()
        }
    }

    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.search_term.trim().is_empty() {
            return Err(ConfigError::EmptySearchTerm);
        }
        if self.max_pages_per_variant == 0 {
            return Err(ConfigError::Zero("Max pages"));
        }
        if self.page_size == 0 {
            return Err(ConfigError::Zero("Page size"));
        }
        FiscalCalendar::new(self.fiscal_cutoff_day)?;
        Ok(self)
    }

    pub fn calendar(&self) -> Result<FiscalCalendar, ConfigError> {
        FiscalCalendar::new(self.fiscal_cutoff_day)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    /// Search terms to run, in order.
    pub fn variants(&self) -> Vec<String> {
        let term = self.search_term.trim();
        if self.use_variant_expansion {
            name_variants(term)
        } else {
            vec![term.to_string()]
        }
    }
}
