use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::aggregate::{Summary, summarize};
use crate::config::{ConfigError, SearchConfig};
use crate::dates::DateNormalizer;
use crate::export::Columns;
use crate::fiscal::FiscalCalendar;
use crate::pipeline::{Pipeline, RunStatus, VariantOutcome};
use crate::scraper::Fetcher;
use crate::types::NormalizedRecord;
use crate::utils::{RecordFilter, RecordStats};

/// The result of one search: what was collected, what survived the
/// filters, and how each term's search ended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchReport {
    pub search_term: String,
    pub variants: Vec<String>,
    pub use_variant_expansion: bool,
    pub cutoff_day: u32,
    pub status: RunStatus,
    pub outcomes: Vec<VariantOutcome>,
    /// Unique articles collected before presentation filters.
    pub collected: usize,
    pub records: Vec<NormalizedRecord>,
    pub summary: Summary,
}

impl SearchReport {
    pub fn calendar(&self) -> Result<FiscalCalendar, ConfigError> {
        FiscalCalendar::new(self.cutoff_day)
    }

    pub fn stats(&self) -> RecordStats {
        RecordStats::from_records(&self.records)
    }

    pub fn mean(&self) -> Option<f64> {
        self.summary.mean()
    }

    /// Export columns for this report. `FOUND_VIA` appears whenever name
    /// variants were requested, even if the name had none to offer.
    pub fn columns<'a>(&self, calendar: &'a FiscalCalendar) -> Columns<'a> {
        Columns {
            month_group: Some(calendar),
            found_via: self.use_variant_expansion,
        }
    }
}

impl Display for SearchReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Search '{}' (cutoff day {}): {}",
            self.search_term, self.cutoff_day, self.status
        )?;
        for outcome in &self.outcomes {
            writeln!(f, "  {}", outcome)?;
        }
        writeln!(f)?;

        if self.collected == 0 {
            writeln!(f, "No articles were found for '{}'.", self.search_term)?;
            return Ok(());
        }
        if self.records.is_empty() {
            writeln!(
                f,
                "0 of {} collected article(s) shown after filtering",
                self.collected
            )?;
            return Ok(());
        }

        writeln!(f, "Articles:")?;
        for (i, record) in self.records.iter().enumerate() {
            writeln!(f, "{:>3}. {}", i + 1, record)?;
        }
        if self.records.len() != self.collected {
            writeln!(
                f,
                "\n{} of {} collected article(s) shown after filtering",
                self.records.len(),
                self.collected
            )?;
        }
        write!(f, "{}", self.stats())?;
        writeln!(f)?;
        write!(f, "{}", self.summary)
    }
}

/// Runs every search term from `config` through `fetcher` and summarizes
/// what passes `filter`.
///
/// `config.min_year_filter` is applied unless `filter` sets its own.
pub async fn run_search<F: Fetcher>(
    fetcher: F,
    config: SearchConfig,
    filter: RecordFilter,
    normalizer: DateNormalizer,
) -> Result<SearchReport, ConfigError> {
    let config = config.validate()?;
    let filter = RecordFilter {
        min_year: filter.min_year.or(config.min_year_filter),
        ..filter
    }
    .validate()?;
    let calendar = config.calendar()?;
    let variants = config.variants();

    log::info!(
        "Searching {} term(s), up to {} page(s) each",
        variants.len(),
        config.max_pages_per_variant
    );

    let harvest = Pipeline::new(fetcher, &config)
        .with_normalizer(normalizer)
        .run(&variants)
        .await;
    let (collected, outcomes, status) = harvest.into_parts();

    let records = filter.apply(&collected, &calendar);
    let summary = summarize(&records, &calendar);

    Ok(SearchReport {
        search_term: config.search_term.trim().to_string(),
        variants,
        use_variant_expansion: config.use_variant_expansion,
        cutoff_day: calendar.cutoff_day(),
        status,
        outcomes,
        collected: collected.len(),
        records,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::FetchError;
    use crate::types::RawRecord;
    use chrono::NaiveDate;

    struct OnePage(Vec<RawRecord>);

    impl Fetcher for OnePage {
        async fn fetch_page(
            &self,
            _search_term: &str,
            page: u32,
            _page_size: u32,
        ) -> Result<Vec<RawRecord>, FetchError> {
            Ok(if page == 1 { self.0.clone() } else { Vec::new() })
        }
    }

    fn normalizer() -> DateNormalizer {
        DateNormalizer::with_clock(|| NaiveDate::from_ymd_opt(2025, 10, 19).unwrap())
    }

    fn fetcher() -> OnePage {
        OnePage(vec![
            RawRecord::new("a", "https://x/a", "3 de enero de 2023"),
            RawRecord::new("b", "https://x/b", "20 de enero de 2025"),
            RawRecord::new("c", "https://x/c", "hoy"),
            RawRecord::new("d", "https://x/d", "fecha desconocida"),
        ])
    }

    fn config() -> SearchConfig {
        SearchConfig {
            page_delay_ms: 0,
            ..SearchConfig::new("CLAUDIA ZAPATER")
        }
    }

    #[tokio::test]
    async fn test_run_search_summarizes() {
        let report = run_search(fetcher(), config(), RecordFilter::default(), normalizer())
            .await
            .unwrap();

        assert_eq!(report.status, RunStatus::EarlyStopped);
        assert_eq!(report.collected, 4);
        assert_eq!(report.records.len(), 4);
        assert_eq!(report.summary.total(), 3);
        assert_eq!(report.summary.skipped, 1);
        let buckets: Vec<String> = report
            .summary
            .rows
            .iter()
            .map(|r| r.bucket.to_string())
            .collect();
        assert_eq!(buckets, vec!["2023-01", "2025-02", "2025-11"]);
        assert_eq!(report.mean(), Some(1.0));
    }

    #[tokio::test]
    async fn test_min_year_from_config() {
        let config = SearchConfig {
            min_year_filter: Some(2025),
            ..config()
        };
        let report = run_search(fetcher(), config, RecordFilter::default(), normalizer())
            .await
            .unwrap();

        assert_eq!(report.collected, 4);
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.summary.total(), 2);
        assert!(report.to_string().contains("2 of 4 collected article(s)"));
    }

    #[tokio::test]
    async fn test_filters_removing_everything_is_not_zero_results() {
        let filter = RecordFilter {
            min_year: Some(2030),
            ..Default::default()
        };
        let report = run_search(fetcher(), config(), filter, normalizer())
            .await
            .unwrap();

        let text = report.to_string();
        assert!(report.records.is_empty());
        assert!(text.contains("0 of 4 collected article(s)"));
        assert!(!text.contains("No articles were found"));
    }

    #[tokio::test]
    async fn test_found_via_column_with_single_token_expansion() {
        let config = SearchConfig {
            use_variant_expansion: true,
            ..SearchConfig {
                page_delay_ms: 0,
                ..SearchConfig::new("ZAPATER")
            }
        };
        let report = run_search(fetcher(), config, RecordFilter::default(), normalizer())
            .await
            .unwrap();
        let calendar = report.calendar().unwrap();

        assert_eq!(report.variants, vec!["ZAPATER"]);
        assert!(report.columns(&calendar).found_via);
    }

    #[tokio::test]
    async fn test_no_found_via_column_without_expansion() {
        let report = run_search(fetcher(), config(), RecordFilter::default(), normalizer())
            .await
            .unwrap();
        let calendar = report.calendar().unwrap();

        assert!(!report.columns(&calendar).found_via);
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let config = SearchConfig {
            fiscal_cutoff_day: 40,
            ..config()
        };
        let result = run_search(fetcher(), config, RecordFilter::default(), normalizer()).await;
        assert!(matches!(result, Err(ConfigError::CutoffDay(40))));
    }

    #[tokio::test]
    async fn test_empty_search_report() {
        let report = run_search(
            OnePage(Vec::new()),
            config(),
            RecordFilter::default(),
            normalizer(),
        )
        .await
        .unwrap();

        assert!(report.records.is_empty());
        assert_eq!(report.mean(), None);
        assert!(report.to_string().contains("No articles were found"));
    }

    #[tokio::test]
    async fn test_found_via_column_with_expansion() {
        let config = SearchConfig {
            use_variant_expansion: true,
            ..config()
        };
        let report = run_search(fetcher(), config, RecordFilter::default(), normalizer())
            .await
            .unwrap();
        let calendar = report.calendar().unwrap();

        assert_eq!(report.variants.len(), 3);
        assert!(report.columns(&calendar).found_via);
        assert_eq!(report.collected, 4, "same urls from every variant");
    }
}
