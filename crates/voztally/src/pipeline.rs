use std::fmt::Display;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{FailurePolicy, SearchConfig};
use crate::dates::DateNormalizer;
use crate::dedupe::Deduplicator;
use crate::scraper::Fetcher;
use crate::types::NormalizedRecord;

/// How a single name variant's search ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VariantStatus {
    /// Every page in the budget returned results.
    Exhausted,
    /// A page came back empty before the budget ran out.
    EarlyStopped { empty_page: u32 },
    /// A page failed to download; later pages were not requested.
    Aborted { page: u32, error: String },
    /// Never searched because an earlier variant aborted the run.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantOutcome {
    pub variant: String,
    pub pages_fetched: u32,
    /// Records this variant added to the run, after deduplication.
    pub admitted: usize,
    pub status: VariantStatus,
}

impl Display for VariantOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "'{}': {} page(s), {} new article(s), ",
            self.variant, self.pages_fetched, self.admitted
        )?;
        match &self.status {
            VariantStatus::Exhausted => write!(f, "page budget exhausted"),
            VariantStatus::EarlyStopped { empty_page } => {
                write!(f, "no more results at page {}", empty_page)
            }
            VariantStatus::Aborted { page, error } => {
                write!(f, "aborted at page {}: {}", page, error)
            }
            VariantStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// Overall result of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every variant used its whole page budget.
    Exhausted,
    /// At least one variant ran out of results and none failed.
    EarlyStopped,
    /// At least one page failed to download.
    Aborted,
}

impl Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Exhausted => write!(f, "exhausted"),
            RunStatus::EarlyStopped => write!(f, "early-stopped"),
            RunStatus::Aborted => write!(f, "aborted"),
        }
    }
}

/// Everything a run has collected so far.
#[derive(Debug, Default)]
pub struct Harvest {
    records: Vec<NormalizedRecord>,
    seen: Deduplicator,
    outcomes: Vec<VariantOutcome>,
    pages_fetched: u32,
}

impl Harvest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `record` unless its url was already collected.
    pub fn admit(&mut self, record: NormalizedRecord) -> bool {
        if !self.seen.admit(&record.url) {
            return false;
        }
        self.records.push(record);
        true
    }

    pub fn records(&self) -> &[NormalizedRecord] {
        &self.records
    }

    pub fn outcomes(&self) -> &[VariantOutcome] {
        &self.outcomes
    }

    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    pub fn status(&self) -> RunStatus {
        let aborted = self
            .outcomes
            .iter()
            .any(|o| matches!(o.status, VariantStatus::Aborted { .. }));
        if aborted {
            return RunStatus::Aborted;
        }
        let stopped = self
            .outcomes
            .iter()
            .any(|o| matches!(o.status, VariantStatus::EarlyStopped { .. }));
        if stopped {
            RunStatus::EarlyStopped
        } else {
            RunStatus::Exhausted
        }
    }

    pub fn into_parts(self) -> (Vec<NormalizedRecord>, Vec<VariantOutcome>, RunStatus) {
        let status = self.status();
        (self.records, self.outcomes, status)
    }
}

/// Drives a [`Fetcher`] page by page over one or more search terms.
///
/// Pages and variants are fetched strictly in order with `page_delay`
/// between requests. Records without a title, url or date are dropped and
/// every url is admitted at most once per run, whichever variant found it.
#[derive(Debug)]
pub struct Pipeline<F> {
    fetcher: F,
    normalizer: DateNormalizer,
    max_pages: u32,
    page_size: u32,
    page_delay: Duration,
    on_fetch_error: FailurePolicy,
}

impl<F: Fetcher> Pipeline<F> {
    pub fn new(fetcher: F, config: &SearchConfig) -> Self {
        Self {
            fetcher,
            normalizer: DateNormalizer::new(),
            max_pages: config.max_pages_per_variant,
            page_size: config.page_size,
            page_delay: config.page_delay(),
            on_fetch_error: config.on_fetch_error,
        }
    }

    pub fn with_normalizer(mut self, normalizer: DateNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub async fn run(&self, variants: &[String]) -> Harvest {
        let mut harvest = Harvest::new();
        let mut variants = variants.iter();

        for variant in variants.by_ref() {
            let outcome = self.run_variant(variant, &mut harvest).await;
            let aborted = matches!(outcome.status, VariantStatus::Aborted { .. });
            harvest.outcomes.push(outcome);

            if aborted && self.on_fetch_error == FailurePolicy::AbortRun {
                log::warn!("Fetch failure with abort policy, stopping run");
                break;
            }
        }

        for variant in variants {
            harvest.outcomes.push(VariantOutcome {
                variant: variant.clone(),
                pages_fetched: 0,
                admitted: 0,
                status: VariantStatus::Skipped,
            });
        }

        log::info!(
            "Run {}: {} unique article(s) from {} page(s)",
            harvest.status(),
            harvest.records.len(),
            harvest.pages_fetched
        );
        harvest
    }

    async fn run_variant(&self, variant: &str, harvest: &mut Harvest) -> VariantOutcome {
        let mut outcome = VariantOutcome {
            variant: variant.to_string(),
            pages_fetched: 0,
            admitted: 0,
            status: VariantStatus::Exhausted,
        };

        for page in 1..=self.max_pages {
            if harvest.pages_fetched > 0 && !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }

            log::info!(
                "Fetching '{}' page {} of {}...",
                variant,
                page,
                self.max_pages
            );
            let result = self.fetcher.fetch_page(variant, page, self.page_size).await;
            harvest.pages_fetched += 1;

            let raw_records = match result {
                Ok(records) => records,
                Err(e) => {
                    log::warn!("Error fetching '{}' page {}: {}", variant, page, e);
                    outcome.status = VariantStatus::Aborted {
                        page,
                        error: e.to_string(),
                    };
                    break;
                }
            };
            outcome.pages_fetched += 1;

            if raw_records.is_empty() {
                log::info!("No more articles for '{}', stopping", variant);
                outcome.status = VariantStatus::EarlyStopped { empty_page: page };
                break;
            }

            let mut added = 0;
            for raw in raw_records {
                if !raw.is_complete() {
                    log::debug!("Dropping incomplete record: {:?}", raw);
                    continue;
                }
                let normalized_date = self.normalizer.normalize(&raw.raw_date);
                if harvest.admit(NormalizedRecord::from_raw(raw, normalized_date, variant)) {
                    added += 1;
                }
            }
            outcome.admitted += added;

            log::info!(
                "Added {} unique article(s). Total: {}",
                added,
                harvest.records.len()
            );
        }

        outcome
    }
}
