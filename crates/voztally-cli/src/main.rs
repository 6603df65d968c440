use std::io;
use std::path::PathBuf;
use std::process;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use voztally::config::{DEFAULT_MAX_PAGES, DEFAULT_PAGE_DELAY_MS, DEFAULT_PAGE_SIZE};
use voztally::dates::DateNormalizer;
use voztally::export::{export_to_dir, write_records_csv};
use voztally::fiscal::DEFAULT_CUTOFF_DAY;
use voztally::types::FiscalMonth;
use voztally::utils::RecordFilter;
use voztally::variants::name_variants;
use voztally::{FailurePolicy, SearchConfig, WebScraper, run_search};

#[derive(Parser)]
#[command(name = "voztally")]
#[command(about = "Count La Voz de Galicia articles mentioning a name, per fiscal month", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        global = true,
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Csv,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OnError {
    /// Give up on the failing name variant and continue with the next
    SkipVariant,
    /// Stop the whole search
    Abort,
}

impl From<OnError> for FailurePolicy {
    fn from(value: OnError) -> Self {
        match value {
            OnError::SkipVariant => FailurePolicy::SkipVariant,
            OnError::Abort => FailurePolicy::AbortRun,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Search articles for a name and summarize them per fiscal month
    Search {
        #[arg(help = "Name or text to search for")]
        term: String,

        #[arg(
            long,
            default_value_t = DEFAULT_MAX_PAGES,
            help = "Maximum result pages to fetch per search term",
            value_parser = clap::value_parser!(u32).range(1..)
        )]
        max_pages: u32,

        #[arg(
            long,
            default_value_t = DEFAULT_PAGE_SIZE,
            help = "Results requested per page",
            value_parser = clap::value_parser!(u32).range(1..)
        )]
        page_size: u32,

        #[arg(
            long,
            default_value_t = DEFAULT_CUTOFF_DAY,
            help = "Articles published after this day count towards the next month (31 for calendar months)",
            value_parser = clap::value_parser!(u32).range(1..=31)
        )]
        cutoff_day: u32,

        #[arg(long, help = "Also search abbreviated and surname-only forms of the name")]
        variants: bool,

        #[arg(
            long,
            value_enum,
            default_value = "skip-variant",
            help = "What to do when a page fails to download"
        )]
        on_error: OnError,

        #[arg(
            long,
            default_value_t = DEFAULT_PAGE_DELAY_MS,
            help = "Pause between page requests in milliseconds"
        )]
        delay_ms: u64,

        #[arg(long, help = "Only keep articles published in or after this year")]
        min_year: Option<i32>,

        #[arg(
            long,
            value_name = "YYYY-MM-DD",
            help = "Only keep articles published on or after this date",
            value_parser = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| e.to_string()),
        )]
        start_date: Option<NaiveDate>,

        #[arg(
            long,
            value_name = "YYYY-MM-DD",
            help = "Only keep articles published on or before this date",
            value_parser = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| e.to_string()),
        )]
        end_date: Option<NaiveDate>,

        #[arg(
            long = "month",
            value_name = "YYYY-MM",
            help = "Only keep articles in this fiscal month (repeatable)",
            value_parser = |s: &str| s.parse::<FiscalMonth>().map_err(|e| e.to_string()),
        )]
        months: Vec<FiscalMonth>,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,

        #[arg(
            long,
            value_name = "DIR",
            help = "Also write the article and summary CSV files into this directory"
        )]
        out_dir: Option<PathBuf>,
    },
    /// Show the search terms generated for a name
    Variants {
        #[arg(help = "Full name to expand")]
        name: String,
    },
    /// Normalize raw date strings the way search results are normalized
    Normalize {
        #[arg(required = true, help = "Raw date strings, e.g. \"18 de julio de 2025\"")]
        raw: Vec<String>,
    },
}

fn serialize_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("Error serializing to JSON: {}", e);
            process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    match cli.command {
        Commands::Search {
            term,
            max_pages,
            page_size,
            cutoff_day,
            variants,
            on_error,
            delay_ms,
            min_year,
            start_date,
            end_date,
            months,
            format,
            out_dir,
        } => {
            let config = SearchConfig {
                search_term: term,
                max_pages_per_variant: max_pages,
                page_size,
                fiscal_cutoff_day: cutoff_day,
                use_variant_expansion: variants,
                min_year_filter: min_year,
                on_fetch_error: on_error.into(),
                page_delay_ms: delay_ms,
            };
            let filter = RecordFilter {
                start_date,
                end_date,
                min_year: None,
                months,
            };

            let scraper = WebScraper::new().unwrap_or_else(|e| {
                log::error!("Error creating scraper: {}", e);
                process::exit(1);
            });

            let report = run_search(scraper, config, filter, DateNormalizer::new())
                .await
                .unwrap_or_else(|e| {
                    log::error!("Invalid args: {e}");
                    process::exit(1);
                });

            let calendar = report.calendar().unwrap_or_else(|e| {
                log::error!("Invalid cutoff day: {e}");
                process::exit(1);
            });

            match format {
                OutputFormat::Json => serialize_json(&report),
                OutputFormat::Text => print!("{}", report),
                OutputFormat::Csv => {
                    if let Err(e) =
                        write_records_csv(io::stdout().lock(), &report.records, report.columns(&calendar))
                    {
                        log::error!("Error writing CSV: {}", e);
                        process::exit(1);
                    }
                }
            }

            if let Some(dir) = out_dir {
                if report.records.is_empty() {
                    log::warn!("No articles to export, skipping CSV files");
                } else if let Err(e) = export_to_dir(
                    &dir,
                    &report.search_term,
                    &report.records,
                    &report.summary,
                    report.columns(&calendar),
                ) {
                    log::error!("Error exporting CSV files: {}", e);
                    process::exit(1);
                }
            }
        }

        Commands::Variants { name } => {
            for (i, variant) in name_variants(&name).iter().enumerate() {
                println!("{:>3}. {}", i + 1, variant);
            }
        }

        Commands::Normalize { raw } => {
            let normalizer = DateNormalizer::new();
            for value in raw {
                println!("{} => {}", value, normalizer.normalize(&value));
            }
        }
    }
}
