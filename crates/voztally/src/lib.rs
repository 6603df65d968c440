pub mod aggregate;
pub mod config;
pub mod dates;
pub mod dedupe;
pub mod export;
pub mod fiscal;
mod parser;
pub mod pipeline;
pub mod report;
pub mod scraper;
pub mod types;
pub mod utils;
pub mod variants;

pub use config::{FailurePolicy, SearchConfig};
pub use report::{SearchReport, run_search};
pub use scraper::{FetchError, Fetcher, WebScraper};

pub(crate) const BASE_URL: &str = "https://www.lavozdegalicia.es";
pub(crate) const SEARCH_URL: &str = "https://www.lavozdegalicia.es/buscador/q/";
