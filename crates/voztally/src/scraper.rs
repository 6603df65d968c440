use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, REFERER};
use url::Url;
use url::form_urlencoded;

use crate::parser::parse_search_page;
use crate::types::RawRecord;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const SORT_NEWEST_FIRST: &str = "D0003_FECHAPUBLICACION desc";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Search returned HTTP {status} for page {page}")]
    Status { status: u16, page: u32 },
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// A source of search result pages.
///
/// An empty page means the search has no more results.
pub trait Fetcher {
    fn fetch_page(
        &self,
        search_term: &str,
        page: u32,
        page_size: u32,
    ) -> impl Future<Output = Result<Vec<RawRecord>, FetchError>> + Send;
}

impl<T: Fetcher + Sync> Fetcher for &T {
    fn fetch_page(
        &self,
        search_term: &str,
        page: u32,
        page_size: u32,
    ) -> impl Future<Output = Result<Vec<RawRecord>, FetchError>> + Send {
        (**self).fetch_page(search_term, page, page_size)
    }
}

#[derive(Debug, Clone)]
pub struct WebScraper {
    client: Client,
    base_url: Url,
    search_url: Url,
}

impl WebScraper {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(BROWSER_USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: Url::parse(crate::BASE_URL)?,
            search_url: Url::parse(crate::SEARCH_URL)?,
        })
    }

    fn search_form(search_term: &str, page: u32, page_size: u32) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair("text", search_term)
            .append_pair("pageSize", &page_size.to_string())
            .append_pair("pageNumber", &page.to_string())
            .append_pair("sort", SORT_NEWEST_FIRST)
            .append_pair("doctype", "")
            .append_pair("dateFrom", "")
            .append_pair("dateTo", "")
            .append_pair("edicion", "")
            .append_pair("formato", "")
            .append_pair("seccion", "")
            .append_pair("blog", "")
            .append_pair("autor", "")
            .append_pair("source", "info")
            .finish()
    }

    async fn post_search(
        &self,
        search_term: &str,
        page: u32,
        page_size: u32,
    ) -> Result<String, FetchError> {
        let response = self
            .client
            .post(self.search_url.clone())
            .header(REFERER, self.search_url.as_str())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Self::search_form(search_term, page, page_size))
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                page,
            });
        }

        Ok(response
            .text()
            .await
            .inspect_err(|e| log::error!("Decode error: {e:?}"))?)
    }
}

impl Fetcher for WebScraper {
    async fn fetch_page(
        &self,
        search_term: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<RawRecord>, FetchError> {
        log::debug!("POST {} text='{}' page={}", self.search_url, search_term, page);
        let html = self.post_search(search_term, page, page_size).await?;
        Ok(parse_search_page(&html, &self.base_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_form_fields() {
        let body = WebScraper::search_form("CLAUDIA ZAPATER", 3, 10);
        let pairs: Vec<(String, String)> = form_urlencoded::parse(body.as_bytes())
            .into_owned()
            .collect();

        let get = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("text"), Some("CLAUDIA ZAPATER"));
        assert_eq!(get("pageNumber"), Some("3"));
        assert_eq!(get("pageSize"), Some("10"));
        assert_eq!(get("sort"), Some(SORT_NEWEST_FIRST));
        assert_eq!(get("source"), Some("info"));
        assert_eq!(get("autor"), Some(""));
    }

    #[test]
    fn test_scraper_builds() {
        let scraper = WebScraper::new().unwrap();
        assert_eq!(scraper.search_url.as_str(), crate::SEARCH_URL);
    }
}
