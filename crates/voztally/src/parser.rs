use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::types::RawRecord;

fn elem_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extracts one [`RawRecord`] per `<article>` on a search results page.
///
/// Every article is returned, even when its link or date is missing: the
/// number of articles is what tells the caller whether the page had results
/// at all. Missing pieces are left as empty strings. Relative links are
/// resolved against `base`.
pub fn parse_search_page(html: &str, base: &Url) -> Vec<RawRecord> {
    let document = Html::parse_document(html);
    let article_sel = Selector::parse("article").unwrap();
    let link_sel = Selector::parse("h1 a[href]").unwrap();
    let time_sel = Selector::parse("time.entry-date").unwrap();

    document
        .select(&article_sel)
        .map(|article| {
            let (title, url) = article
                .select(&link_sel)
                .next()
                .map(|link| {
                    let href = link.value().attr("href").unwrap_or_default().trim();
                    let url = match base.join(href) {
                        Ok(url) if !href.is_empty() => url.to_string(),
                        Ok(_) => String::new(),
                        Err(e) => {
                            log::warn!("Skipping unresolvable link '{}': {}", href, e);
                            String::new()
                        }
                    };
                    (normalize_whitespace(&elem_text(link)), url)
                })
                .unwrap_or_default();

            let raw_date = article
                .select(&time_sel)
                .next()
                .map(|time| match time.value().attr("datetime") {
                    Some(datetime) if !datetime.trim().is_empty() => datetime.trim().to_string(),
                    _ => normalize_whitespace(&elem_text(time)),
                })
                .unwrap_or_default();

            RawRecord {
                title,
                url,
                raw_date,
            }
        })
        .collect()
}
