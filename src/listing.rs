use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use thiserror::Error;
use url::Url;

use crate::fetch::{Clock, FetchFailure, Fetcher, Transport};
use crate::league::{FBREF_ROOT, SeasonRequest};

static MATCH_REPORT_CELL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#".left[data-stat="match_report"]"#).expect("static selector"));
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("static selector"));
static ROOT: Lazy<Url> = Lazy::new(|| Url::parse(FBREF_ROOT).expect("static url"));

// fbref styles postponed / not-yet-played fixtures with this class.
const UNPLAYED_CLASS: &str = "iz";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ListingError {
    #[error(transparent)]
    Fetch(#[from] FetchFailure),
    #[error("no match report links found")]
    NotFound,
}

/// Absolute match report links in document order.
pub fn extract_links(html: &str) -> Result<Vec<String>, ListingError> {
    let document = Html::parse_document(html);

    let mut links = Vec::new();
    for cell in document.select(&MATCH_REPORT_CELL) {
        if cell.value().classes().any(|c| c == UNPLAYED_CLASS) {
            continue;
        }
        let Some(href) = cell
            .select(&LINK)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::trim)
            .filter(|h| !h.is_empty())
        else {
            continue;
        };
        if let Ok(abs) = ROOT.join(href) {
            links.push(abs.to_string());
        }
    }

    if links.is_empty() {
        return Err(ListingError::NotFound);
    }
    Ok(links)
}

pub fn fetch_season_links<T: Transport, C: Clock>(
    fetcher: &mut Fetcher<T, C>,
    request: &SeasonRequest,
) -> Result<Vec<String>, ListingError> {
    let page = fetcher.fetch(&request.listing_url())?;
    extract_links(&page.body)
}
