//! Search results parser for account.altvr.com
//!
//! Parses HTML from a world search page and extracts portal cards and
//! pagination controls.

use ::url::Url;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AltvrError, Result};
use crate::types::{PagerItem, PortalItem, SearchResult};
use crate::url::{extract_space_id, resolve_href};

const CARD_SELECTOR: &str = "div.asvr-section div.content-block";
const CARD_LINK_SELECTOR: &str = "a.block-link";
const CARD_IMAGE_SELECTOR: &str = "div.image-wrapper img";
const PAGER_SELECTOR: &str = "ul.pagination a";

/// Compiled selectors for one parse
struct Selectors {
    card: Selector,
    link: Selector,
    image: Selector,
    pager: Selector,
}

impl Selectors {
    fn new() -> Result<Self> {
        Ok(Self {
            card: compile(CARD_SELECTOR)?,
            link: compile(CARD_LINK_SELECTOR)?,
            image: compile(CARD_IMAGE_SELECTOR)?,
            pager: compile(PAGER_SELECTOR)?,
        })
    }
}

fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| AltvrError::ParseError(format!("Invalid selector: {:?}", e)))
}

/// Parses a search results page into portal items and pager controls
///
/// # Arguments
/// * `html` - Raw HTML string from the search results page
/// * `base_url` - URL of the page, used to resolve card and pager links
///
/// # Returns
/// `SearchResult` in document order. A card missing some markup still
/// yields an item, with the missing fields left empty.
///
/// # Errors
/// Returns `ParseError` only if a built-in selector fails to compile
pub fn parse_search_results(html: &str, base_url: &Url) -> Result<SearchResult> {
    let selectors = Selectors::new()?;
    let document = Html::parse_document(html);

    let items = document
        .select(&selectors.card)
        .map(|card| parse_portal_card(&card, &selectors, base_url))
        .collect();

    let pager = document
        .select(&selectors.pager)
        .map(|anchor| parse_pager_link(&anchor, base_url))
        .collect();

    Ok(SearchResult { items, pager })
}

/// Parses a single result card
fn parse_portal_card(card: &ElementRef, selectors: &Selectors, base_url: &Url) -> PortalItem {
    let link = card.select(&selectors.link).next();

    let name = link
        .and_then(|a| a.value().attr("aria-label"))
        .map(|label| label.trim().to_string())
        .unwrap_or_default();

    let space_id = link
        .and_then(|a| a.value().attr("href"))
        .map(|href| extract_space_id(base_url, href.trim()))
        .unwrap_or_default();

    let thumbnail_uri = card
        .select(&selectors.image)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(|src| src.trim().to_string())
        .unwrap_or_default();

    PortalItem {
        name,
        space_id,
        thumbnail_uri,
    }
}

/// Parses a single pagination anchor
///
/// An anchor without a usable href marks the current page. An href that
/// cannot be resolved is treated the same way.
fn parse_pager_link(anchor: &ElementRef, base_url: &Url) -> PagerItem {
    let text = anchor.text().collect::<String>().trim().to_string();

    let url = match anchor.value().attr("href").map(str::trim) {
        Some(href) if !href.is_empty() && href != "#" => resolve_href(base_url, href)
            .map(String::from)
            .unwrap_or_default(),
        _ => String::new(),
    };

    PagerItem { text, url }
}
