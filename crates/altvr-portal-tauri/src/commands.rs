//! Tauri commands for the portal crawler
//!
//! Errors cross the boundary as their display string so the frontend can
//! show "no results" together with the reason.

use altvr_portal_core::SearchResult;
use tauri::State;
use tracing::warn;

use crate::CrawlerState;

/// Search AltspaceVR portals by term
///
/// # Arguments
/// * `state` - Managed CrawlerState from Tauri
/// * `term` - Search term; fewer than two characters yields an empty result
///
/// # Errors
/// Returns error message as String if sign-in or the search fails
#[tauri::command]
pub async fn search_portals(
    state: State<'_, CrawlerState>,
    term: String,
) -> Result<SearchResult, String> {
    let crawler = state.crawler.lock().await;
    crawler.search(&term, None).await.map_err(|e| {
        warn!(kind = ?e.kind(), "portal search failed: {}", e);
        e.to_string()
    })
}

/// Load another page of a previous search
///
/// # Arguments
/// * `state` - Managed CrawlerState from Tauri
/// * `url` - Absolute URL from a non-current `PagerItem`
///
/// # Errors
/// Returns error message as String if the URL is foreign or the fetch fails
#[tauri::command]
pub async fn goto_page(
    state: State<'_, CrawlerState>,
    url: String,
) -> Result<SearchResult, String> {
    let crawler = state.crawler.lock().await;
    crawler.search("", Some(url.as_str())).await.map_err(|e| {
        warn!(kind = ?e.kind(), "pager request failed: {}", e);
        e.to_string()
    })
}
