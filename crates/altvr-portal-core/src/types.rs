//! Core data types for the portal crawler
//!
//! Contains the value records handed to the presentation layer.
//! All of them serialize with camelCase field names for the JS frontend.

use serde::{Deserialize, Serialize};

/// One portal card from a search results page
///
/// Fields are never absent: markup the parser cannot find
/// degrades to an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalItem {
    /// Accessible label of the card link
    pub name: String,

    /// Last path segment of the card link (e.g., "1444446284042731658")
    pub space_id: String,

    /// Thumbnail image source
    pub thumbnail_uri: String,
}

/// One pagination control
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagerItem {
    /// Visible label (page number, "Next", ...)
    pub text: String,

    /// Absolute URL of the page; empty for the current page
    pub url: String,
}

impl PagerItem {
    /// True for the non-clickable marker of the page being shown
    pub fn is_current(&self) -> bool {
        self.url.is_empty()
    }
}

/// Items and pager of one results page, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub items: Vec<PortalItem>,
    pub pager: Vec<PagerItem>,
}

impl SearchResult {
    /// True when neither items nor pager controls were found
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.pager.is_empty()
    }

    /// Pager entry marking the page being shown, if the site marked one
    pub fn current_page(&self) -> Option<&PagerItem> {
        self.pager.iter().find(|p| p.is_current())
    }
}
