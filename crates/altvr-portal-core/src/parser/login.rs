//! Sign-in page parser
//!
//! Extracts the anti-forgery token the sign-in form must echo back.

use scraper::{Html, Selector};

use crate::error::{AltvrError, Result};

const CSRF_SELECTOR: &str = "meta[name=\"csrf-token\"]";

/// Parses the sign-in page and returns the anti-forgery token
///
/// # Arguments
/// * `html` - Raw HTML string from the sign-in page
///
/// # Errors
/// Returns `ElementNotFound` if the page has no `<meta name="csrf-token">`
/// with a non-empty `content` attribute
pub fn parse_csrf_token(html: &str) -> Result<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(CSRF_SELECTOR)
        .map_err(|e| AltvrError::ParseError(format!("Invalid selector: {:?}", e)))?;

    document
        .select(&selector)
        .filter_map(|meta| meta.value().attr("content"))
        .map(str::trim)
        .find(|token| !token.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AltvrError::ElementNotFound(CSRF_SELECTOR.to_string()))
}
