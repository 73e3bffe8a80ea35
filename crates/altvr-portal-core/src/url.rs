//! URL helper functions for account.altvr.com
//!
//! Provides functions for building sign-in and search URLs and for
//! turning hrefs found in result pages into absolute URLs or space IDs.
//! Resolution and origin checks go through [`Url`], so host case,
//! default ports and dot segments are handled the way a browser would.

use ::url::Url;

use crate::error::{AltvrError, Result};

/// Origin of the live site
pub const DEFAULT_BASE_URL: &str = "https://account.altvr.com";

/// Path of the sign-in page and of the credential form endpoint
pub const LOGIN_PATH: &str = "/users/sign_in";

/// Path of the world search page
pub const SEARCH_PATH: &str = "/worlds/search";

/// Strips trailing slashes from a configured base URL
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Parses the configured site origin
///
/// # Errors
/// Returns `Config` unless `base_url` is an absolute `http(s)` URL
pub fn parse_base_url(base_url: &str) -> Result<Url> {
    let url = Url::parse(base_url)
        .map_err(|e| AltvrError::Config(format!("base URL {:?}: {}", base_url, e)))?;

    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        _ => Err(AltvrError::Config(format!(
            "base URL {:?} is not an http(s) origin",
            base_url
        ))),
    }
}

/// Builds the sign-in URL
///
/// # Example
/// ```
/// use altvr_portal_core::url::{build_login_url, parse_base_url};
/// let base = parse_base_url("https://account.altvr.com").unwrap();
/// let url = build_login_url(&base).unwrap();
/// assert_eq!(url.as_str(), "https://account.altvr.com/users/sign_in");
/// ```
pub fn build_login_url(base_url: &Url) -> Result<Url> {
    join(base_url, LOGIN_PATH)
}

/// Builds the search URL for a given term
///
/// URL encodes the term into the `q` query parameter.
///
/// # Example
/// ```
/// use altvr_portal_core::url::{build_search_url, parse_base_url};
/// let base = parse_base_url("https://account.altvr.com").unwrap();
/// let url = build_search_url(&base, "red castle").unwrap();
/// assert_eq!(url.as_str(), "https://account.altvr.com/worlds/search?q=red%20castle");
/// ```
pub fn build_search_url(base_url: &Url, term: &str) -> Result<Url> {
    let encoded = urlencoding::encode(term);
    join(base_url, &format!("{}?q={}", SEARCH_PATH, encoded))
}

/// Resolves an href found on a page at `page_url` into an absolute URL
///
/// Absolute hrefs are kept, relative ones are resolved the way a browser
/// resolves them.
///
/// # Example
/// ```
/// use altvr_portal_core::url::{parse_base_url, resolve_href};
/// let base = parse_base_url("https://account.altvr.com").unwrap();
/// let url = resolve_href(&base, "/worlds/search?page=2&q=castle").unwrap();
/// assert_eq!(url.as_str(), "https://account.altvr.com/worlds/search?page=2&q=castle");
/// ```
pub fn resolve_href(page_url: &Url, href: &str) -> Result<Url> {
    join(page_url, href)
}

fn join(base: &Url, href: &str) -> Result<Url> {
    base.join(href)
        .map_err(|e| AltvrError::InvalidUrl(format!("{}: {}", href, e)))
}

/// True when `url` has the same origin (scheme, host, port) as `base_url`
pub fn is_same_site(base_url: &Url, url: &Url) -> bool {
    base_url.origin() == url.origin()
}

/// True when `url` is the sign-in page
pub fn is_login_url(url: &Url) -> bool {
    url.path().trim_end_matches('/').ends_with(LOGIN_PATH)
}

/// Extracts the space ID from a card link found on `page_url`
///
/// Takes the last non-empty path segment, ignoring query and fragment.
/// Returns an empty string when there is no segment or the href does not
/// resolve.
///
/// # Example
/// ```
/// use altvr_portal_core::url::{extract_space_id, parse_base_url};
/// let base = parse_base_url("https://account.altvr.com").unwrap();
/// assert_eq!(extract_space_id(&base, "/spaces/1444446284042731658"), "1444446284042731658");
/// ```
pub fn extract_space_id(page_url: &Url, href: &str) -> String {
    let Ok(url) = page_url.join(href) else {
        return String::new();
    };

    url.path_segments()
        .and_then(|mut segments| segments.rfind(|segment| !segment.is_empty()))
        .map(str::to_string)
        .unwrap_or_default()
}
