//! AltspaceVR Portal Crawler Core Library
//!
//! Provides an async API for searching AltspaceVR worlds ("portals") on
//! account.altvr.com, a site that only serves search results to signed-in
//! users.
//!
//! # Overview
//!
//! This crate provides:
//! - An HTTP client with fixed browser headers, an explicit session cookie
//!   jar, and redirects confined to the site's origin
//! - Sign-in negotiation (anti-forgery token, credential post)
//! - HTML parsers for search result cards and pagination controls
//! - A high-level crawler that signs in lazily and reuses the session
//!
//! # Example
//!
//! ```no_run
//! use altvr_portal_core::{AltvrCrawler, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Reads EMAIL and PASSWORD; fails fast when either is missing
//!     let crawler = AltvrCrawler::from_env()?;
//!
//!     let page = crawler.search("castle", None).await?;
//!     for portal in &page.items {
//!         println!("{} ({})", portal.name, portal.space_id);
//!     }
//!
//!     // Follow a pager control; the session from the first call is reused
//!     if let Some(link) = page.pager.iter().find(|p| !p.is_current()) {
//!         let next = crawler.search("", Some(link.url.as_str())).await?;
//!         println!("{} more", next.items.len());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Sessions
//!
//! The session cookie is cached for the life of the [`AltvrCrawler`]. When
//! a request made with it fails, the cache is cleared and the error is
//! returned; the next search signs in again. Nothing is retried inside a
//! single call.

pub mod auth;
mod client;
mod config;
mod crawler;
mod error;
pub mod parser;
mod session;
mod types;
pub mod url;

// Re-export client types
pub use client::{AltvrClient, FormResponse, RateLimiter};

// Re-export configuration
pub use config::{ClientConfig, Credentials, EMAIL_VAR, PASSWORD_VAR, USER_AGENT};

// Re-export error types
pub use error::{AltvrError, ErrorKind, Result, Stage};

// Re-export parser functions
pub use parser::{parse_csrf_token, parse_search_results};

// Re-export main crawler API
pub use crawler::{AltvrCrawler, AuthState, MIN_TERM_CHARS};

// Re-export data types
pub use session::Session;
pub use types::{PagerItem, PortalItem, SearchResult};

// Re-export URL helper functions for convenience
pub use crate::url::{
    build_login_url, build_search_url, extract_space_id, parse_base_url, resolve_href,
};
pub use ::url::Url;
