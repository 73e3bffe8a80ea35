//! HTML parsers for account.altvr.com
//!
//! Contains modules for parsing different page types.

pub mod login;
pub mod search;

pub use login::parse_csrf_token;
pub use search::parse_search_results;
