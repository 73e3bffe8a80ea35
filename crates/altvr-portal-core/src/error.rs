//! Error types for the AltspaceVR portal crawler
//!
//! Provides a comprehensive error enum with human-readable messages,
//! a coarse [`ErrorKind`] classification for callers deciding whether to
//! retry, and Tauri-compatible serialization.

use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Step of a search that produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Fetching the sign-in page for the anti-forgery token
    FetchToken,
    /// Posting credentials to the sign-in endpoint
    Login,
    /// Fetching a freshly constructed search page
    Search,
    /// Fetching an absolute pager URL
    Pagination,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::FetchToken => "token fetch",
            Stage::Login => "login",
            Stage::Search => "search",
            Stage::Pagination => "pagination",
        };
        f.write_str(name)
    }
}

/// Coarse classification of an [`AltvrError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid configuration; fatal
    Config,
    /// Transport failure or unexpected HTTP status
    Io,
    /// Login rejected or session no longer accepted
    Auth,
    /// Required markup missing from a page
    Parse,
    /// Caller supplied an argument the crawler refuses to act on
    InvalidInput,
}

/// Error type for all crawler operations
///
/// Implements Display for human-readable messages and Serialize
/// for Tauri command compatibility.
#[derive(Error, Debug)]
pub enum AltvrError {
    /// Required configuration is missing or blank
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Rate limited by server (HTTP 429)
    #[error("Rate limited - too many requests")]
    RateLimited,

    /// Page not found on server
    #[error("Page not found: {0}")]
    NotFound(String),

    /// Server answered with a status the crawler does not handle
    #[error("Unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// Server redirected to a different origin; the hop is not followed
    #[error("Refused redirect to another site: {0}")]
    ForeignRedirect(String),

    /// Login did not yield a session
    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// Server refused a request made with the cached session
    #[error("Session rejected: {0}")]
    SessionRejected(String),

    /// Failed to parse HTML content
    #[error("Failed to parse HTML: {0}")]
    ParseError(String),

    /// Expected HTML element was not found
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// Invalid URL format or URL outside the configured site
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Any of the above, tagged with the stage that failed
    #[error("{stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<AltvrError>,
    },
}

impl AltvrError {
    /// Tag this error with the stage it occurred in
    ///
    /// An error that already carries a stage is returned unchanged.
    pub fn in_stage(self, stage: Stage) -> Self {
        match self {
            AltvrError::Stage { .. } => self,
            other => AltvrError::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// Stage the error was tagged with, if any
    pub fn stage(&self) -> Option<Stage> {
        match self {
            AltvrError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Classify the error for retry decisions
    pub fn kind(&self) -> ErrorKind {
        match self {
            AltvrError::Config(_) => ErrorKind::Config,
            AltvrError::HttpError(_)
            | AltvrError::RateLimited
            | AltvrError::NotFound(_)
            | AltvrError::UnexpectedStatus { .. }
            | AltvrError::ForeignRedirect(_) => ErrorKind::Io,
            AltvrError::AuthError(_) | AltvrError::SessionRejected(_) => ErrorKind::Auth,
            AltvrError::ParseError(_) | AltvrError::ElementNotFound(_) => ErrorKind::Parse,
            AltvrError::InvalidUrl(_) => ErrorKind::InvalidInput,
            AltvrError::Stage { source, .. } => source.kind(),
        }
    }

    /// True when the server refused the session cookie
    pub fn is_session_rejected(&self) -> bool {
        match self {
            AltvrError::SessionRejected(_) => true,
            AltvrError::Stage { source, .. } => source.is_session_rejected(),
            _ => false,
        }
    }
}

impl Serialize for AltvrError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Result type alias for crawler operations
pub type Result<T> = std::result::Result<T, AltvrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_config() {
        let error = AltvrError::Config("EMAIL is not set".to_string());
        assert_eq!(error.to_string(), "Configuration error: EMAIL is not set");
    }

    #[test]
    fn test_error_display_element_not_found() {
        let error = AltvrError::ElementNotFound("meta[name=csrf-token]".to_string());
        assert_eq!(error.to_string(), "Element not found: meta[name=csrf-token]");
    }

    #[test]
    fn test_error_display_unexpected_status() {
        let error = AltvrError::UnexpectedStatus {
            status: 502,
            url: "https://account.altvr.com/worlds/search".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Unexpected HTTP status 502 from https://account.altvr.com/worlds/search"
        );
    }

    #[test]
    fn test_error_display_with_stage() {
        let error = AltvrError::AuthError("no session cookie".to_string()).in_stage(Stage::Login);
        assert_eq!(
            error.to_string(),
            "login failed: Authentication failed: no session cookie"
        );
        assert_eq!(error.stage(), Some(Stage::Login));
    }

    #[test]
    fn test_in_stage_keeps_first_stage() {
        let error = AltvrError::RateLimited
            .in_stage(Stage::FetchToken)
            .in_stage(Stage::Search);
        assert_eq!(error.stage(), Some(Stage::FetchToken));
    }

    #[test]
    fn test_error_kind_mapping() {
        assert_eq!(AltvrError::Config(String::new()).kind(), ErrorKind::Config);
        assert_eq!(AltvrError::RateLimited.kind(), ErrorKind::Io);
        assert_eq!(AltvrError::NotFound(String::new()).kind(), ErrorKind::Io);
        assert_eq!(
            AltvrError::ForeignRedirect(String::new()).kind(),
            ErrorKind::Io
        );
        assert_eq!(AltvrError::AuthError(String::new()).kind(), ErrorKind::Auth);
        assert_eq!(
            AltvrError::SessionRejected(String::new()).kind(),
            ErrorKind::Auth
        );
        assert_eq!(
            AltvrError::ElementNotFound(String::new()).kind(),
            ErrorKind::Parse
        );
        assert_eq!(
            AltvrError::InvalidUrl(String::new()).kind(),
            ErrorKind::InvalidInput
        );
    }

    #[test]
    fn test_error_kind_through_stage() {
        let error = AltvrError::SessionRejected("redirected to sign-in".to_string())
            .in_stage(Stage::Pagination);
        assert_eq!(error.kind(), ErrorKind::Auth);
        assert!(error.is_session_rejected());
    }

    #[test]
    fn test_error_serialize() {
        let error = AltvrError::RateLimited;
        let json = serde_json::to_string(&error).expect("Serialization should succeed");
        assert_eq!(json, "\"Rate limited - too many requests\"");
    }

    #[test]
    fn test_error_serialize_with_stage() {
        let error = AltvrError::ParseError("bad markup".to_string()).in_stage(Stage::FetchToken);
        let json = serde_json::to_string(&error).expect("Serialization should succeed");
        assert_eq!(json, "\"token fetch failed: Failed to parse HTML: bad markup\"");
    }
}
