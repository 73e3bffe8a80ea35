//! Main crawler API for AltspaceVR portal search
//!
//! Combines the HTTP client, sign-in negotiation, and result parser, and
//! owns the session cookie shared by all of them.

use std::sync::{Mutex as StdMutex, PoisonError};

use ::url::Url;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::auth;
use crate::client::AltvrClient;
use crate::config::{ClientConfig, Credentials};
use crate::error::{AltvrError, Result, Stage};
use crate::parser::parse_search_results;
use crate::session::Session;
use crate::types::SearchResult;
use crate::url::{build_search_url, is_same_site};

/// Terms shorter than this (in characters) are not sent to the site
pub const MIN_TERM_CHARS: usize = 2;

/// Where the crawler stands with the site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// No session cached
    Unauthenticated,
    /// Token fetch or login in progress
    Authenticating,
    /// A session is cached and reused for every request
    Authenticated,
}

/// Main crawler API for account.altvr.com
///
/// Signs in lazily on the first search, caches the resulting session,
/// and reuses it until the site rejects a request. Searches and pager
/// clicks both come back as a [`SearchResult`].
pub struct AltvrCrawler {
    client: AltvrClient,
    credentials: Credentials,
    // Held across the whole sign-in, so concurrent searches wait for one login
    session: Mutex<Option<Session>>,
    state: StdMutex<AuthState>,
}

impl AltvrCrawler {
    /// Create a new crawler against the live site
    ///
    /// # Errors
    /// Returns error if HTTP client initialization fails
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::with_config(credentials, ClientConfig::default())
    }

    /// Create a crawler reading credentials from the environment
    ///
    /// # Errors
    /// Returns `Config` if `EMAIL` or `PASSWORD` is missing
    pub fn from_env() -> Result<Self> {
        Self::new(Credentials::from_env()?)
    }

    /// Create a new crawler with custom client configuration
    ///
    /// # Errors
    /// Returns error if HTTP client initialization fails
    pub fn with_config(credentials: Credentials, config: ClientConfig) -> Result<Self> {
        let client = AltvrClient::with_config(config)?;
        Ok(Self {
            client,
            credentials,
            session: Mutex::new(None),
            state: StdMutex::new(AuthState::Unauthenticated),
        })
    }

    /// Current position in the sign-in state machine
    pub fn auth_state(&self) -> AuthState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: AuthState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Search for portals, or load another page of a previous search
    ///
    /// # Arguments
    /// * `term` - Search term; ignored when `page_url` is given
    /// * `page_url` - Absolute pager URL taken from a previous result
    ///
    /// # Returns
    /// Portal items and pager controls of the requested page. A term
    /// shorter than two characters without `page_url` returns an empty
    /// result without touching the network.
    ///
    /// # Errors
    /// - `InvalidUrl` if `page_url` does not parse or does not belong to the
    ///   configured site
    /// - Sign-in errors, tagged `FetchToken` or `Login`
    /// - `SessionRejected` / `HttpError` etc. from the page fetch, tagged
    ///   `Search` or `Pagination`; the cached session is dropped first
    ///
    /// # Example
    /// ```no_run
    /// # async fn example() -> altvr_portal_core::Result<()> {
    /// use altvr_portal_core::AltvrCrawler;
    /// let crawler = AltvrCrawler::from_env()?;
    /// let page = crawler.search("castle", None).await?;
    /// for item in &page.items {
    ///     println!("{}: {}", item.space_id, item.name);
    /// }
    /// if let Some(next) = page.pager.iter().find(|p| !p.is_current()) {
    ///     let more = crawler.search("", Some(next.url.as_str())).await?;
    ///     println!("{} more portals", more.items.len());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn search(&self, term: &str, page_url: Option<&str>) -> Result<SearchResult> {
        let (url, stage) = match page_url {
            Some(page_url) => {
                let page_url = page_url.trim();
                let url = Url::parse(page_url)
                    .map_err(|e| AltvrError::InvalidUrl(format!("{}: {}", page_url, e)))?;
                if !is_same_site(self.client.base_url(), &url) {
                    return Err(AltvrError::InvalidUrl(page_url.to_string()));
                }
                (url, Stage::Pagination)
            }
            None => {
                let term = term.trim();
                if term.chars().count() < MIN_TERM_CHARS {
                    return Ok(SearchResult::default());
                }
                let url = build_search_url(self.client.base_url(), term)
                    .map_err(|e| e.in_stage(Stage::Search))?;
                (url, Stage::Search)
            }
        };

        let session = self.ensure_session().await?;

        let html = match self.client.get(&url, Some(&session)).await {
            Ok(html) => html,
            Err(e) => {
                if e.is_session_rejected() {
                    warn!(%stage, "session rejected, signing in again on next search");
                }
                self.drop_session(&session).await;
                return Err(e.in_stage(stage));
            }
        };

        let result = parse_search_results(&html, &url)
            .map_err(|e| e.in_stage(stage))?;
        info!(
            %stage,
            items = result.items.len(),
            pages = result.pager.len(),
            "search complete"
        );
        Ok(result)
    }

    /// Search for portals by term
    pub async fn search_term(&self, term: &str) -> Result<SearchResult> {
        self.search(term, None).await
    }

    /// Load the page behind a pager control
    pub async fn goto_page(&self, page_url: &str) -> Result<SearchResult> {
        self.search("", Some(page_url)).await
    }

    /// Forget the cached session; the next search signs in again
    pub async fn invalidate_session(&self) {
        let mut slot = self.session.lock().await;
        *slot = None;
        self.set_state(AuthState::Unauthenticated);
    }

    /// Return the cached session, signing in first if there is none
    async fn ensure_session(&self) -> Result<Session> {
        let mut slot = self.session.lock().await;

        if let Some(session) = slot.as_ref() {
            return Ok(session.clone());
        }

        self.set_state(AuthState::Authenticating);
        match auth::authenticate(&self.client, &self.credentials).await {
            Ok(session) => {
                *slot = Some(session.clone());
                self.set_state(AuthState::Authenticated);
                Ok(session)
            }
            Err(e) => {
                self.set_state(AuthState::Unauthenticated);
                Err(e)
            }
        }
    }

    /// Drop `failed` from the cache unless another search already replaced it
    ///
    /// Sessions compare by identity, so a fresh sign-in is never discarded
    /// because an older copy failed.
    async fn drop_session(&self, failed: &Session) {
        let mut slot = self.session.lock().await;
        if slot.as_ref() == Some(failed) {
            *slot = None;
            self.set_state(AuthState::Unauthenticated);
        }
    }
}
