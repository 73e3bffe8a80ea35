//! AltspaceVR Portal Crawler Tauri Integration
//!
//! Provides a Tauri plugin that hands portal search results to a frontend.
//! The frontend renders cards and pager controls; this plugin only turns
//! its clicks into crawler calls.
//!
//! # Usage
//!
//! Register the plugin in your Tauri application:
//!
//! ```ignore
//! fn main() {
//!     tauri::Builder::default()
//!         .plugin(altvr_portal_tauri::init())
//!         .run(tauri::generate_context!())
//!         .expect("error while running tauri application");
//! }
//! ```
//!
//! Then invoke commands from the frontend:
//!
//! ```javascript
//! import { invoke } from '@tauri-apps/api/core';
//!
//! // Fresh query
//! const { items, pager } = await invoke('plugin:altvr-portal|search_portals', { term: 'castle' });
//!
//! // Pager click; the entry with an empty url is the current page
//! const next = await invoke('plugin:altvr-portal|goto_page', { url: pager[1].url });
//! ```
//!
//! `EMAIL` and `PASSWORD` must be set before the plugin is initialised;
//! setup fails otherwise.

use std::sync::Arc;
use tokio::sync::Mutex;

use altvr_portal_core::{AltvrCrawler, ClientConfig, Credentials};
use tauri::{
    Manager, Runtime,
    plugin::{Builder, TauriPlugin},
};

mod commands;

/// Thread-safe wrapper for AltvrCrawler
///
/// The mutex keeps searches single-flow: one search or pager click runs
/// to completion before the next one starts.
pub struct CrawlerState {
    pub(crate) crawler: Arc<Mutex<AltvrCrawler>>,
}

impl CrawlerState {
    /// Create a new CrawlerState with credentials from the environment
    ///
    /// # Errors
    /// Returns error string if credentials are missing or the crawler
    /// cannot be built
    pub fn new() -> Result<Self, String> {
        let crawler = AltvrCrawler::from_env().map_err(|e| e.to_string())?;
        Ok(Self::from_crawler(crawler))
    }

    /// Create a CrawlerState with explicit credentials and configuration
    pub fn with_config(credentials: Credentials, config: ClientConfig) -> Result<Self, String> {
        let crawler = AltvrCrawler::with_config(credentials, config).map_err(|e| e.to_string())?;
        Ok(Self::from_crawler(crawler))
    }

    fn from_crawler(crawler: AltvrCrawler) -> Self {
        Self {
            crawler: Arc::new(Mutex::new(crawler)),
        }
    }
}

/// Initialize the altvr-portal plugin
///
/// # Returns
/// A configured TauriPlugin ready to be registered with the Tauri application
pub fn init<R: Runtime>() -> TauriPlugin<R> {
    Builder::new("altvr-portal")
        .invoke_handler(tauri::generate_handler![
            commands::search_portals,
            commands::goto_page
        ])
        .setup(|app, _api| {
            let state = CrawlerState::new().map_err(Box::<dyn std::error::Error>::from)?;
            app.manage(state);
            Ok(())
        })
        .build()
}

// Re-export types for convenience
pub use altvr_portal_core::{PagerItem, PortalItem, SearchResult};
