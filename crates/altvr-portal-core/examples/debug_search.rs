//! Debug script to run a live portal search against account.altvr.com
//!
//! Usage: EMAIL=... PASSWORD=... cargo run --example debug_search -- castle [page]
//!
//! Set RUST_LOG=altvr_portal_core=debug to see every request.

use altvr_portal_core::AltvrCrawler;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("altvr_portal_core=info,warn")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let term = args.next().unwrap_or_else(|| "castle".to_string());
    let page: Option<usize> = args.next().and_then(|p| p.parse().ok());

    let crawler = AltvrCrawler::from_env()?;

    println!("Searching portals for '{}'...\n", term);
    let mut result = crawler.search(&term, None).await?;

    // Walk the pager by its visible labels until the requested page is shown
    if let Some(page) = page {
        let label = page.to_string();
        if let Some(link) = result.pager.iter().find(|p| p.text == label && !p.is_current()) {
            let url = link.url.clone();
            println!("Following pager link {}\n", url);
            result = crawler.search("", Some(url.as_str())).await?;
        }
    }

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
