//! Site search service.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────────┐
//!                         │                  SITE SEARCH                      │
//!                         │                                                   │
//!    GET /search?q=...    │  ┌──────────┐   ┌────────────┐   ┌────────────┐  │
//!    ─────────────────────┼─▶│  http    │──▶│ rate limit │──▶│   guard    │  │
//!                         │  │ server   │   │ (optional) │   │ (optional) │  │
//!                         │  └──────────┘   └────────────┘   └─────┬──────┘  │
//!                         │                                        ▼         │
//!                         │  ┌──────────┐   ┌────────────┐   ┌────────────┐  │
//!    ◀────────────────────┼──│  render  │◀──│   search   │◀──│    view    │  │
//!         HTML            │  │ template │   │  client    │   │            │  │
//!                         │  └──────────┘   └─────┬──────┘   └────────────┘  │
//!                         └───────────────────────┼──────────────────────────┘
//!                                                 ▼
//!                                      Custom Search JSON API
//! ```

use clap::Parser;
use std::path::PathBuf;

use site_search::config::load_or_default;
use site_search::lifecycle::startup;
use site_search::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "site-search")]
#[command(about = "Serve search views backed by the Custom Search JSON API", long_about = None)]
struct Args {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(short, long, env = "SITE_SEARCH_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_or_default(args.config.as_deref())?;

    init_logging(&config.observability);

    tracing::info!("site-search v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        views = config.views.len(),
        api_key_present = config.upstream.api_key.is_some(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
