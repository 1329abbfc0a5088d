use clap::{Parser, Subcommand};
use std::path::PathBuf;

use site_search::config::{load_config, load_or_default, ConfigError};
use site_search::search::{CustomSearchClient, ResultFetcher, SearchRequest};
use site_search::SearchError;

#[derive(Parser)]
#[command(name = "search-cli")]
#[command(about = "Command line tools for the site search service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one search and print the reshaped results as JSON
    Query {
        query: String,

        #[arg(long)]
        start: Option<u32>,

        #[arg(long)]
        num: Option<u32>,

        /// Restrict results to this site
        #[arg(long)]
        site: Option<String>,

        /// Search engine id. Defaults to the first configured view's.
        #[arg(long)]
        cx: Option<String>,

        /// Use the site-restricted endpoint
        #[arg(long)]
        site_restricted: bool,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Validate a configuration file
    CheckConfig { path: PathBuf },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Query {
            query,
            start,
            num,
            site,
            cx,
            site_restricted,
            config,
        } => {
            let config = load_or_default(config.as_deref())?;
            let api_key = config
                .upstream
                .api_key
                .clone()
                .ok_or(SearchError::MissingApiKey)?;
            let cx = match cx {
                Some(cx) => cx,
                None => config
                    .views
                    .first()
                    .map(|view| view.search_engine_id.clone())
                    .unwrap_or_default(),
            };

            let mut request = SearchRequest::new(api_key, cx, query);
            request.start = start;
            request.num = num;
            request.site_search = site;
            request.site_restricted = site_restricted;

            let client = CustomSearchClient::new(&config.upstream)?;
            let results = client.fetch(&request).await?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Commands::CheckConfig { path } => match load_config(&path) {
            Ok(config) => {
                println!(
                    "{}: ok ({} view(s), api key {})",
                    path.display(),
                    config.views.len(),
                    if config.upstream.api_key.is_some() { "set" } else { "missing" }
                );
            }
            Err(ConfigError::Validation(errors)) => {
                eprintln!("{}: invalid", path.display());
                for error in &errors {
                    eprintln!("  {error}");
                }
                std::process::exit(1);
            }
            Err(e) => return Err(e.into()),
        },
    }

    Ok(())
}
