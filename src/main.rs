// Copyright 2026 Innsight Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{Parser, Subcommand};
use innsight::config::Config;
use innsight::engine::{resolve_dates, HotelSource, ScrapeEngine};
use innsight::renderer::chromium::ChromiumRenderer;
use innsight::renderer::{NoopRenderer, Renderer};
use innsight::rest::AppState;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "innsight",
    about = "Innsight — hotel data extraction service",
    version,
    after_help = "Run 'innsight <command> --help' for details on each command."
)]
struct Cli {
    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8000")]
        port: u16,
        /// Serve canned listings when scraping yields nothing
        #[arg(long)]
        mock_fallback: bool,
    },
    /// Search for hotels in a city and print the results as JSON
    Search {
        /// City name, e.g. "Mumbai"
        city: String,
        /// Check-in date (YYYY-MM-DD); defaults to a week from today
        #[arg(long)]
        checkin: Option<String>,
        /// Check-out date (YYYY-MM-DD); defaults to the night after check-in
        #[arg(long)]
        checkout: Option<String>,
    },
    /// Fetch one hotel's detail record and print it as JSON
    Details {
        /// Full detail-page URL
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "innsight=debug" } else { "innsight=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_level.parse().expect("static directive")),
        )
        .init();

    let mut config = Config::from_env();

    match cli.command {
        Commands::Serve { port, mock_fallback } => {
            if mock_fallback {
                config.enable_mock_fallback = true;
            }
            let config = Arc::new(config);
            let renderer = build_renderer().await;
            let engine = ScrapeEngine::new(renderer, Arc::clone(&config));
            let state = AppState::new(config, Arc::new(engine));
            innsight::rest::start(port, state).await
        }
        Commands::Search {
            city,
            checkin,
            checkout,
        } => {
            let config = Arc::new(config);
            let renderer = build_renderer().await;
            let engine = ScrapeEngine::new(renderer, Arc::clone(&config));
            let (checkin, checkout) = resolve_dates(&config, checkin.as_deref(), checkout.as_deref());
            let listings = engine.search(&city, &checkin, &checkout).await?;
            println!("{}", serde_json::to_string_pretty(&listings)?);
            Ok(())
        }
        Commands::Details { url } => {
            let config = Arc::new(config);
            let renderer = build_renderer().await;
            let engine = ScrapeEngine::new(renderer, Arc::clone(&config));
            match engine.fetch_details(&url).await? {
                Some(detail) => {
                    println!("{}", serde_json::to_string_pretty(&detail)?);
                    Ok(())
                }
                None => {
                    warn!(%url, "no hotel found at that URL");
                    std::process::exit(1);
                }
            }
        }
    }
}

/// Launch Chromium, falling back to the no-op renderer so the API can
/// still come up (and serve mock data) on hosts without a browser.
async fn build_renderer() -> Arc<dyn Renderer> {
    match ChromiumRenderer::new().await {
        Ok(renderer) => {
            info!("Chromium renderer ready");
            Arc::new(renderer)
        }
        Err(e) => {
            warn!(error = %e, "Chromium unavailable, fetches will fail");
            Arc::new(NoopRenderer)
        }
    }
}
