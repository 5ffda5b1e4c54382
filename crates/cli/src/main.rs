//! Hybrid code search CLI: wires the in-memory reference collaborators
//! into an orchestrator and exposes it over HTTP, WebSocket, or the
//! agent-tool (MCP) transport.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hybridsearch::{build_orchestrator, CollaboratorConfig};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Parser)]
#[command(name = "hybridsearch")]
#[command(about = "Hybrid sparse/dense code search")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path.
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Fixture corpus file to load into the in-memory indexes on startup.
    #[arg(long, value_name = "FILE", global = true)]
    fixtures: Option<PathBuf>,

    /// Verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP and WebSocket transport.
    ServeHttp {
        /// Address to bind, e.g. 127.0.0.1:8080.
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: String,
    },
    /// Start the Model Context Protocol transport over stdio.
    ServeMcp {
        /// Store to search when the tool call omits one.
        #[arg(long, default_value = "default")]
        default_store: String,
    },
    /// Run a single query against the loaded stores and print the response.
    Search {
        /// Store to search.
        store: String,
        /// Query text.
        query: String,
        #[arg(long)]
        top_k: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let (orchestrator, loaded_stores) = build_orchestrator(CollaboratorConfig {
        config_path: cli.config,
        fixture_path: cli.fixtures,
    })
    .await
    .context("failed to wire collaborators")?;

    match cli.command {
        Commands::ServeHttp { bind } => {
            info!("serving {} store(s) over HTTP at {bind}", loaded_stores.len());
            let router = hybridsearch_http::build_router(hybridsearch_http::AppState::new(orchestrator));
            let listener = tokio::net::TcpListener::bind(&bind)
                .await
                .with_context(|| format!("failed to bind {bind}"))?;
            axum::serve(listener, router)
                .await
                .context("HTTP server exited with an error")?;
            Ok(())
        }
        Commands::ServeMcp { default_store } => {
            info!("serving {} store(s) over MCP", loaded_stores.len());
            hybridsearch_mcp::run_mcp_server(orchestrator, default_store).await
        }
        Commands::Search { store, query, top_k } => {
            let mut request = hybridsearch_orchestrator::SearchRequest::new(store, query);
            request.top_k = top_k;
            let response = orchestrator
                .search(request, CancellationToken::new())
                .await
                .context("search failed")?;
            println!("{}", serde_json::to_string_pretty(&response.results)?);
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("hybridsearch={level}"))
        .init();
}
