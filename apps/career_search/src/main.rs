mod config;
mod crew;
mod errors;
mod llm_client;
mod models;
mod resume;
mod routes;
mod search;
mod state;
mod tools;
mod web;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::{ChatModel, LlmClient};
use crate::routes::build_router;
use crate::search::SearchJobs;
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "career_search", version, about = "Resume-aware job search crew")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one search from the terminal and print the structured result
    Search {
        /// Comma-separated search keywords; prompted for when omitted
        #[arg(long)]
        keywords: Option<String>,
        #[arg(long, default_value = "US")]
        location: String,
        /// Plain-text resume; defaults to DEFAULT_RESUME
        #[arg(long)]
        resume: Option<PathBuf>,
    },
    /// Start the web UI and JSON API
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    init_logging(&config)?;

    let client = LlmClient::new(
        config.azure_openai_endpoint.clone(),
        config.azure_openai_key.clone(),
        config.azure_openai_deployment.clone(),
        config.azure_openai_api_version.clone(),
    );
    info!("LLM client initialized (deployment: {})", client.deployment());
    let llm: Arc<dyn ChatModel> = Arc::new(client);

    match cli.command {
        Command::Search {
            keywords,
            location,
            resume,
        } => run_search(&config, llm, keywords, location, resume).await,
        Command::Serve => serve(config, llm).await,
    }
}

/// stdout always; a second plain-text layer when LOG_FILE is set.
fn init_logging(config: &Config) -> Result<()> {
    let file_layer = match &config.log_file {
        Some(path) => {
            if let Some(parent) = Path::new(path).parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create log directory for '{path}'"))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file '{path}'"))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    Ok(())
}

async fn run_search(
    config: &Config,
    llm: Arc<dyn ChatModel>,
    keywords: Option<String>,
    location: String,
    resume: Option<PathBuf>,
) -> Result<()> {
    let keywords = match keywords.filter(|k| !k.trim().is_empty()) {
        Some(keywords) => keywords,
        None => prompt_keywords().await?,
    };
    let resume = resume.unwrap_or_else(|| PathBuf::from(&config.default_resume));

    match SearchJobs::new(keywords.trim(), location.trim(), resume)
        .search(config, llm)
        .await
    {
        Ok(result) => {
            println!("\n\n########################");
            println!("## RESULT ");
            println!("########################\n");
            println!("{result}");
            Ok(())
        }
        Err(e) => {
            error!("Job search failed: {e}");
            std::process::exit(1);
        }
    }
}

async fn prompt_keywords() -> Result<String> {
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(b"Enter search keywords (e.g. Software Engineer, Python, Remote): ")
        .await?;
    stdout.flush().await?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("Failed to read keywords from stdin")?;

    let keywords = line.trim().to_string();
    if keywords.is_empty() {
        anyhow::bail!("Keywords are required");
    }
    Ok(keywords)
}

async fn serve(config: Config, llm: Arc<dyn ChatModel>) -> Result<()> {
    info!("Starting Career Search v{}", env!("CARGO_PKG_VERSION"));

    let port = config.port;
    let state = AppState { config, llm };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
