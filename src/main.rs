use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use wol_search::api::{AppState, create_router};
use wol_search::config::{
    CONFIG, DEFAULT_MAX_PAGES, DEFAULT_UNBOUNDED_DELAY, MAX_BOUNDED_PAGES, SessionConfig,
};
use wol_search::data_models::{Language, SearchQuery, SortOrder};
use wol_search::export;
use wol_search::fetcher::WolFetcher;
use wol_search::session::{ResultAccumulator, SearchSession, SearchStatus};

#[derive(Parser)]
#[command(name = "wol-search", version, about = "Keyword search for the online library")]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one search and print the results
    Search(SearchArgs),
    /// Serve the JSON search API
    Serve {
        /// Bind address, defaults to WOL_API_ADDR
        #[arg(long)]
        addr: Option<String>,
    },
}

#[derive(Args)]
struct SearchArgs {
    keyword: String,

    /// Library language: "ja" or "en" (anything else searches "ja")
    #[arg(short, long, default_value = "ja")]
    lang: String,

    #[arg(short, long, value_enum, default_value_t = SortOrder::Relevance)]
    sort: SortOrder,

    /// Maximum number of pages to fetch
    #[arg(short, long, default_value_t = DEFAULT_MAX_PAGES,
          value_parser = clap::value_parser!(u32).range(1..=MAX_BOUNDED_PAGES as i64),
          conflicts_with = "unbounded")]
    max_pages: u32,

    /// Fetch every page the server reports
    #[arg(short, long)]
    unbounded: bool,

    /// Seconds between requests in unbounded mode (0.1 to 2.0)
    #[arg(short, long, default_value_t = DEFAULT_UNBOUNDED_DELAY.as_secs_f64(), requires = "unbounded")]
    delay: f64,

    /// Write the results table as JSON ("-" picks search_results_<keyword>_<lang>.json)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Search(args) => search(args).await,
        Command::Serve { addr } => serve(addr.unwrap_or_else(|| CONFIG.api_addr.clone())).await,
    }
}

async fn search(args: SearchArgs) -> Result<()> {
    let query = SearchQuery::new(args.keyword, Language::from_code(&args.lang), args.sort)?;
    let config = if args.unbounded {
        let delay = Duration::try_from_secs_f64(args.delay)
            .context("delay must be a non-negative number of seconds")?;
        SessionConfig::unbounded(delay)
    } else {
        SessionConfig::bounded(args.max_pages)
    };

    let fetcher = WolFetcher::from_config(&CONFIG)?;
    let cancel = CancellationToken::new();
    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
    let session = SearchSession::new(fetcher, config)
        .with_progress(progress_tx)
        .with_cancellation(cancel.clone());

    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, stopping after the current page");
                cancel.cancel();
            }
        }
    });
    let printer = tokio::spawn(async move {
        while let Some(progress) = progress_rx.recv().await {
            let total = progress
                .total_pages
                .map_or_else(|| "?".to_string(), |t| t.to_string());
            eprintln!(
                "page {}/{}: {} results so far",
                progress.page, total, progress.record_count
            );
        }
    });

    let mut results = ResultAccumulator::new();
    let report = session.run(&query, &mut results).await;
    drop(session);
    printer.await.ok();

    for (i, record) in results.records().iter().enumerate() {
        println!("{}. {}", i + 1, record.title);
        if !record.publication.is_empty() {
            println!("   {}", record.publication);
        }
        if !record.snippet.is_empty() {
            println!("   {}", record.snippet);
        }
        println!("   {}", record.link);
    }

    match report.status() {
        SearchStatus::Success => tracing::info!("{}", report.message()),
        SearchStatus::Partial | SearchStatus::Empty => tracing::warn!("{}", report.message()),
        SearchStatus::Failure => tracing::error!("{}", report.message()),
    }

    if let Some(path) = args.output {
        if results.is_empty() {
            tracing::warn!("nothing to export");
        } else {
            let path = if path.as_os_str() == "-" {
                PathBuf::from(export::default_file_name(&query))
            } else {
                path
            };
            export::write_json_file(results.records(), &path)?;
            tracing::info!("wrote {} results to {}", results.len(), path.display());
        }
    }
    Ok(())
}

async fn serve(addr: String) -> Result<()> {
    let state = Arc::new(AppState {
        fetcher: WolFetcher::from_config(&CONFIG)?,
    });
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("listening on http://{addr}");
    axum::serve(listener, create_router(state))
        .await
        .context("API server stopped")?;
    Ok(())
}
