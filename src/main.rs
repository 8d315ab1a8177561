// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use news_threads::cache::summary;
use news_threads::utils::logging::{format_error, format_info, format_success, format_warning};
use news_threads::{
    AnswerCache, AnswerPublisher, AppState, ClassifiedDocument, ClusterBuilder, Config,
    DocumentStore, LexiconModels, NewsModels, RecencyBuckets, RefreshPipeline, SystemClock,
    classify_directory, run_server,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "news_threads")]
#[command(version)]
#[command(about = "Clusters news articles into threads and serves them by recency", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server with the background refresh
    Serve {
        #[arg(long, value_name = "ADDR", env = "NEWS_THREADS_BIND")]
        bind: Option<String>,
    },

    /// Group articles under a directory by detected language
    Languages { dir: PathBuf },

    /// List articles classified as news
    News { dir: PathBuf },

    /// Group news articles by category
    Categories { dir: PathBuf },

    /// Cluster news articles into threads
    Threads { dir: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    colored::control::set_override(cli.color);
    news_threads::utils::logging::init_logger(cli.color, cli.verbose);

    info!("Loading configuration from: {}", cli.config.display());

    let config = if cli.config.exists() {
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, using default configuration",
            cli.config.display()
        );
        Config::load(None).unwrap_or_else(|e| {
            warn!("Falling back to built-in defaults: {}", e);
            Config::default_config()
        })
    };

    match cli.command {
        Commands::Serve { bind } => {
            cmd_serve(&config, bind).await?;
        }
        Commands::Languages { dir } => {
            let documents = classify(&config, &dir).await?;
            print_json(&summary::languages(&documents))?;
        }
        Commands::News { dir } => {
            let documents = classify(&config, &dir).await?;
            print_json(&summary::news(&documents))?;
        }
        Commands::Categories { dir } => {
            let documents = classify(&config, &dir).await?;
            print_json(&summary::categories(&documents))?;
        }
        Commands::Threads { dir } => {
            let documents = classify(&config, &dir).await?;
            let clusters = ClusterBuilder::new(config.clustering.clone()).build(&documents);
            print_json(&summary::threads(&clusters))?;
        }
    }

    Ok(())
}

fn lexicon_models(config: &Config) -> Arc<dyn NewsModels> {
    Arc::new(LexiconModels::new(
        &config.classifier,
        config.clustering.embedding_dim,
    ))
}

async fn cmd_serve(config: &Config, bind: Option<String>) -> Result<()> {
    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    let start_time = Instant::now();

    let store = DocumentStore::open(config.store.content_dir.clone(), Arc::new(SystemClock))
        .await
        .with_context(|| {
            format!(
                "Failed to open document store at {}",
                config.store.content_dir.display()
            )
        })?;

    let buckets = RecencyBuckets::new(config.cache.bucket_secs.clone())
        .context("Invalid recency buckets")?;
    let publisher = Arc::new(AnswerPublisher::new(AnswerCache::empty(buckets)));

    let pipeline = RefreshPipeline::new(
        config,
        store.clone(),
        lexicon_models(config),
        publisher.clone(),
    )
    .context("Failed to create refresh pipeline")?;
    let refresh = pipeline.spawn(Duration::from_secs(config.pipeline.refresh_interval_secs));

    eprintln!(
        "{}",
        format_success(&format!(
            "Store ready in {:.2}s, serving on {}",
            start_time.elapsed().as_secs_f64(),
            bind
        ))
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
        }
        info!("Shutdown signal received");
    };

    let served = run_server(&bind, AppState::new(store, publisher), shutdown).await;
    refresh.abort();

    match served {
        Ok(()) => {
            eprintln!("{}", format_info("Server stopped"));
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", format_error(&format!("Server failed: {}", e)));
            Err(e).context("HTTP server error")
        }
    }
}

async fn classify(config: &Config, dir: &Path) -> Result<Vec<ClassifiedDocument>> {
    let start_time = Instant::now();
    let documents = classify_directory(dir, config, lexicon_models(config))
        .await
        .with_context(|| format!("Failed to classify {}", dir.display()))?;

    if documents.is_empty() {
        eprintln!(
            "{}",
            format_warning(&format!("No parsable articles under {}", dir.display()))
        );
    } else {
        eprintln!(
            "{}",
            format_success(&format!(
                "Classified {} articles in {:.2}s",
                documents.len(),
                start_time.elapsed().as_secs_f64()
            ))
        );
    }

    Ok(documents)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize answer")?;
    println!("{}", json);
    Ok(())
}
