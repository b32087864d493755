use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::sync::Arc;
use tracing::{info, warn};

use threadwatch::config::{self, Config};
use threadwatch::db::Database;
use threadwatch::fetch::{HttpFetcher, Pacer};
use threadwatch::llm::OpenAiGenerator;
use threadwatch::pipeline::{self, Ingestor};
use threadwatch::reply::ReplyEngine;

/// Threadwatch: watch forum groups for threads that match your keywords.
///
/// Crawls group listings on a schedule, stores threads and comments,
/// flags keyword matches, and can draft replies in each group's own style.
#[derive(Parser)]
#[command(name = "threadwatch", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Crawl all groups forever, sleeping between cycles
    Run(CrawlArgs),

    /// Crawl all groups once and print a summary
    Crawl(CrawlArgs),

    /// Draft a reply for one stored thread
    Draft {
        /// External thread ID (the number in /group/topic/<id>/)
        post_id: String,
    },

    /// Show store status (row counts, matched threads)
    Status,
}

/// Per-invocation overrides of the environment configuration.
#[derive(Args)]
struct CrawlArgs {
    /// Comma-separated group IDs (overrides THREADWATCH_GROUPS)
    #[arg(long)]
    groups: Option<String>,

    /// Comma-separated include keywords (overrides THREADWATCH_KEYWORDS)
    #[arg(long)]
    keywords: Option<String>,

    /// Listing pages per group (overrides THREADWATCH_PAGES)
    #[arg(long)]
    pages: Option<u32>,

    /// Draft replies after each group's crawl
    #[arg(long)]
    reply: bool,
}

impl CrawlArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(groups) = &self.groups {
            config.crawl.groups = config::split_list(groups);
        }
        if let Some(keywords) = &self.keywords {
            config.crawl.keywords = config::split_list(keywords);
        }
        if let Some(pages) = self.pages {
            config.crawl.pages = pages;
        }
        if self.reply {
            config.reply.enabled = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("threadwatch=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            info!("Initializing Threadwatch database...");
            let config = Config::load()?;
            let db = threadwatch::db::initialize(&config.db_path)?;
            let table_count = db.table_count().await?;
            println!("Database initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            println!("\nThreadwatch is ready. Next step: set THREADWATCH_GROUPS and");
            println!("THREADWATCH_KEYWORDS in your .env file, then run:");
            println!("  threadwatch crawl");
        }

        Commands::Run(args) => {
            let mut config = Config::load()?;
            args.apply(&mut config);
            config.require_groups()?;
            let (db, pacer) = open_runtime(&config)?;
            let ingestor = build_ingestor(&config, db.clone(), pacer.clone())?;
            let engine = build_reply_engine(&config, db, pacer)?;

            info!(
                groups = ?config.crawl.groups,
                poll_secs = config.crawl.poll_interval.as_secs(),
                replies = engine.is_some(),
                "Starting poll loop"
            );
            tokio::select! {
                result = pipeline::run_forever(
                    &ingestor,
                    engine.as_ref(),
                    &config.crawl.groups,
                    config.crawl.poll_interval,
                ) => result?,
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted, shutting down");
                }
            }
        }

        Commands::Crawl(args) => {
            let mut config = Config::load()?;
            args.apply(&mut config);
            config.require_groups()?;
            let (db, pacer) = open_runtime(&config)?;
            let ingestor = build_ingestor(&config, db.clone(), pacer.clone())?;
            let engine = build_reply_engine(&config, db, pacer)?;

            let report =
                pipeline::run_cycle(&ingestor, engine.as_ref(), &config.crawl.groups).await;
            threadwatch::output::terminal::display_cycle_report(&report);
        }

        Commands::Draft { post_id } => {
            let mut config = Config::load()?;
            config.require_llm()?;
            config.reply.enabled = true;
            let (db, pacer) = open_runtime(&config)?;
            let generator = Arc::new(OpenAiGenerator::new(&config.llm)?);
            let engine = ReplyEngine::new(db, generator, pacer, config.reply.clone());

            println!("Drafting a reply for thread {post_id}...");
            let draft = engine.draft_for_thread(&post_id).await?;
            threadwatch::output::terminal::display_draft(&draft);
            println!(
                "\n{}",
                "Drafts are not posted. Copy the text above if you want to use it.".dimmed()
            );
        }

        Commands::Status => {
            let config = Config::load()?;
            if !threadwatch::status::is_initialized(&config.db_path) {
                println!("Database: not initialized");
                println!("\nRun `threadwatch init` to set up the database.");
                return Ok(());
            }
            let db = threadwatch::db::open(&config.db_path)?;
            threadwatch::status::show(&db, &config.db_path).await?;
        }
    }

    Ok(())
}

/// Open the store and seed the process-wide pacing source.
fn open_runtime(config: &Config) -> Result<(Arc<dyn Database>, Arc<Pacer>)> {
    let db = threadwatch::db::initialize(&config.db_path)?;
    Ok((db, Arc::new(Pacer::from_os_rng())))
}

fn build_ingestor(config: &Config, db: Arc<dyn Database>, pacer: Arc<Pacer>) -> Result<Ingestor> {
    let fetcher = Arc::new(HttpFetcher::new(&config.site)?);
    Ingestor::new(db, fetcher, pacer, &config.site.base_url, config.crawl.clone())
}

/// Build the reply engine when replies are enabled.
fn build_reply_engine(
    config: &Config,
    db: Arc<dyn Database>,
    pacer: Arc<Pacer>,
) -> Result<Option<ReplyEngine>> {
    if !config.reply.enabled {
        return Ok(None);
    }
    if config.llm.api_key.is_empty() {
        warn!("LLM_API_KEY not set; crawling continues but every reply draft will fail");
    }
    let generator = Arc::new(OpenAiGenerator::new(&config.llm)?);
    Ok(Some(ReplyEngine::new(
        db,
        generator,
        pacer,
        config.reply.clone(),
    )))
}
