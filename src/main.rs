//! ingestd: Resumable Batch-Import Orchestrator
//!
//! CLI and daemon entry point.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveTime;
use clap::{Parser, Subcommand};
use tokio::sync::broadcast;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use ingestd::config::{Config, LogFormat};
use ingestd::http::{AppState, HttpServer};
use ingestd::orchestrator::Orchestrator;
use ingestd::schedule::{ScheduleState, ScheduleStore};

#[derive(Parser)]
#[command(name = "ingestd")]
#[command(about = "Resumable, chunked batch-import orchestrator")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "ingestd.toml")]
    config: PathBuf,

    /// Data directory override
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a configuration file and the schedule record
    Init {
        /// Location of the dataset to import
        #[arg(long)]
        source_url: String,

        /// Time of day (UTC, HH:MM) for the recurring run
        #[arg(long, default_value = "02:00")]
        time: String,

        /// Run the image conversion phase after each full import
        #[arg(long)]
        auto_convert: bool,

        /// Output directory
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Trigger a run now and print the report
    Run,

    /// Serve the HTTP trigger API
    Serve,

    /// Show the schedule record
    Status,

    /// Enable the schedule
    Enable,

    /// Disable the schedule
    Disable,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load or create config
    let config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };

    let mut config = config;
    if let Some(data_dir) = cli.data_dir {
        config.node.data_dir = data_dir;
    }

    setup_logging(&config, cli.verbose)?;

    match cli.command {
        Commands::Init {
            source_url,
            time,
            auto_convert,
            path,
        } => init(config, source_url, time, auto_convert, path).await,
        Commands::Run => run_once(config).await,
        Commands::Serve => serve(config).await,
        Commands::Status => status(config).await,
        Commands::Enable => set_enabled(config, true).await,
        Commands::Disable => set_enabled(config, false).await,
    }
}

fn setup_logging(config: &Config, verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => config.logging.level.as_tracing(),
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    match config.logging.format {
        LogFormat::Text => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_target(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogFormat::Json => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_target(false)
                .json()
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

async fn init(
    config: Config,
    source_url: String,
    time: String,
    auto_convert: bool,
    path: PathBuf,
) -> Result<()> {
    let scheduled_time = NaiveTime::parse_from_str(&time, "%H:%M")
        .map_err(|e| anyhow::anyhow!("Invalid --time '{}' (expected HH:MM): {}", time, e))?;

    let config_path = path.join("ingestd.toml");
    let toml_content = toml::to_string_pretty(&config)?;
    std::fs::write(&config_path, toml_content)?;
    println!("Created configuration file: {}", config_path.display());

    std::fs::create_dir_all(&config.node.data_dir)?;

    let state = ScheduleState::new(source_url, scheduled_time, auto_convert);
    ScheduleStore::create(&config.node.data_dir, state)?;
    println!(
        "Created schedule record in {}",
        config.node.data_dir.display()
    );

    Ok(())
}

async fn run_once(config: Config) -> Result<()> {
    let store = Arc::new(ScheduleStore::open(&config.node.data_dir)?);
    let orchestrator = Orchestrator::with_http_workers(store, &config)?;

    let report = orchestrator.run_now().await?;

    println!("\nRun Report");
    println!("==========");
    println!("Status:           {}", report.status.as_str());
    println!("Chunks processed: {}", report.chunks_processed);
    println!("Records inserted: {}", report.records_inserted);
    println!("Records updated:  {}", report.records_updated);
    if let Some(total) = report.total_rows {
        println!("Total rows:       {}", total);
    }
    if let Some(conversion) = &report.conversion {
        println!(
            "Conversion:       {} converted, {} failed{}",
            conversion.converted,
            conversion.failed,
            if conversion.degraded { " (degraded)" } else { "" }
        );
        for err in &conversion.errors {
            println!("  - {}", err);
        }
    }
    if let Some(next) = report.next_run_at {
        println!("Next run at:      {}", next.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if let Some(error) = &report.error {
        println!("Error:            {}", error);
    }

    Ok(())
}

async fn serve(config: Config) -> Result<()> {
    if !config.http.enabled {
        warn!("http.enabled is false in the config; serving anyway because `serve` was requested");
    }

    let store = Arc::new(ScheduleStore::open(&config.node.data_dir)?);
    let orchestrator = Arc::new(Orchestrator::with_http_workers(store.clone(), &config)?);

    let state = AppState {
        orchestrator,
        store,
    };

    let (shutdown_tx, _) = broadcast::channel(1);
    let ctrl_c_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C, shutting down");
            let _ = ctrl_c_tx.send(());
        }
    });

    let server = HttpServer::new(config.http.clone(), state);
    server.run(shutdown_tx.subscribe()).await
}

async fn status(config: Config) -> Result<()> {
    let store = ScheduleStore::open(&config.node.data_dir)?;
    let state = store.snapshot();

    println!("\nSchedule Status");
    println!("===============");
    println!("Id:              {}", state.id);
    println!("Source:          {}", state.source_url);
    println!("Enabled:         {}", state.enabled);
    println!("Scheduled time:  {} UTC", state.scheduled_time.format("%H:%M"));
    println!("Auto-convert:    {}", state.auto_convert_images);
    println!("Status:          {}", state.status.as_str());
    println!("Current offset:  {}", state.current_offset);
    if let Some(total) = state.total_rows {
        println!("Total rows:      {}", total);
    }
    if let Some(t) = state.last_run_at {
        println!("Last run at:     {}", t.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if let Some(t) = state.next_run_at {
        println!("Next run at:     {}", t.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if let Some(e) = &state.error_message {
        println!("Last error:      {}", e);
    }

    Ok(())
}

async fn set_enabled(config: Config, enabled: bool) -> Result<()> {
    let store = ScheduleStore::open(&config.node.data_dir)?;
    let revision = store.snapshot().revision;
    let state = store.update(revision, |s| s.enabled = enabled)?;
    println!(
        "Schedule {} is now {}",
        state.id,
        if state.enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}
