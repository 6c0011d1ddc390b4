use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "jobsift")]
#[command(about = "Job-board sync and fit-scoring pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one full pipeline pass
    Sync,
    /// Apply pending warehouse migrations
    Migrate,
    /// Start the cron scheduler and block until interrupted
    Schedule,
    /// List the configured boards
    Boards,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Sync) {
        Commands::Sync => {
            let summary = jobsift_sync::run_sync_once_from_env().await?;
            println!(
                "sync complete: run_id={} boards={} fetched={} inserted={} title={} location={} fit={}",
                summary.run_id,
                summary.boards,
                summary.fetched_postings,
                summary.inserted,
                summary.title_updates,
                summary.location_updates,
                summary.fit_updates
            );
        }
        Commands::Migrate => {
            let config = jobsift_sync::SyncConfig::from_env();
            let warehouse = jobsift_storage::PgWarehouse::connect(&config.database_url).await?;
            warehouse.run_migrations().await?;
            println!("migrations applied");
        }
        Commands::Schedule => {
            let pipeline = Arc::new(jobsift_sync::pipeline_from_env().await?);
            match jobsift_sync::maybe_build_scheduler(pipeline).await? {
                Some(mut sched) => {
                    sched.start().await?;
                    println!("scheduler running; press ctrl-c to stop");
                    tokio::signal::ctrl_c().await?;
                }
                None => {
                    eprintln!("scheduler disabled; set JOBSIFT_SCHEDULER_ENABLED=1 to enable");
                }
            }
        }
        Commands::Boards => {
            let config = jobsift_sync::SyncConfig::from_env();
            let registry = jobsift_sync::load_board_registry(&config.boards_path).await?;
            for board in registry.boards {
                println!(
                    "{}\t{}\t{}",
                    board.board_id,
                    board.display_name,
                    if board.enabled { "enabled" } else { "disabled" }
                );
            }
        }
    }

    Ok(())
}
