use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

mod classifier;
mod db;
mod models;
mod report;
mod store;

use classifier::RunConfig;
use db::PgStore;

#[derive(Parser)]
#[command(name = "thesis-status-classifier")]
#[command(about = "Periodic thesis lifecycle status recalculation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load the status taxonomy and a realistic thesis fixture
    Seed,
    /// Run one classification pass over all theses
    Run {
        #[arg(long, default_value_t = 200)]
        page_size: i64,
        #[arg(long, default_value_t = 8)]
        concurrency: usize,
        /// Restrict reclassification to theses currently in these statuses.
        /// Repeatable; omit to reclassify every thesis.
        #[arg(long = "only-status")]
        only_status: Vec<String>,
        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown status report
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Run {
            page_size,
            concurrency,
            only_status,
            json,
        } => {
            let config = RunConfig {
                page_size,
                update_concurrency: concurrency,
                eligible_statuses: if only_status.is_empty() {
                    None
                } else {
                    Some(only_status)
                },
            };
            let store = PgStore::new(pool);
            let summary = classifier::run_classification(&store, Utc::now(), &config).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!(
                    "Updated: ongoing={}, slow={}, at_risk={}",
                    summary.ongoing, summary.slow, summary.at_risk
                );
            }
        }
        Commands::Report { out } => {
            let now = Utc::now();
            let distribution = db::fetch_status_distribution(&pool).await?;
            let inactive =
                db::fetch_inactive_theses(&pool, now - chrono::Duration::days(90)).await?;
            let report = report::build_report(now, &distribution, &inactive);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
