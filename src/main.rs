use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod charts;
mod config;
mod dataset;
mod db;
mod error;
mod markers;
mod models;
mod personality;
mod quiz;
mod report;
mod store;

use crate::config::Config;
use crate::models::UserId;

#[derive(Parser)]
#[command(name = "crowd-pulse")]
#[command(about = "Crowd analytics, density map data and crowd personality quiz", long_about = None)]
struct Cli {
    /// CSV dataset to read (defaults to CROWD_DATASET or data/hajj_umrah_data.csv)
    #[arg(long, global = true)]
    dataset: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct UserArg {
    /// Authenticated user id supplied by the login layer
    #[arg(long, env = "CROWD_USER_ID")]
    user: Option<i64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load demo users and quiz results
    Seed,
    /// List months available for the analytics filter
    Months,
    /// Build chart data as JSON
    Analytics {
        #[arg(long)]
        month: Option<String>,
        #[arg(long, default_value = "charts.json")]
        out: PathBuf,
    },
    /// Generate a markdown analytics report
    Report {
        #[arg(long)]
        month: Option<String>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Build density markers (or heat points) as JSON
    Map {
        #[arg(long)]
        heat: bool,
        #[arg(long, default_value = "markers.json")]
        out: PathBuf,
    },
    /// Score a quiz submission and store the result
    Quiz {
        #[command(flatten)]
        user: UserArg,
        #[arg(long)]
        q1: Option<String>,
        #[arg(long)]
        q2: Option<String>,
        #[arg(long)]
        q3: Option<String>,
        #[arg(long)]
        q4: Option<String>,
        #[arg(long)]
        q5: Option<String>,
    },
    /// Show a user's quiz history, newest first
    History {
        #[command(flatten)]
        user: UserArg,
    },
    /// Print result counts across all users
    Summary,
}

fn write_json<T: Serialize>(out: &Path, value: &T) -> anyhow::Result<()> {
    let file = std::fs::File::create(out)
        .with_context(|| format!("failed to create {}", out.display()))?;
    serde_json::to_writer_pretty(file, value)?;
    Ok(())
}

async fn connect(config: &Config) -> anyhow::Result<sqlx::PgPool> {
    let database_url = config.require_database_url()?;
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crowd_pulse=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let dataset_path = cli.dataset.unwrap_or_else(|| config.dataset_path.clone());

    match cli.command {
        Commands::InitDb => {
            let pool = connect(&config).await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect(&config).await?;
            let inserted = db::seed(&pool).await?;
            println!("Seed data inserted ({inserted} quiz results).");
        }
        Commands::Months => {
            let data = dataset::load_dataset(&dataset_path)?;
            for month in charts::available_months(&data.records) {
                println!("{month}");
            }
        }
        Commands::Analytics { month, out } => {
            let data = dataset::load_dataset(&dataset_path)?;
            let chart_set = charts::build_charts(&data.records, month.as_deref());
            write_json(&out, &chart_set)?;
            println!("Chart data written to {}.", out.display());
        }
        Commands::Report { month, out } => {
            let data = dataset::load_dataset(&dataset_path)?;
            let months = charts::available_months(&data.records);
            let chart_set = charts::build_charts(&data.records, month.as_deref());
            let report = report::build_report(&chart_set, &months, data.records.len());
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Map { heat, out } => {
            let data = dataset::load_dataset(&dataset_path)?;
            let layer = markers::marker_layer(&data)?;
            if heat {
                write_json(&out, &markers::heat_points(&layer.markers))?;
            } else {
                write_json(&out, &layer)?;
            }
            println!("{} markers written to {}.", layer.markers.len(), out.display());
        }
        Commands::Quiz {
            user,
            q1,
            q2,
            q3,
            q4,
            q5,
        } => {
            let pool = connect(&config).await?;
            let store = db::PgResultStore::new(pool);
            let raw = [
                q1.as_deref(),
                q2.as_deref(),
                q3.as_deref(),
                q4.as_deref(),
                q5.as_deref(),
            ];
            let result = quiz::submit(&store, user.user.map(UserId), raw).await?;
            println!("Your crowd personality is: {}", result.label);
        }
        Commands::History { user } => {
            let pool = connect(&config).await?;
            let store = db::PgResultStore::new(pool);
            let entries = quiz::history(&store, user.user.map(UserId)).await?;
            if entries.is_empty() {
                println!("No quiz results yet.");
                return Ok(());
            }
            for entry in entries {
                println!("- {} on {}", entry.label, entry.created_at.format("%Y-%m-%d %H:%M"));
            }
        }
        Commands::Summary => {
            let pool = connect(&config).await?;
            let store = db::PgResultStore::new(pool);
            let counts = quiz::summary(&store).await?;
            println!("{}", serde_json::to_string_pretty(&counts)?);
        }
    }

    Ok(())
}
