use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use tracing_subscriber::EnvFilter;

use self_score_panel::models::{Selection, TurnRecord, ViewType};
use self_score_panel::panel::SelfScorePanel;
use self_score_panel::{dataset, db, report};

#[derive(Parser)]
#[command(name = "self-score-panel")]
#[command(about = "Self-collaboration score panel for meeting turn datasets", long_about = None)]
struct Cli {
    /// Read turns from this CSV file instead of Postgres
    #[arg(long, global = true)]
    dataset: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FilterArgs {
    /// Meeting to include (repeatable)
    #[arg(long = "meeting")]
    meetings: Vec<i64>,
    /// Speaker to include (repeatable)
    #[arg(long = "speaker")]
    speakers: Vec<i64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a small sample dataset
    Seed,
    /// Import turns from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Print the meeting dropdown options as JSON
    Meetings,
    /// Print the speaker dropdown options as JSON
    Speakers {
        /// Narrow speakers to these meetings (repeatable)
        #[arg(long = "meeting")]
        meetings: Vec<i64>,
    },
    /// Render the chart as Plotly figure JSON
    Chart {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, value_enum, default_value_t = ViewType::BySpeakers)]
        view: ViewType,
        /// Write the figure here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, default_value = "self-score-report.md")]
        out: PathBuf,
    },
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn connect() -> anyhow::Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set when no --dataset file is given")?;

    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")
}

async fn load_turns(csv_path: Option<&PathBuf>) -> anyhow::Result<Vec<TurnRecord>> {
    match csv_path {
        Some(path) => dataset::load_csv(path),
        None => {
            let pool = connect().await?;
            db::fetch_turns(&pool).await
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::InitDb => {
            let pool = connect().await?;
            db::init_db(&pool).await?;
            info!("schema ready");
        }
        Commands::Seed => {
            let pool = connect().await?;
            let inserted = db::seed(&pool).await?;
            info!(inserted, "seed data inserted");
        }
        Commands::Import { csv } => {
            let pool = connect().await?;
            let inserted = db::import_csv(&pool, &csv).await?;
            info!(inserted, path = %csv.display(), "imported turns");
        }
        Commands::Meetings => {
            let panel = SelfScorePanel::new(load_turns(cli.dataset.as_ref()).await?);
            println!("{}", serde_json::to_string_pretty(&panel.meeting_options())?);
        }
        Commands::Speakers { meetings } => {
            let panel = SelfScorePanel::new(load_turns(cli.dataset.as_ref()).await?);
            let meetings: BTreeSet<i64> = meetings.into_iter().collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&panel.speaker_options(&meetings))?
            );
        }
        Commands::Chart { filters, view, out } => {
            let panel = SelfScorePanel::new(load_turns(cli.dataset.as_ref()).await?);
            let selection = Selection::new(filters.meetings, filters.speakers, view);
            let figure = serde_json::to_string_pretty(&panel.render(&selection))?;

            match out {
                Some(path) => {
                    std::fs::write(&path, figure)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    info!(path = %path.display(), "figure written");
                }
                None => println!("{figure}"),
            }
        }
        Commands::Report { filters, out } => {
            let turns = load_turns(cli.dataset.as_ref()).await?;
            let selection = Selection::new(filters.meetings, filters.speakers, ViewType::default());
            let report = report::build_report(&turns, &selection, chrono::Utc::now().date_naive());
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            info!(path = %out.display(), "report written");
        }
    }

    Ok(())
}
