use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod config;
mod db;
mod models;
mod policy;
mod report;
mod store;

use config::Settings;
use models::{Delta, Field, Threshold, Update};
use store::SubjectStore;

#[derive(Parser)]
#[command(name = "attendance-tracker")]
#[command(about = "Track class attendance against a minimum requirement", long_about = None)]
struct Cli {
    #[command(flatten)]
    settings: Settings,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the Postgres schema
    InitDb,
    /// Start tracking a subject
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "75")]
        min_percent: String,
    },
    /// Show every subject with its status
    List,
    /// Record an attended class
    Attend { index: usize },
    /// Record a missed class
    Miss { index: usize },
    /// Take back an attended class
    UndoAttend { index: usize },
    /// Take back a missed class
    UndoMiss { index: usize },
    /// Stop tracking a subject
    Remove { index: usize },
    /// Change a subject's name
    Rename {
        index: usize,
        #[arg(long)]
        name: String,
    },
    /// Change a subject's minimum percentage
    Goal {
        index: usize,
        #[arg(long)]
        min_percent: String,
    },
    /// Evaluate counts without touching stored subjects
    Check {
        attended: u32,
        missed: u32,
        #[arg(long, default_value = "75")]
        min_percent: String,
    },
    /// Generate a markdown report
    Report {
        #[arg(long, default_value = "attendance-report.md")]
        out: PathBuf,
    },
    /// Add subjects from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Write subjects to a CSV file
    Export {
        #[arg(long)]
        csv: PathBuf,
    },
}

/// Users address subjects from 1; the store is 0-based.
fn to_index(position: usize) -> anyhow::Result<usize> {
    position
        .checked_sub(1)
        .context("subject numbers start at 1")
}

fn parse_goal(raw: &str) -> anyhow::Result<Threshold> {
    raw.parse::<Threshold>()
        .with_context(|| format!("invalid minimum percentage {raw:?} (expected 0-100)"))
}

/// Applies one counter change and persists it. The card is only returned
/// once the save succeeded.
async fn commit_update(
    store: &mut SubjectStore,
    position: usize,
    field: Field,
    delta: Delta,
) -> anyhow::Result<String> {
    let update = Update {
        index: to_index(position)?,
        field,
        delta,
    };
    let card = report::render_card(position, store.apply(update)?);
    store.save().await?;
    Ok(card)
}

async fn apply_update(
    settings: &Settings,
    position: usize,
    field: Field,
    delta: Delta,
) -> anyhow::Result<()> {
    let mut store = SubjectStore::load(settings.backend().await?).await?;
    let card = commit_update(&mut store, position, field, delta).await?;
    println!("{card}");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = cli.settings;

    match cli.command {
        Commands::InitDb => {
            let pool = settings.connect_pool().await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Add { name, min_percent } => {
            let goal = parse_goal(&min_percent)?;
            let mut store = SubjectStore::load(settings.backend().await?).await?;
            let subject = store.add(&name, goal)?;
            let confirmation = format!("Tracking {} (goal {}).", subject.name, subject.min_percentage);
            store.save().await?;
            println!("{confirmation}");
        }
        Commands::List => {
            let store = SubjectStore::load(settings.backend().await?).await?;
            println!("{}", report::render_list(store.subjects()));
        }
        Commands::Attend { index } => {
            apply_update(&settings, index, Field::Attended, Delta::Increment).await?;
        }
        Commands::Miss { index } => {
            apply_update(&settings, index, Field::Missed, Delta::Increment).await?;
        }
        Commands::UndoAttend { index } => {
            apply_update(&settings, index, Field::Attended, Delta::Decrement).await?;
        }
        Commands::UndoMiss { index } => {
            apply_update(&settings, index, Field::Missed, Delta::Decrement).await?;
        }
        Commands::Remove { index } => {
            let mut store = SubjectStore::load(settings.backend().await?).await?;
            let removed = store.remove(to_index(index)?)?;
            store.save().await?;
            println!("Removed {}.", removed.name);
        }
        Commands::Rename { index, name } => {
            let mut store = SubjectStore::load(settings.backend().await?).await?;
            let card = report::render_card(index, store.rename(to_index(index)?, &name)?);
            store.save().await?;
            println!("{card}");
        }
        Commands::Goal { index, min_percent } => {
            let goal = parse_goal(&min_percent)?;
            let mut store = SubjectStore::load(settings.backend().await?).await?;
            let card = report::render_card(index, store.set_goal(to_index(index)?, goal)?);
            store.save().await?;
            println!("{card}");
        }
        Commands::Check {
            attended,
            missed,
            min_percent,
        } => {
            let goal = parse_goal(&min_percent)?;
            let assessment = policy::assess(attended, missed, goal);
            println!(
                "{}: {:.1}% (Goal: {}). {}",
                assessment.status.as_str(),
                assessment.current_percent,
                goal,
                report::recommendation_message(&assessment)
            );
        }
        Commands::Report { out } => {
            let store = SubjectStore::load(settings.backend().await?).await?;
            let report = report::build_report(store.subjects(), Utc::now());
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Import { csv } => {
            let subjects = db::read_csv(&csv)?;
            let mut store = SubjectStore::load(settings.backend().await?).await?;
            let inserted = store.extend(subjects);
            store.save().await?;
            println!("Imported {inserted} subjects from {}.", csv.display());
        }
        Commands::Export { csv } => {
            let store = SubjectStore::load(settings.backend().await?).await?;
            let written = db::write_csv(&csv, store.subjects())?;
            println!("Exported {written} subjects to {}.", csv.display());
        }
    }

    Ok(())
}
