//! Main CLI application structure

use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::output::{Output, OutputFormat};
use super::{item, query};
use crate::storage::{Config, Project};

#[derive(Parser)]
#[command(name = "wbs")]
#[command(author, version, about = "Hierarchical work breakdown structures with progress and timelines")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (falls back to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new wbs project
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,

        /// Project name (defaults to the directory name)
        #[arg(long)]
        name: Option<String>,
    },

    /// Manage work items
    #[command(subcommand)]
    Item(item::ItemCommands),

    /// Show the work breakdown as a tree
    Tree,

    /// Show rolled-up progress for one item or the whole project
    Progress {
        /// Work item ID (omit for all items)
        id: Option<String>,
    },

    /// Show the timeline (Gantt) layout
    Timeline {
        /// Collapse an item, hiding its descendants (repeatable)
        #[arg(long)]
        collapse: Vec<String>,

        /// Reference date for the today marker (YYYY-MM-DD)
        #[arg(long)]
        today: Option<NaiveDate>,
    },
}

/// Installs the stderr log subscriber.
///
/// `--verbose` forces debug output for this crate; otherwise `RUST_LOG`
/// applies, defaulting to warnings only.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("wbs_engine=debug")
    } else {
        EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| "wbs_engine=warn".into()))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let format = match cli.format {
        Some(format) => format,
        None => Config::load_global_only()?.global.default_format.into(),
    };
    let output = Output::new(format);

    match cli.command {
        Commands::Init { path, name } => init(&output, &path, name.as_deref())?,
        Commands::Item(cmd) => item::run(cmd, &output)?,
        Commands::Tree => query::tree(&output)?,
        Commands::Progress { id } => query::progress(&output, id.as_deref())?,
        Commands::Timeline { collapse, today } => query::timeline(&output, &collapse, today)?,
    }

    tracing::debug!("command completed");
    Ok(())
}

fn init(output: &Output, path: &str, name: Option<&str>) -> Result<()> {
    let root = Path::new(path);
    let default_name = root
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "project".to_string());
    let name = name.unwrap_or(&default_name);

    let project = Project::init(root, name)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "id": project.id(),
            "name": project.name(),
            "root": project.root().display().to_string(),
        }))?;
    } else {
        output.success(&format!(
            "Initialized wbs project {} ({}) at {}",
            project.name(),
            project.id(),
            project.root().display()
        ));
    }

    Ok(())
}
