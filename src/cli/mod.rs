//! Command-line interface for triage
//!
//! This module defines the CLI structure using clap derive macros.
//! Each command family is implemented in its own submodule.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::error::Result;
use crate::store::RecordStore;
use crate::task::TaskBoard;

mod board;
mod data;
mod stats;
mod sync;

/// triage - an Eisenhower-matrix task board
///
/// Tasks land uncategorized (added by hand or imported from a ticket
/// source), get triaged into quadrants, and move through complete/archive.
#[derive(Parser, Debug)]
#[command(name = "triage")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory for the board (defaults to the per-user data dir)
    #[arg(long, global = true, env = "TRIAGE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a task to the board
    Add {
        /// Task title
        title: String,

        /// How the task entered the system: manual, jira, braindump
        #[arg(long, default_value = "manual")]
        origin: String,

        /// Display label for the source (defaults to the origin)
        #[arg(long)]
        source: Option<String>,

        /// External ticket key (e.g. BDC-123)
        #[arg(long)]
        ticket: Option<String>,

        /// Quadrant: uncategorized, q1, q2, q3, q4
        #[arg(long, default_value = "uncategorized")]
        quadrant: String,

        /// Priority: high, medium, low
        #[arg(long, default_value = "medium")]
        priority: String,
    },

    /// List tasks on the board
    List {
        /// Restrict to one quadrant
        #[arg(long)]
        quadrant: Option<String>,

        /// Include completed tasks
        #[arg(long)]
        all: bool,
    },

    /// Edit task fields
    Edit {
        /// Task id (unique prefixes accepted)
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        source: Option<String>,

        /// Set the external ticket key
        #[arg(long)]
        ticket: Option<String>,
    },

    /// Move a task into a quadrant
    Categorize {
        /// Task id (unique prefixes accepted)
        id: String,

        /// Quadrant: uncategorized, q1, q2, q3, q4
        quadrant: String,

        /// Priority: high, medium, low
        #[arg(long, default_value = "medium")]
        priority: String,
    },

    /// Mark a task completed
    Complete {
        /// Task id (unique prefixes accepted)
        id: String,
    },

    /// Move a task from the board into the archive
    Archive {
        /// Task id (unique prefixes accepted)
        id: String,

        /// Why the task is being archived
        #[arg(long, default_value = "manual")]
        reason: String,
    },

    /// Delete a task outright
    Delete {
        /// Task id (unique prefixes accepted)
        id: String,
    },

    /// Show board statistics
    Stats,

    /// Sync with the external ticket source
    #[command(subcommand)]
    Sync(SyncCommands),

    /// Store maintenance (export, import, reset)
    #[command(subcommand)]
    Data(DataCommands),
}

/// Sync subcommands
#[derive(Subcommand, Debug)]
pub enum SyncCommands {
    /// Run a sync from a mail capture file
    Run {
        /// JSON file of captured mail messages
        #[arg(long)]
        from: PathBuf,
    },

    /// Print the look-back boundary the next sync would use
    Window,

    /// Show sync metadata
    Status,
}

/// Data maintenance subcommands
#[derive(Subcommand, Debug)]
pub enum DataCommands {
    /// Export the whole store as a snapshot
    Export {
        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Replace the whole store from a snapshot
    Import {
        /// Snapshot file produced by `triage data export`
        file: PathBuf,
    },

    /// Reset every bucket to its defaults
    Reset {
        /// Confirm the reset
        #[arg(long)]
        force: bool,
    },
}

/// Shared handles loaded by every command
pub(crate) struct Context {
    pub config: Config,
    pub board: TaskBoard,
}

/// Open (and seed, on first run) the store behind the board
pub(crate) fn load_context(data_dir: Option<PathBuf>) -> Result<Context> {
    let store = match data_dir {
        Some(dir) => RecordStore::new(dir),
        None => RecordStore::open_default()?,
    };
    let config = Config::load_from_dir(store.data_dir());
    store.init_all(&config)?;
    Ok(Context {
        board: TaskBoard::new(store),
        config,
    })
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Add {
                title,
                origin,
                source,
                ticket,
                quadrant,
                priority,
            } => board::run_add(board::AddOptions {
                title,
                origin,
                source,
                ticket,
                quadrant,
                priority,
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::List { quadrant, all } => board::run_list(board::ListOptions {
                quadrant,
                all,
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Edit {
                id,
                title,
                source,
                ticket,
            } => board::run_edit(board::EditOptions {
                id,
                title,
                source,
                ticket,
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Categorize {
                id,
                quadrant,
                priority,
            } => board::run_categorize(board::CategorizeOptions {
                id,
                quadrant,
                priority,
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Complete { id } => board::run_complete(board::CompleteOptions {
                id,
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Archive { id, reason } => board::run_archive(board::ArchiveOptions {
                id,
                reason,
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Delete { id } => board::run_delete(board::DeleteOptions {
                id,
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Stats => stats::run(stats::StatsOptions {
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Sync(cmd) => match cmd {
                SyncCommands::Run { from } => sync::run_sync(sync::RunOptions {
                    from,
                    data_dir: self.data_dir,
                    json: self.json,
                    quiet: self.quiet,
                }),
                SyncCommands::Window => sync::run_window(sync::WindowOptions {
                    data_dir: self.data_dir,
                    json: self.json,
                    quiet: self.quiet,
                }),
                SyncCommands::Status => sync::run_status(sync::StatusOptions {
                    data_dir: self.data_dir,
                    json: self.json,
                    quiet: self.quiet,
                }),
            },
            Commands::Data(cmd) => match cmd {
                DataCommands::Export { out } => data::run_export(data::ExportOptions {
                    out,
                    data_dir: self.data_dir,
                    json: self.json,
                    quiet: self.quiet,
                }),
                DataCommands::Import { file } => data::run_import(data::ImportOptions {
                    file,
                    data_dir: self.data_dir,
                    json: self.json,
                    quiet: self.quiet,
                }),
                DataCommands::Reset { force } => data::run_reset(data::ResetOptions {
                    force,
                    data_dir: self.data_dir,
                    json: self.json,
                    quiet: self.quiet,
                }),
            },
        }
    }
}
