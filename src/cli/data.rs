//! Data maintenance command implementations (export/import/reset).

use std::path::PathBuf;

use serde::Serialize;

use crate::cli::load_context;
use crate::error::{Error, Result};
use crate::lock;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::store::Snapshot;

pub struct ExportOptions {
    pub out: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ImportOptions {
    pub file: PathBuf,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ResetOptions {
    pub force: bool,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub fn run_export(options: ExportOptions) -> Result<()> {
    let ctx = load_context(options.data_dir)?;
    let snapshot = ctx.board.store().export_all()?;

    match options.out {
        Some(path) => {
            let json = serde_json::to_string_pretty(&snapshot)?;
            lock::write_atomic_str(&path, &json)?;

            #[derive(Serialize)]
            struct ExportOutput {
                path: PathBuf,
                tasks: usize,
                archived: usize,
            }

            let mut human = HumanOutput::new("Store exported");
            human.push_summary("File", path.display().to_string());
            human.push_summary("Tasks", snapshot.tasks.len().to_string());
            human.push_summary("Archived", snapshot.archived.len().to_string());

            emit_success(
                OutputOptions {
                    json: options.json,
                    quiet: options.quiet,
                },
                "data export",
                &ExportOutput {
                    path,
                    tasks: snapshot.tasks.len(),
                    archived: snapshot.archived.len(),
                },
                Some(&human),
            )
        }
        None => {
            // The snapshot itself is the output, regardless of --json
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            Ok(())
        }
    }
}

pub fn run_import(options: ImportOptions) -> Result<()> {
    let ctx = load_context(options.data_dir)?;

    let content = std::fs::read_to_string(&options.file)?;
    let snapshot: Snapshot = serde_json::from_str(&content)?;
    ctx.board.store().import_all(&snapshot)?;

    #[derive(Serialize)]
    struct ImportOutput {
        tasks: usize,
        archived: usize,
        q2_count: u64,
    }

    let mut human = HumanOutput::new("Store imported");
    human.push_summary("Tasks", snapshot.tasks.len().to_string());
    human.push_summary("Archived", snapshot.archived.len().to_string());
    human.push_summary("Q2 count", snapshot.q2_count.to_string());

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "data import",
        &ImportOutput {
            tasks: snapshot.tasks.len(),
            archived: snapshot.archived.len(),
            q2_count: snapshot.q2_count,
        },
        Some(&human),
    )
}

pub fn run_reset(options: ResetOptions) -> Result<()> {
    if !options.force {
        return Err(Error::InvalidArgument(
            "reset discards every task, the archive, and all counters; pass --force to confirm"
                .to_string(),
        ));
    }

    let ctx = load_context(options.data_dir)?;
    ctx.board.store().reset_all(&ctx.config)?;

    #[derive(Serialize)]
    struct ResetOutput {
        reset: bool,
    }

    let human = HumanOutput::new("Store reset to defaults");

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "data reset",
        &ResetOutput { reset: true },
        Some(&human),
    )
}
