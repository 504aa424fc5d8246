//! Sync command implementations.

use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;

use crate::cli::load_context;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::sync::{self, FileSource, SyncMeta};

pub struct RunOptions {
    pub from: PathBuf,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct WindowOptions {
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct StatusOptions {
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub fn run_sync(options: RunOptions) -> Result<()> {
    let ctx = load_context(options.data_dir)?;
    let source = FileSource::new(options.from, ctx.config.ticket_pattern()?);

    let report = sync::run_sync(&ctx.board, &source)?;

    let mut human = HumanOutput::new("Sync finished");
    human.push_summary("Window start", report.window_start.to_rfc3339());
    human.push_summary("Candidates", report.discovered.to_string());
    human.push_summary("Added", report.added.len().to_string());
    human.push_summary(
        "Duplicates resolved",
        report.duplicates_resolved.len().to_string(),
    );
    for task in &report.added {
        human.push_detail(format!("{} {}", task.id, task.title));
    }
    if !report.added.is_empty() {
        human.push_next_step("triage list --quadrant uncategorized".to_string());
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "sync run",
        &report,
        Some(&human),
    )
}

pub fn run_window(options: WindowOptions) -> Result<()> {
    let ctx = load_context(options.data_dir)?;
    let meta = ctx.board.store().read_sync_meta()?;
    let window_start = sync::next_sync_window(&meta, Utc::now());

    #[derive(Serialize)]
    struct WindowOutput {
        window_start: chrono::DateTime<Utc>,
        initial_sync_days: i64,
        safety_net_hours: i64,
    }

    let mut human = HumanOutput::new("Next sync window");
    human.push_summary("Scan after", window_start.to_rfc3339());
    human.push_summary("Initial window (days)", meta.initial_sync_days.to_string());
    human.push_summary("Safety net (hours)", meta.safety_net_hours.to_string());

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "sync window",
        &WindowOutput {
            window_start,
            initial_sync_days: meta.initial_sync_days,
            safety_net_hours: meta.safety_net_hours,
        },
        Some(&human),
    )
}

pub fn run_status(options: StatusOptions) -> Result<()> {
    let ctx = load_context(options.data_dir)?;
    let meta: SyncMeta = ctx.board.store().read_sync_meta()?;

    let mut human = HumanOutput::new("Sync status");
    human.push_summary(
        "Last attempt",
        meta.last_sync_attempt
            .map(|ts| ts.to_rfc3339())
            .unwrap_or_else(|| "never".to_string()),
    );
    human.push_summary(
        "Last success",
        meta.last_successful_sync
            .map(|ts| ts.to_rfc3339())
            .unwrap_or_else(|| "never".to_string()),
    );
    human.push_summary("Failed attempts", meta.failed_sync_attempts.to_string());
    human.push_summary("Tasks processed", meta.total_tasks_processed.to_string());
    human.push_summary("Duplicates resolved", meta.duplicates_resolved.to_string());
    if let Some(error) = meta.last_sync_error.as_deref() {
        human.push_warning(format!("last sync failed: {error}"));
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "sync status",
        &meta,
        Some(&human),
    )
}
