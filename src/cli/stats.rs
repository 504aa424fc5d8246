//! Stats command implementation.

use std::path::PathBuf;

use crate::cli::load_context;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::stats::compute_stats;

pub struct StatsOptions {
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub fn run(options: StatsOptions) -> Result<()> {
    let ctx = load_context(options.data_dir)?;
    let stats = compute_stats(&ctx.board, ctx.config.rewards.q2_milestone)?;

    let mut human = HumanOutput::new("Board stats");
    human.push_summary("Active tasks", stats.active_total.to_string());
    human.push_summary("Uncategorized", stats.uncategorized.to_string());
    human.push_summary(
        "Q1 urgent+important",
        format!("{} ({}%)", stats.q1.count, stats.q1.percent),
    );
    human.push_summary(
        "Q2 important",
        format!("{} ({}%)", stats.q2.count, stats.q2.percent),
    );
    human.push_summary(
        "Q3 urgent",
        format!("{} ({}%)", stats.q3.count, stats.q3.percent),
    );
    human.push_summary(
        "Q4 neither",
        format!("{} ({}%)", stats.q4.count, stats.q4.percent),
    );
    human.push_summary("Completed today", stats.completed_today.to_string());
    human.push_summary(
        "Archived (7 days)",
        format!("{} of {}", stats.archived_last_7_days, stats.archived_total),
    );
    human.push_detail(format!(
        "Q2 reward progress: {}/{} ({})",
        stats.reward.progress_to_next,
        stats.reward.milestone,
        stats.reward.message()
    ));

    // Warning threshold matches the dashboard's Q1 overload banner
    if stats.q1.percent > 75 {
        human.push_warning("over 75% of active tasks are urgent+important".to_string());
        human.push_next_step("move non-urgent work into Q2 before adding more".to_string());
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "stats",
        &stats,
        Some(&human),
    )
}
