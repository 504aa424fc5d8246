//! Read-only statistics over the board.
//!
//! Everything here is recomputed from store state on each call; at the
//! expected data volumes (tens to low thousands of tasks) a projection per
//! read is cheaper than keeping caches coherent.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::task::{Quadrant, TaskBoard};

/// Active count and share of the active total for one quadrant
#[derive(Debug, Clone, Copy, Serialize)]
pub struct QuadrantStats {
    pub count: usize,
    /// Percentage of all active tasks, rounded independently per quadrant;
    /// the four shares need not sum to exactly 100.
    pub percent: u32,
}

/// Progress toward the Q2 completion reward
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RewardProgress {
    pub count: u64,
    pub milestone: u64,
    pub earned: u64,
    pub progress_to_next: u64,
}

impl RewardProgress {
    pub fn new(count: u64, milestone: u64) -> Self {
        Self {
            count,
            milestone,
            earned: count / milestone,
            progress_to_next: count % milestone,
        }
    }

    /// Milestone banner; flips to "earned" exactly at each full milestone
    pub fn message(&self) -> String {
        if self.count > 0 && self.count % self.milestone == 0 {
            "Reward earned!".to_string()
        } else {
            format!(
                "{} more Q2 completions to the next reward",
                self.milestone - self.count % self.milestone
            )
        }
    }
}

/// Snapshot of board health
#[derive(Debug, Clone, Serialize)]
pub struct BoardStats {
    pub calculated_at: DateTime<Utc>,
    pub active_total: usize,
    pub uncategorized: usize,
    pub q1: QuadrantStats,
    pub q2: QuadrantStats,
    pub q3: QuadrantStats,
    pub q4: QuadrantStats,
    pub completed_today: usize,
    pub archived_total: usize,
    pub archived_last_7_days: usize,
    pub reward: RewardProgress,
}

fn percent(count: usize, total: usize) -> u32 {
    if total == 0 {
        0
    } else {
        ((count as f64 / total as f64) * 100.0).round() as u32
    }
}

/// Project current counts, shares, and reward progress from store state
pub fn compute_stats(board: &TaskBoard, q2_milestone: u64) -> Result<BoardStats> {
    let tasks = board.list_all()?;
    let archived = board.archived()?;
    let now = Utc::now();

    let active: Vec<_> = tasks.iter().filter(|task| task.is_active()).collect();
    let total = active.len();
    let count_in = |quadrant: Quadrant| active.iter().filter(|t| t.quadrant == quadrant).count();

    let q1 = count_in(Quadrant::Q1);
    let q2 = count_in(Quadrant::Q2);
    let q3 = count_in(Quadrant::Q3);
    let q4 = count_in(Quadrant::Q4);

    let completed_today = tasks
        .iter()
        .filter_map(|task| task.date_completed)
        .filter(|done| done.date_naive() == now.date_naive())
        .count();

    let week_ago = now - Duration::days(7);
    let archived_last_7_days = archived
        .iter()
        .filter(|entry| entry.date_archived > week_ago)
        .count();

    Ok(BoardStats {
        calculated_at: now,
        active_total: total,
        uncategorized: count_in(Quadrant::Uncategorized),
        q1: QuadrantStats {
            count: q1,
            percent: percent(q1, total),
        },
        q2: QuadrantStats {
            count: q2,
            percent: percent(q2, total),
        },
        q3: QuadrantStats {
            count: q3,
            percent: percent(q3, total),
        },
        q4: QuadrantStats {
            count: q4,
            percent: percent(q4, total),
        },
        completed_today,
        archived_total: archived.len(),
        archived_last_7_days,
        reward: RewardProgress::new(board.q2_count()?, q2_milestone),
    })
}
