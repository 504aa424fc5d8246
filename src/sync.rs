//! Delta sync against an external ticket source.
//!
//! The board never talks to a mailbox or tracker itself: a `TicketSource`
//! hands it candidate tasks discovered since a given timestamp. This module
//! owns the sync metadata, the look-back window calculation, duplicate
//! resolution against the live board, and the batch commit.

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::scan::{self, TicketPattern};
use crate::task::{Priority, Quadrant, QuadrantChange, Task, TaskBoard, TaskOrigin, TaskStatus};

/// Look-back in days when no sync has ever run
pub const DEFAULT_INITIAL_SYNC_DAYS: i64 = 7;
/// Minimum look-back in hours for every later sync
pub const DEFAULT_SAFETY_NET_HOURS: i64 = 24;

/// Singleton describing the relationship with the external source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncMeta {
    /// Last attempted sync, successful or not
    #[serde(default)]
    pub last_sync_attempt: Option<DateTime<Utc>>,
    /// Last sync whose scan completed without error
    #[serde(default)]
    pub last_successful_sync: Option<DateTime<Utc>>,
    #[serde(default)]
    pub failed_sync_attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync_error: Option<String>,
    #[serde(default = "default_initial_sync_days")]
    pub initial_sync_days: i64,
    #[serde(default = "default_safety_net_hours")]
    pub safety_net_hours: i64,
    #[serde(default)]
    pub total_tasks_processed: u64,
    #[serde(default)]
    pub duplicates_resolved: u64,
}

fn default_initial_sync_days() -> i64 {
    DEFAULT_INITIAL_SYNC_DAYS
}

fn default_safety_net_hours() -> i64 {
    DEFAULT_SAFETY_NET_HOURS
}

impl Default for SyncMeta {
    fn default() -> Self {
        Self {
            last_sync_attempt: None,
            last_successful_sync: None,
            failed_sync_attempts: 0,
            last_sync_error: None,
            initial_sync_days: default_initial_sync_days(),
            safety_net_hours: default_safety_net_hours(),
            total_tasks_processed: 0,
            duplicates_resolved: 0,
        }
    }
}

impl SyncMeta {
    /// Fresh metadata seeded with the configured windows
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            initial_sync_days: config.initial_sync_days,
            safety_net_hours: config.safety_net_hours,
            ..Self::default()
        }
    }
}

/// Compute the "after" boundary for the next scan.
///
/// Never synced: look back `initial_sync_days`. Otherwise look back to the
/// last attempt, but always at least `safety_net_hours` so a missed or
/// partial previous sync cannot hide items.
pub fn next_sync_window(meta: &SyncMeta, now: DateTime<Utc>) -> DateTime<Utc> {
    match meta.last_sync_attempt {
        None => now - Duration::days(meta.initial_sync_days),
        Some(last_sync) => {
            let safety_net = now - Duration::hours(meta.safety_net_hours);
            last_sync.min(safety_net)
        }
    }
}

/// A candidate task yielded by a ticket source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketCandidate {
    pub ticket: String,
    pub subject: String,
    pub sender: String,
    /// Timestamp asserted by the source (e.g. the mail date header)
    pub origin_timestamp: DateTime<Utc>,
}

/// External discovery collaborator.
///
/// Implementations fail with `Error::Auth` or `Error::Transport`; the board
/// treats both as "sync failed, commit nothing, still record the attempt".
pub trait TicketSource {
    fn discover(&self, since: DateTime<Utc>) -> Result<Vec<TicketCandidate>>;
}

/// A captured mail message, as exported by a mailbox-scanning script
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailMessage {
    pub subject: String,
    pub sender: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub body: String,
}

/// Ticket source backed by a JSON file of captured mail messages.
///
/// Stands in for the mailbox collaborator: ticket keys are regex-matched
/// out of each message's subject and body, deduplicated across the whole
/// capture, and messages older than the window are skipped.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    pattern: TicketPattern,
}

impl FileSource {
    pub fn new(path: PathBuf, pattern: TicketPattern) -> Self {
        Self { path, pattern }
    }
}

impl TicketSource for FileSource {
    fn discover(&self, since: DateTime<Utc>) -> Result<Vec<TicketCandidate>> {
        let content = std::fs::read_to_string(&self.path).map_err(|err| {
            Error::Transport(format!("cannot read {}: {err}", self.path.display()))
        })?;
        let messages: Vec<MailMessage> = serde_json::from_str(&content).map_err(|err| {
            Error::Transport(format!("malformed capture {}: {err}", self.path.display()))
        })?;

        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        for message in messages {
            if message.date < since {
                continue;
            }
            let text = format!("{} {}", message.subject, message.body);
            for ticket in self.pattern.extract(&text) {
                if seen.insert(ticket.clone()) {
                    candidates.push(TicketCandidate {
                        ticket,
                        subject: message.subject.clone(),
                        sender: message.sender.clone(),
                        origin_timestamp: message.date,
                    });
                }
            }
        }

        tracing::debug!(count = candidates.len(), "candidates discovered from capture");
        Ok(candidates)
    }
}

/// Outcome of one candidate batch
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub added: Vec<Task>,
    pub duplicates_resolved: Vec<String>,
    pub total_processed: usize,
}

/// Outcome of one full sync run
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub window_start: DateTime<Utc>,
    pub discovered: usize,
    pub added: Vec<Task>,
    pub duplicates_resolved: Vec<String>,
}

impl TaskBoard {
    /// Active tasks sharing an external ticket id
    pub fn find_duplicates(&self, ticket: &str) -> Result<Vec<Task>> {
        let tasks = self.store().read_tasks()?;
        Ok(tasks
            .into_iter()
            .filter(|task| task.is_active() && task.ticket.as_deref() == Some(ticket))
            .collect())
    }

    /// Resolve and insert a batch of discovered candidates.
    ///
    /// Candidates are processed in order against the live working set: a
    /// candidate whose origin timestamp is strictly later than every active
    /// task with the same ticket replaces them; equal or earlier candidates
    /// are discarded. The whole batch is committed with a single bucket
    /// write, so a failed sync commits nothing.
    pub fn add_batch(&self, candidates: &[TicketCandidate]) -> Result<BatchReport> {
        let _guard = self.store().lock()?;
        let mut tasks = self.store().read_tasks()?;
        let now = Utc::now();

        let mut added_ids: Vec<String> = Vec::new();
        let mut duplicates_resolved: Vec<String> = Vec::new();

        for candidate in candidates {
            let existing: Vec<usize> = tasks
                .iter()
                .enumerate()
                .filter(|(_, task)| {
                    task.is_active() && task.ticket.as_deref() == Some(candidate.ticket.as_str())
                })
                .map(|(index, _)| index)
                .collect();

            if !existing.is_empty() {
                let newest = existing
                    .iter()
                    .map(|&index| tasks[index].sync_origin_timestamp)
                    .max()
                    .expect("non-empty duplicate set");

                // Strict greater-than: equal timestamps keep the existing task
                if candidate.origin_timestamp <= newest {
                    continue;
                }

                for &index in existing.iter().rev() {
                    let removed = tasks.remove(index);
                    added_ids.retain(|id| id != &removed.id);
                }
                duplicates_resolved.push(candidate.ticket.clone());
            }

            let task = candidate_task(candidate, now);
            added_ids.push(task.id.clone());
            tasks.push(task);
        }

        self.store().write_tasks(&tasks)?;

        if !duplicates_resolved.is_empty() {
            let mut meta = self.store().read_sync_meta()?;
            meta.duplicates_resolved += duplicates_resolved.len() as u64;
            self.store().write_sync_meta(&meta)?;
        }

        let added = tasks
            .iter()
            .filter(|task| added_ids.contains(&task.id))
            .cloned()
            .collect();
        Ok(BatchReport {
            added,
            duplicates_resolved,
            total_processed: candidates.len(),
        })
    }
}

/// Build an uncategorized board task from a discovered candidate
fn candidate_task(candidate: &TicketCandidate, now: DateTime<Utc>) -> Task {
    let mut title = scan::candidate_title(&candidate.subject);
    if title.is_empty() {
        title = candidate.ticket.clone();
    }

    Task {
        id: Ulid::new().to_string(),
        title,
        origin: TaskOrigin::Jira,
        source: TaskOrigin::Jira.as_str().to_string(),
        ticket: Some(candidate.ticket.clone()),
        quadrant: Quadrant::Uncategorized,
        priority: Priority::Medium,
        status: TaskStatus::Active,
        date_created: now,
        date_updated: now,
        date_completed: None,
        sync_origin_timestamp: candidate.origin_timestamp,
        last_synced_at: Some(now),
        history: vec![QuadrantChange {
            quadrant: Quadrant::Uncategorized,
            timestamp: now,
        }],
    }
}

/// Run one sync: compute the window, discover, resolve, commit, and record
/// the attempt in the sync metadata.
///
/// On `Auth`/`Transport` failure nothing is committed, but the attempt is
/// still recorded so the window calculator does not get stuck.
pub fn run_sync<S: TicketSource>(board: &TaskBoard, source: &S) -> Result<SyncReport> {
    let store = board.store();
    let mut meta = store.read_sync_meta()?;
    let now = Utc::now();
    let window_start = next_sync_window(&meta, now);

    tracing::info!(%window_start, "sync started");
    match source.discover(window_start) {
        Ok(candidates) => {
            let report = board.add_batch(&candidates)?;

            // Re-read: the batch already accumulated resolved duplicates
            let mut meta = store.read_sync_meta()?;
            meta.last_sync_attempt = Some(now);
            meta.last_successful_sync = Some(now);
            meta.failed_sync_attempts = 0;
            meta.last_sync_error = None;
            meta.total_tasks_processed += report.total_processed as u64;
            store.write_sync_meta(&meta)?;

            tracing::info!(
                discovered = report.total_processed,
                added = report.added.len(),
                resolved = report.duplicates_resolved.len(),
                "sync finished"
            );
            Ok(SyncReport {
                window_start,
                discovered: report.total_processed,
                added: report.added,
                duplicates_resolved: report.duplicates_resolved,
            })
        }
        Err(err) if err.is_sync_failure() => {
            meta.last_sync_attempt = Some(now);
            meta.failed_sync_attempts += 1;
            meta.last_sync_error = Some(err.to_string());
            store.write_sync_meta(&meta)?;

            tracing::warn!(error = %err, "sync failed");
            Err(err)
        }
        Err(err) => Err(err),
    }
}
