//! Task records and the board repository.
//!
//! Tasks live in the `tasks` bucket until archived; the board owns id
//! generation, field defaults, lifecycle stamping, and the archive
//! transition into the `archived` bucket.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::{Error, Result};
use crate::store::RecordStore;

/// Eisenhower quadrant of a task. `Uncategorized` is the entry state; every
/// imported or newly added task starts there until the user triages it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quadrant {
    Uncategorized,
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quadrant {
    pub const ALL: [Quadrant; 5] = [
        Quadrant::Uncategorized,
        Quadrant::Q1,
        Quadrant::Q2,
        Quadrant::Q3,
        Quadrant::Q4,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Quadrant::Uncategorized => "uncategorized",
            Quadrant::Q1 => "q1",
            Quadrant::Q2 => "q2",
            Quadrant::Q3 => "q3",
            Quadrant::Q4 => "q4",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "uncategorized" => Ok(Quadrant::Uncategorized),
            "q1" => Ok(Quadrant::Q1),
            "q2" => Ok(Quadrant::Q2),
            "q3" => Ok(Quadrant::Q3),
            "q4" => Ok(Quadrant::Q4),
            other => Err(Error::InvalidArgument(format!(
                "unknown quadrant '{other}' (expected uncategorized|q1|q2|q3|q4)"
            ))),
        }
    }

    pub fn is_categorized(&self) -> bool {
        !matches!(self, Quadrant::Uncategorized)
    }
}

impl std::fmt::Display for Quadrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task priority within a quadrant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(Error::InvalidArgument(format!(
                "unknown priority '{other}' (expected high|medium|low)"
            ))),
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a task entered the system. Immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskOrigin {
    #[default]
    Manual,
    Jira,
    Braindump,
}

impl TaskOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskOrigin::Manual => "manual",
            TaskOrigin::Jira => "jira",
            TaskOrigin::Braindump => "braindump",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "manual" => Ok(TaskOrigin::Manual),
            "jira" => Ok(TaskOrigin::Jira),
            "braindump" => Ok(TaskOrigin::Braindump),
            other => Err(Error::InvalidArgument(format!(
                "unknown origin '{other}' (expected manual|jira|braindump)"
            ))),
        }
    }
}

impl std::fmt::Display for TaskOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task lifecycle status. `Active -> Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Active,
    Completed,
}

/// One quadrant transition in a task's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuadrantChange {
    pub quadrant: Quadrant,
    pub timestamp: DateTime<Utc>,
}

/// A unit of tracked work on the live board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub origin: TaskOrigin,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket: Option<String>,
    pub quadrant: Quadrant,
    pub priority: Priority,
    pub status: TaskStatus,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_completed: Option<DateTime<Utc>>,
    /// Timestamp asserted by the external source at discovery time; used for
    /// duplicate tie-breaking, not the local creation time.
    pub sync_origin_timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<QuadrantChange>,
}

impl Task {
    pub fn is_active(&self) -> bool {
        self.status == TaskStatus::Active
    }
}

/// A task moved out of the live set. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchivedTask {
    #[serde(flatten)]
    pub task: Task,
    pub date_archived: DateTime<Utc>,
    pub archive_reason: String,
    pub original_quadrant: Quadrant,
    /// Milliseconds between the last update and archival, clamped to >= 0
    pub time_in_quadrant_ms: i64,
}

/// Request for creating a task
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub origin: TaskOrigin,
    pub source: String,
    pub ticket: Option<String>,
    pub quadrant: Quadrant,
    pub priority: Priority,
    /// Defaults to the creation time when the task did not come from a sync
    pub sync_origin_timestamp: Option<DateTime<Utc>>,
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl NewTask {
    pub fn manual(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            origin: TaskOrigin::Manual,
            source: TaskOrigin::Manual.as_str().to_string(),
            ticket: None,
            quadrant: Quadrant::Uncategorized,
            priority: Priority::Medium,
            sync_origin_timestamp: None,
            last_synced_at: None,
        }
    }
}

/// Allow-list of mutable task fields for `update`.
///
/// `id`, `origin`, and `date_created` are deliberately not representable
/// here; `date_updated` is re-stamped on every call regardless of which
/// fields changed.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub source: Option<String>,
    /// `Some(None)` clears the ticket
    pub ticket: Option<Option<String>>,
    pub quadrant: Option<Quadrant>,
    pub priority: Option<Priority>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.source.is_none()
            && self.ticket.is_none()
            && self.quadrant.is_none()
            && self.priority.is_none()
    }
}

/// Repository over the live tasks bucket, the archive bucket, and the Q2
/// completion counter.
#[derive(Debug, Clone)]
pub struct TaskBoard {
    store: RecordStore,
}

impl TaskBoard {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    // =========================================================================
    // CRUD
    // =========================================================================

    /// Create a task and persist it
    pub fn create(&self, new: NewTask) -> Result<Task> {
        let title = new.title.trim().to_string();
        if title.is_empty() {
            return Err(Error::Validation("task title cannot be empty".to_string()));
        }

        let _guard = self.store.lock()?;
        let mut tasks = self.store.read_tasks()?;

        if let Some(ticket) = new.ticket.as_deref() {
            if tasks
                .iter()
                .any(|task| task.is_active() && task.ticket.as_deref() == Some(ticket))
            {
                return Err(Error::Validation(format!(
                    "an active task already tracks ticket {ticket}"
                )));
            }
        }

        let now = Utc::now();
        let task = Task {
            id: Ulid::new().to_string(),
            title,
            origin: new.origin,
            source: new.source,
            ticket: new.ticket,
            quadrant: new.quadrant,
            priority: new.priority,
            status: TaskStatus::Active,
            date_created: now,
            date_updated: now,
            date_completed: None,
            sync_origin_timestamp: new.sync_origin_timestamp.unwrap_or(now),
            last_synced_at: new.last_synced_at,
            history: vec![QuadrantChange {
                quadrant: new.quadrant,
                timestamp: now,
            }],
        };

        tasks.push(task.clone());
        self.store.write_tasks(&tasks)?;
        tracing::debug!(id = %task.id, "task created");
        Ok(task)
    }

    /// Merge a patch into an existing task.
    ///
    /// `date_updated` is always re-stamped; a quadrant change is appended to
    /// the task's history.
    pub fn update(&self, id: &str, patch: TaskPatch) -> Result<Task> {
        let _guard = self.store.lock()?;
        let mut tasks = self.store.read_tasks()?;
        let task = tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;

        let now = Utc::now();
        if let Some(title) = patch.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(Error::Validation("task title cannot be empty".to_string()));
            }
            task.title = title;
        }
        if let Some(source) = patch.source {
            task.source = source;
        }
        if let Some(ticket) = patch.ticket {
            task.ticket = ticket;
        }
        if let Some(quadrant) = patch.quadrant {
            if quadrant != task.quadrant {
                task.history.push(QuadrantChange {
                    quadrant,
                    timestamp: now,
                });
            }
            task.quadrant = quadrant;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        task.date_updated = now;

        let updated = task.clone();
        self.store.write_tasks(&tasks)?;
        Ok(updated)
    }

    /// Delete a task. Returns true when a record was removed.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let _guard = self.store.lock()?;
        let mut tasks = self.store.read_tasks()?;
        let before = tasks.len();
        tasks.retain(|task| task.id != id);
        if tasks.len() == before {
            return Ok(false);
        }
        self.store.write_tasks(&tasks)?;
        Ok(true)
    }

    pub fn get(&self, id: &str) -> Result<Option<Task>> {
        let tasks = self.store.read_tasks()?;
        Ok(tasks.into_iter().find(|task| task.id == id))
    }

    /// All live tasks in insertion order
    pub fn list_all(&self) -> Result<Vec<Task>> {
        self.store.read_tasks()
    }

    /// Live tasks in one quadrant, insertion order
    pub fn list_by_quadrant(&self, quadrant: Quadrant) -> Result<Vec<Task>> {
        let tasks = self.store.read_tasks()?;
        Ok(tasks
            .into_iter()
            .filter(|task| task.quadrant == quadrant)
            .collect())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Mark a task completed.
    ///
    /// Completing a Q2 task increments the reward counter as a separate
    /// persisted step. Completing an already-completed task is a no-op.
    pub fn complete(&self, id: &str) -> Result<Task> {
        let _guard = self.store.lock()?;
        let mut tasks = self.store.read_tasks()?;
        let task = tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;

        if task.status == TaskStatus::Completed {
            return Ok(task.clone());
        }

        let now = Utc::now();
        task.status = TaskStatus::Completed;
        task.date_completed = Some(now);
        task.date_updated = now;
        let completed = task.clone();
        self.store.write_tasks(&tasks)?;

        if completed.quadrant == Quadrant::Q2 {
            let count = self.store.read_q2_count()? + 1;
            self.store.write_q2_count(count)?;
            tracing::debug!(count, "q2 completion recorded");
        }

        Ok(completed)
    }

    /// Move a task into a quadrant with a priority
    pub fn categorize(&self, id: &str, quadrant: Quadrant, priority: Priority) -> Result<Task> {
        self.update(
            id,
            TaskPatch {
                quadrant: Some(quadrant),
                priority: Some(priority),
                ..TaskPatch::default()
            },
        )
    }

    // =========================================================================
    // Archive transition
    // =========================================================================

    /// Move a task from the live set into the archive.
    ///
    /// The archive append is durably confirmed before the task is removed
    /// from the live bucket; if the removal fails the append is rolled back
    /// so the record exists in exactly one bucket. A failure during the
    /// rollback itself is surfaced as a fatal storage error.
    pub fn archive(&self, id: &str, reason: &str) -> Result<ArchivedTask> {
        let _guard = self.store.lock()?;
        let mut tasks = self.store.read_tasks()?;
        let index = tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;

        let task = tasks.remove(index);
        let now = Utc::now();
        let time_in_quadrant_ms = (now - task.date_updated).num_milliseconds().max(0);
        let archived = ArchivedTask {
            original_quadrant: task.quadrant,
            date_archived: now,
            archive_reason: reason.to_string(),
            time_in_quadrant_ms,
            task,
        };

        let mut archive = self.store.read_archived()?;
        archive.push(archived.clone());
        self.store.write_archived(&archive)?;

        if let Err(err) = self.store.write_tasks(&tasks) {
            archive.pop();
            self.store.write_archived(&archive).map_err(|rollback| {
                Error::Storage(format!(
                    "archive of task {id} left both buckets inconsistent: {rollback} (after: {err})"
                ))
            })?;
            return Err(err);
        }

        tracing::debug!(id = %archived.task.id, reason = %archived.archive_reason, "task archived");
        Ok(archived)
    }

    /// All archived tasks, oldest first
    pub fn archived(&self) -> Result<Vec<ArchivedTask>> {
        self.store.read_archived()
    }

    /// Current Q2 completion count
    pub fn q2_count(&self) -> Result<u64> {
        self.store.read_q2_count()
    }

    // =========================================================================
    // Id resolution
    // =========================================================================

    /// Resolve a full or prefix task id against the live set.
    ///
    /// Matching is case-insensitive; a prefix must be unambiguous.
    pub fn resolve_id(&self, input: &str) -> Result<String> {
        let needle = input.trim().to_ascii_uppercase();
        if needle.is_empty() {
            return Err(Error::InvalidArgument("task id cannot be empty".to_string()));
        }

        let tasks = self.store.read_tasks()?;
        let mut matches: Vec<String> = tasks
            .iter()
            .filter(|task| task.id.to_ascii_uppercase().starts_with(&needle))
            .map(|task| task.id.clone())
            .collect();

        if let Some(exact) = matches.iter().find(|id| id.eq_ignore_ascii_case(&needle)) {
            return Ok(exact.clone());
        }

        matches.sort();
        matches.dedup();
        match matches.len() {
            0 => Err(Error::TaskNotFound(input.trim().to_string())),
            1 => Ok(matches.remove(0)),
            _ => Err(Error::InvalidArgument(format!(
                "ambiguous task id '{}': {}",
                input.trim(),
                matches.join(", ")
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn board(dir: &std::path::Path) -> TaskBoard {
        let store = RecordStore::new(dir.to_path_buf());
        store.init_all(&crate::config::Config::default()).expect("init store");
        TaskBoard::new(store)
    }

    #[test]
    fn create_trims_title_and_defaults() {
        let dir = tempdir().expect("tempdir");
        let board = board(dir.path());

        let task = board
            .create(NewTask::manual("  Review roadmap  "))
            .expect("create");
        assert_eq!(task.title, "Review roadmap");
        assert_eq!(task.quadrant, Quadrant::Uncategorized);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.status, TaskStatus::Active);
        assert_eq!(task.date_created, task.date_updated);
        assert_eq!(task.history.len(), 1);

        let fetched = board.get(&task.id).expect("get").expect("task");
        assert_eq!(fetched.title, "Review roadmap");
    }

    #[test]
    fn create_rejects_empty_title() {
        let dir = tempdir().expect("tempdir");
        let board = board(dir.path());

        let err = board.create(NewTask::manual("   ")).expect_err("empty title");
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn create_rejects_duplicate_active_ticket() {
        let dir = tempdir().expect("tempdir");
        let board = board(dir.path());

        let mut new = NewTask::manual("First");
        new.ticket = Some("BDC-1".to_string());
        board.create(new.clone()).expect("create first");

        new.title = "Second".to_string();
        let err = board.create(new).expect_err("duplicate ticket");
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn update_restamps_and_ignores_immutable_fields() {
        let dir = tempdir().expect("tempdir");
        let board = board(dir.path());

        let task = board.create(NewTask::manual("Original")).expect("create");
        std::thread::sleep(std::time::Duration::from_millis(5));

        let updated = board
            .update(
                &task.id,
                TaskPatch {
                    title: Some("Edited".to_string()),
                    ..TaskPatch::default()
                },
            )
            .expect("update");

        assert_eq!(updated.id, task.id);
        assert_eq!(updated.title, "Edited");
        assert_eq!(updated.date_created, task.date_created);
        assert!(updated.date_updated > task.date_updated);
    }

    #[test]
    fn update_unknown_id_is_recoverable() {
        let dir = tempdir().expect("tempdir");
        let board = board(dir.path());

        let err = board
            .update("01JUNKID", TaskPatch::default())
            .expect_err("missing");
        assert!(matches!(err, Error::TaskNotFound(_)));
    }

    #[test]
    fn categorize_appends_history_only_on_change() {
        let dir = tempdir().expect("tempdir");
        let board = board(dir.path());

        let task = board.create(NewTask::manual("Plan design review")).expect("create");
        let task = board
            .categorize(&task.id, Quadrant::Q2, Priority::High)
            .expect("categorize");
        assert_eq!(task.quadrant, Quadrant::Q2);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.history.len(), 2);
        assert_eq!(task.history[1].quadrant, Quadrant::Q2);

        // Same quadrant again: priority may change, history must not grow
        let task = board
            .categorize(&task.id, Quadrant::Q2, Priority::Low)
            .expect("recategorize");
        assert_eq!(task.history.len(), 2);
        assert_eq!(task.priority, Priority::Low);
    }

    #[test]
    fn list_by_quadrant_keeps_insertion_order() {
        let dir = tempdir().expect("tempdir");
        let board = board(dir.path());

        let first = board.create(NewTask::manual("first")).expect("create");
        let second = board.create(NewTask::manual("second")).expect("create");
        board.create(NewTask::manual("third")).expect("create");
        board
            .categorize(&second.id, Quadrant::Q1, Priority::High)
            .expect("categorize");

        let uncategorized = board
            .list_by_quadrant(Quadrant::Uncategorized)
            .expect("list");
        let titles: Vec<&str> = uncategorized.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "third"]);
        assert_eq!(uncategorized[0].id, first.id);
    }

    #[test]
    fn complete_stamps_once_and_counts_q2() {
        let dir = tempdir().expect("tempdir");
        let board = board(dir.path());

        let task = board.create(NewTask::manual("Strategic work")).expect("create");
        board
            .categorize(&task.id, Quadrant::Q2, Priority::Medium)
            .expect("categorize");

        let done = board.complete(&task.id).expect("complete");
        assert_eq!(done.status, TaskStatus::Completed);
        let stamped = done.date_completed.expect("completed stamp");
        assert_eq!(board.q2_count().expect("count"), 1);

        // Second completion is a no-op: same stamp, same counter
        let again = board.complete(&task.id).expect("complete again");
        assert_eq!(again.date_completed, Some(stamped));
        assert_eq!(board.q2_count().expect("count"), 1);
    }

    #[test]
    fn complete_outside_q2_leaves_counter_alone() {
        let dir = tempdir().expect("tempdir");
        let board = board(dir.path());

        let task = board.create(NewTask::manual("Firefight")).expect("create");
        board
            .categorize(&task.id, Quadrant::Q1, Priority::High)
            .expect("categorize");
        board.complete(&task.id).expect("complete");

        assert_eq!(board.q2_count().expect("count"), 0);
    }

    #[test]
    fn archive_moves_task_to_exactly_one_bucket() {
        let dir = tempdir().expect("tempdir");
        let board = board(dir.path());

        let task = board.create(NewTask::manual("Old initiative")).expect("create");
        board
            .categorize(&task.id, Quadrant::Q4, Priority::Low)
            .expect("categorize");

        let archived = board.archive(&task.id, "stale").expect("archive");
        assert_eq!(archived.archive_reason, "stale");
        assert_eq!(archived.original_quadrant, Quadrant::Q4);
        assert!(archived.time_in_quadrant_ms >= 0);
        assert_eq!(archived.task.history.len(), 2);

        for quadrant in Quadrant::ALL {
            assert!(board
                .list_by_quadrant(quadrant)
                .expect("list")
                .iter()
                .all(|t| t.id != task.id));
        }
        let archive = board.archived().expect("archived");
        assert_eq!(archive.len(), 1);
        assert_eq!(archive[0].task.id, task.id);

        // Archived tasks are never re-activated
        let err = board.complete(&task.id).expect_err("archived task");
        assert!(matches!(err, Error::TaskNotFound(_)));
    }

    #[test]
    fn delete_reports_removal() {
        let dir = tempdir().expect("tempdir");
        let board = board(dir.path());

        let task = board.create(NewTask::manual("short lived")).expect("create");
        assert!(board.delete(&task.id).expect("delete"));
        assert!(!board.delete(&task.id).expect("delete again"));
    }

    #[test]
    fn resolve_id_accepts_unique_prefix() {
        let dir = tempdir().expect("tempdir");
        let board = board(dir.path());

        let task = board.create(NewTask::manual("target")).expect("create");
        let prefix: String = task.id.chars().take(10).collect();
        assert_eq!(board.resolve_id(&prefix.to_lowercase()).expect("resolve"), task.id);

        let err = board.resolve_id("zzzz").expect_err("missing");
        assert!(matches!(err, Error::TaskNotFound(_)));
    }
}
