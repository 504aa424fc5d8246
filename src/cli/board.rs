//! Board command implementations (add/list/edit/categorize/complete/
//! archive/delete).

use std::path::PathBuf;

use serde::Serialize;

use crate::cli::load_context;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::stats::RewardProgress;
use crate::task::{ArchivedTask, NewTask, Priority, Quadrant, Task, TaskOrigin, TaskPatch};

pub struct AddOptions {
    pub title: String,
    pub origin: String,
    pub source: Option<String>,
    pub ticket: Option<String>,
    pub quadrant: String,
    pub priority: String,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ListOptions {
    pub quadrant: Option<String>,
    pub all: bool,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct EditOptions {
    pub id: String,
    pub title: Option<String>,
    pub source: Option<String>,
    pub ticket: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct CategorizeOptions {
    pub id: String,
    pub quadrant: String,
    pub priority: String,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct CompleteOptions {
    pub id: String,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ArchiveOptions {
    pub id: String,
    pub reason: String,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct DeleteOptions {
    pub id: String,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub fn run_add(options: AddOptions) -> Result<()> {
    let ctx = load_context(options.data_dir)?;

    let origin = TaskOrigin::parse(&options.origin)?;
    let quadrant = Quadrant::parse(&options.quadrant)?;
    let priority = Priority::parse(&options.priority)?;
    let ticket = options
        .ticket
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    let task = ctx.board.create(NewTask {
        title: options.title,
        origin,
        source: options.source.unwrap_or_else(|| origin.as_str().to_string()),
        ticket,
        quadrant,
        priority,
        sync_origin_timestamp: None,
        last_synced_at: None,
    })?;

    let mut human = HumanOutput::new("Task added");
    human.push_summary("ID", task.id.clone());
    human.push_summary("Quadrant", task.quadrant.to_string());
    human.push_summary("Priority", task.priority.to_string());
    if let Some(ticket) = task.ticket.as_deref() {
        human.push_summary("Ticket", ticket.to_string());
        if let Some(base) = ctx.config.sync.ticket_base_url.as_deref() {
            human.push_detail(format!("{}/{ticket}", base.trim_end_matches('/')));
        }
    }
    if !task.quadrant.is_categorized() {
        human.push_next_step(format!("triage categorize {} q1|q2|q3|q4", task.id));
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "add",
        &task,
        Some(&human),
    )
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let ctx = load_context(options.data_dir)?;
    let quadrant = options
        .quadrant
        .as_deref()
        .map(Quadrant::parse)
        .transpose()?;

    let mut tasks = match quadrant {
        Some(quadrant) => ctx.board.list_by_quadrant(quadrant)?,
        None => ctx.board.list_all()?,
    };
    if !options.all {
        // Completed tasks stay on the board until archived; hide them from
        // the day-to-day listing like the dashboard does.
        tasks.retain(|task| task.is_active());
    }

    let uncategorized = tasks
        .iter()
        .filter(|task| task.is_active() && !task.quadrant.is_categorized())
        .count();

    let mut human = HumanOutput::new(format!("{} task(s)", tasks.len()));
    for task in &tasks {
        human.push_detail(format_task_line(task));
    }
    if uncategorized > 0 {
        human.push_warning(format!(
            "{uncategorized} task(s) need categorization before you can work on them"
        ));
        human.push_next_step("triage categorize <id> q1|q2|q3|q4".to_string());
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "list",
        &tasks,
        Some(&human),
    )
}

pub fn run_edit(options: EditOptions) -> Result<()> {
    let ctx = load_context(options.data_dir)?;

    let patch = TaskPatch {
        title: options.title,
        source: options.source,
        ticket: options
            .ticket
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .map(Some),
        ..TaskPatch::default()
    };
    if patch.is_empty() {
        return Err(Error::InvalidArgument(
            "nothing to edit: pass --title, --source, or --ticket".to_string(),
        ));
    }

    let id = ctx.board.resolve_id(&options.id)?;
    let task = ctx.board.update(&id, patch)?;

    let mut human = HumanOutput::new("Task updated");
    human.push_summary("ID", task.id.clone());
    human.push_summary("Title", task.title.clone());

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "edit",
        &task,
        Some(&human),
    )
}

pub fn run_categorize(options: CategorizeOptions) -> Result<()> {
    let ctx = load_context(options.data_dir)?;
    let quadrant = Quadrant::parse(&options.quadrant)?;
    let priority = Priority::parse(&options.priority)?;

    let id = ctx.board.resolve_id(&options.id)?;
    let task = ctx.board.categorize(&id, quadrant, priority)?;

    let mut human = HumanOutput::new("Task categorized");
    human.push_summary("ID", task.id.clone());
    human.push_summary("Quadrant", task.quadrant.to_string());
    human.push_summary("Priority", task.priority.to_string());

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "categorize",
        &task,
        Some(&human),
    )
}

pub fn run_complete(options: CompleteOptions) -> Result<()> {
    let ctx = load_context(options.data_dir)?;

    let id = ctx.board.resolve_id(&options.id)?;
    let task = ctx.board.complete(&id)?;

    let mut human = HumanOutput::new("Task completed");
    human.push_summary("ID", task.id.clone());
    human.push_summary("Title", task.title.clone());
    if task.quadrant == Quadrant::Q2 {
        let progress =
            RewardProgress::new(ctx.board.q2_count()?, ctx.config.rewards.q2_milestone);
        human.push_detail(format!(
            "Q2 completion {} recorded. {}",
            progress.count,
            progress.message()
        ));
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "complete",
        &task,
        Some(&human),
    )
}

pub fn run_archive(options: ArchiveOptions) -> Result<()> {
    let ctx = load_context(options.data_dir)?;

    let id = ctx.board.resolve_id(&options.id)?;
    let archived: ArchivedTask = ctx.board.archive(&id, &options.reason)?;

    let mut human = HumanOutput::new("Task archived");
    human.push_summary("ID", archived.task.id.clone());
    human.push_summary("Reason", archived.archive_reason.clone());
    human.push_summary("From quadrant", archived.original_quadrant.to_string());

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "archive",
        &archived,
        Some(&human),
    )
}

pub fn run_delete(options: DeleteOptions) -> Result<()> {
    let ctx = load_context(options.data_dir)?;

    let id = ctx.board.resolve_id(&options.id)?;
    let deleted = ctx.board.delete(&id)?;

    #[derive(Serialize)]
    struct DeleteOutput {
        id: String,
        deleted: bool,
    }

    let mut human = HumanOutput::new(if deleted { "Task deleted" } else { "Nothing deleted" });
    human.push_summary("ID", id.clone());

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "delete",
        &DeleteOutput { id, deleted },
        Some(&human),
    )
}

fn format_task_line(task: &Task) -> String {
    let mut line = format!(
        "{} [{}/{}] {}",
        task.id, task.quadrant, task.priority, task.title
    );
    if let Some(ticket) = task.ticket.as_deref() {
        line.push_str(&format!(" ({ticket})"));
    }
    if !task.is_active() {
        line.push_str(" [done]");
    }
    line
}
