//! Task management commands for CLI.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use clap::Subcommand;
use taskforge_core::calendar;
use taskforge_core::task::{parse_tags, pending_by_priority};
use taskforge_core::{Config, Database, PermissionLevel, Priority, Task, TaskDraft, TaskStore, TaskUpdate};

use super::{current_user, print_json, CliResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task
    Add {
        /// Task title
        title: String,
        /// Task description
        #[arg(long)]
        description: Option<String>,
        /// Priority: high, medium or low
        #[arg(long, default_value = "medium")]
        priority: Priority,
        /// Due date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        due: Option<String>,
        /// Estimated hours
        #[arg(long)]
        estimate: Option<f64>,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
    },
    /// List tasks you own or that are shared with you
    List {
        /// Only incomplete tasks
        #[arg(long)]
        pending: bool,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Get task details
    Get {
        /// Task ID (or unique prefix)
        id: String,
    },
    /// Edit a task
    Edit {
        /// Task ID (or unique prefix)
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// New priority
        #[arg(long)]
        priority: Option<Priority>,
        /// New due date (YYYY-MM-DD or RFC 3339)
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        /// Remove the due date
        #[arg(long)]
        clear_due: bool,
        /// New estimate in hours
        #[arg(long, conflicts_with = "clear_estimate")]
        estimate: Option<f64>,
        /// Remove the estimate
        #[arg(long)]
        clear_estimate: bool,
        /// Progress percentage (0-100)
        #[arg(long)]
        progress: Option<u8>,
        /// Comma-separated tags (replaces existing)
        #[arg(long)]
        tags: Option<String>,
    },
    /// Toggle a task between complete and incomplete
    Complete {
        /// Task ID (or unique prefix)
        id: String,
    },
    /// Delete a task (owner only)
    Delete {
        /// Task ID (or unique prefix)
        id: String,
    },
    /// Share a task with a registered user
    Share {
        /// Task ID (or unique prefix)
        id: String,
        /// Collaborator email
        email: String,
        /// Role: manager, editor or viewer
        #[arg(long, default_value = "viewer")]
        role: PermissionLevel,
    },
    /// Remove a collaborator from a task
    Unshare {
        /// Task ID (or unique prefix)
        id: String,
        /// Collaborator email
        email: String,
    },
    /// Pending tasks grouped by priority with due labels
    Due,
    /// Days of a month with pending tasks due
    Calendar {
        /// Month as YYYY-MM (default: current month)
        #[arg(long)]
        month: Option<String>,
    },
}

/// Parse `YYYY-MM-DD` (start of day, UTC) or a full RFC 3339 timestamp.
fn parse_due(raw: &str) -> CliResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| format!("invalid due date '{raw}': expected YYYY-MM-DD or RFC 3339"))?;
    Ok(date.and_time(chrono::NaiveTime::MIN).and_utc())
}

fn parse_month(raw: &str) -> CliResult<(i32, u32)> {
    let invalid = || format!("invalid month '{raw}': expected YYYY-MM");
    let (year, month) = raw.split_once('-').ok_or_else(invalid)?;
    Ok((year.parse().map_err(|_| invalid())?, month.parse().map_err(|_| invalid())?))
}

/// Exact id, or a prefix matching exactly one visible task.
fn resolve_id(store: &TaskStore, raw: &str) -> CliResult<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("task id must not be empty".into());
    }
    if store.get(raw).is_some() {
        return Ok(raw.to_string());
    }
    let matches: Vec<&Task> = store.tasks().iter().filter(|t| t.id.starts_with(raw)).collect();
    match matches.as_slice() {
        [task] => Ok(task.id.clone()),
        [] => Err(taskforge_core::CoreError::task_not_found(raw).into()),
        _ => Err(format!("task id prefix '{raw}' is ambiguous").into()),
    }
}

fn resolve_email(db: &Database, email: &str) -> CliResult<String> {
    let user = db
        .find_user_by_email(email)?
        .ok_or_else(|| taskforge_core::CoreError::user_not_found(email))?;
    Ok(user.uid)
}

fn print_row(task: &Task, now: DateTime<Utc>) {
    let check = if task.completed { "x" } else { " " };
    let due = task
        .due_label(now)
        .map(|label| format!("  ({label})"))
        .unwrap_or_default();
    println!(
        "[{check}] {}  {:<6}  {}{due}",
        &task.id[..8.min(task.id.len())],
        task.priority,
        task.title
    );
}

pub fn run(action: TaskAction) -> CliResult {
    let config = Config::load()?;
    let user = current_user(&config)?;
    let db = Database::open()?;
    let tasks = db.list_tasks_for(&user)?;
    let mut store = TaskStore::with_tasks(user, tasks);
    let now = Utc::now();

    match action {
        TaskAction::Add {
            title,
            description,
            priority,
            due,
            estimate,
            tags,
        } => {
            let draft = TaskDraft {
                title,
                description,
                priority,
                due_date: due.as_deref().map(parse_due).transpose()?,
                estimated_hours: estimate,
                tags: tags.as_deref().map(parse_tags).unwrap_or_default(),
            };
            let task = store.add(draft, now)?;
            db.insert_task(&task)?;
            println!("Task created: {}", task.id);
            print_json(&task)?;
        }
        TaskAction::List { pending, json } => {
            let tasks: Vec<&Task> = store
                .tasks()
                .iter()
                .filter(|t| !pending || !t.completed)
                .collect();
            if json {
                print_json(&tasks)?;
            } else if tasks.is_empty() {
                println!("No tasks.");
            } else {
                for task in tasks {
                    print_row(task, now);
                }
            }
        }
        TaskAction::Get { id } => {
            let id = resolve_id(&store, &id)?;
            if let Some(task) = store.get(&id) {
                print_json(task)?;
            }
        }
        TaskAction::Edit {
            id,
            title,
            description,
            priority,
            due,
            clear_due,
            estimate,
            clear_estimate,
            progress,
            tags,
        } => {
            let id = resolve_id(&store, &id)?;
            let due_date = if clear_due {
                Some(None)
            } else {
                due.as_deref().map(parse_due).transpose()?.map(Some)
            };
            let update = TaskUpdate {
                title,
                description: description.map(Some),
                priority,
                due_date,
                estimated_hours: if clear_estimate {
                    Some(None)
                } else {
                    estimate.map(Some)
                },
                progress,
                tags: tags.as_deref().map(parse_tags),
            };
            if update.is_empty() {
                return Err("nothing to edit; pass at least one field".into());
            }
            let task = store.edit(&id, update, now)?;
            db.update_task(&task)?;
            println!("Task updated:");
            print_json(&task)?;
        }
        TaskAction::Complete { id } => {
            let id = resolve_id(&store, &id)?;
            let task = store.toggle_complete(&id, now)?;
            db.update_task(&task)?;
            if task.completed {
                println!("Task completed: {}", task.title);
            } else {
                println!("Task reopened: {}", task.title);
            }
        }
        TaskAction::Delete { id } => {
            let id = resolve_id(&store, &id)?;
            let task = store.delete(&id)?;
            db.delete_task(&task.id)?;
            println!("Task deleted: {}", task.id);
        }
        TaskAction::Share { id, email, role } => {
            let id = resolve_id(&store, &id)?;
            let collaborator = resolve_email(&db, &email)?;
            let task = store.share(&id, &collaborator, role)?;
            db.update_task(&task)?;
            println!("Shared '{}' with {email} as {role}", task.title);
        }
        TaskAction::Unshare { id, email } => {
            let id = resolve_id(&store, &id)?;
            let collaborator = resolve_email(&db, &email)?;
            let before = store.get(&id).cloned();
            if store.revoke(&id, &collaborator)? {
                // the store drops the task if the actor revoked their own access
                let mut task = store.get(&id).cloned().or(before).ok_or_else(|| {
                    taskforge_core::CoreError::task_not_found(&id)
                })?;
                task.roles.remove(&collaborator);
                db.update_task(&task)?;
                println!("Removed {email} from '{}'", task.title);
            } else {
                println!("{email} had no access to this task");
            }
        }
        TaskAction::Due => {
            let groups = pending_by_priority(store.tasks());
            if groups.is_empty() {
                println!("Nothing pending.");
            }
            for (priority, tasks) in groups {
                println!("{priority} ({})", tasks.len());
                for task in tasks {
                    print_row(task, now);
                }
            }
        }
        TaskAction::Calendar { month } => {
            let (year, month) = match month {
                Some(raw) => parse_month(&raw)?,
                None => (now.year(), now.month()),
            };
            let days = calendar::busy_days(store.tasks(), year, month)?;
            if days.is_empty() {
                println!("No pending tasks due in {year}-{month:02}.");
            }
            for (date, summary) in days {
                println!("{date}  {} due, {} high", summary.total, summary.high_priority);
                for task in calendar::tasks_due_on(store.tasks(), date) {
                    println!("    - {}", task.title);
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_due_accepts_dates_and_timestamps() {
        let day = parse_due("2025-12-25").unwrap();
        assert_eq!(day.to_rfc3339(), "2025-12-25T00:00:00+00:00");
        let ts = parse_due("2025-12-25T15:30:00+02:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2025-12-25T13:30:00+00:00");
        assert!(parse_due("next friday").is_err());
    }

    #[test]
    fn parse_month_splits_year_and_month() {
        assert_eq!(parse_month("2025-02").unwrap(), (2025, 2));
        assert!(parse_month("2025").is_err());
        assert!(parse_month("2025-xx").is_err());
    }

    #[test]
    fn resolve_id_by_prefix() {
        let now = Utc::now();
        let draft = |title: &str| TaskDraft {
            title: title.into(),
            ..Default::default()
        };
        let a = Task::new(draft("a"), "alice", now).unwrap();
        let store = TaskStore::with_tasks("alice", vec![a.clone()]);
        assert_eq!(resolve_id(&store, &a.id).unwrap(), a.id);
        assert_eq!(resolve_id(&store, &a.id[..6]).unwrap(), a.id);
        assert!(resolve_id(&store, "zzzz-not-an-id").is_err());
        assert!(resolve_id(&store, "").is_err());
        assert!(resolve_id(&store, "   ").is_err());
    }
}
