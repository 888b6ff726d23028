//! SQLite-backed persistence for tasks, focus sessions and local users.
//!
//! Provides persistent storage for:
//! - Tasks with their sharing roles
//! - Completed focus sessions and the trailing-window aggregate
//! - Registered users (uid + email), used to resolve share targets
//! - Key-value store for application state (e.g. the running focus timer)

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use uuid::Uuid;

use super::{data_dir, migrations};
use crate::error::{CoreError, DatabaseError, Result, ValidationError};
use crate::focus::{FocusAggregate, FocusSession};
use crate::task::{PermissionLevel, Priority, Task};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub uid: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// SQLite database handle.
pub struct Database {
    conn: Connection,
}

const TASK_COLUMNS: &str = "id, title, description, priority, due_date, estimated_hours, progress,
     tags, completed, owner_id, roles, created_at, updated_at, completed_at";

impl Database {
    /// Open the database at `<data_dir>/taskforge.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("taskforge.db");
        Self::open_at(&path)
    }

    /// Open (or create) a database file at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        migrations::migrate(&self.conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()).into())
    }

    // ── Tasks ────────────────────────────────────────────────────────

    pub fn insert_task(&self, task: &Task) -> Result<()> {
        self.conn.execute(
            "INSERT INTO tasks (
                id, title, description, priority, due_date, estimated_hours, progress,
                tags, completed, owner_id, roles, created_at, updated_at, completed_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                task.id,
                task.title,
                task.description,
                task.priority.as_str(),
                task.due_date.map(fmt_ts),
                task.estimated_hours,
                task.progress,
                serde_json::to_string(&task.tags)?,
                task.completed,
                task.owner_id,
                serde_json::to_string(&task.roles)?,
                fmt_ts(task.created_at),
                fmt_ts(task.updated_at),
                task.completed_at.map(fmt_ts),
            ],
        )?;
        tracing::debug!(task_id = %task.id, "task inserted");
        Ok(())
    }

    /// Overwrite every mutable column of an existing task.
    pub fn update_task(&self, task: &Task) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE tasks SET
                title = ?2, description = ?3, priority = ?4, due_date = ?5,
                estimated_hours = ?6, progress = ?7, tags = ?8, completed = ?9,
                roles = ?10, updated_at = ?11, completed_at = ?12
             WHERE id = ?1",
            params![
                task.id,
                task.title,
                task.description,
                task.priority.as_str(),
                task.due_date.map(fmt_ts),
                task.estimated_hours,
                task.progress,
                serde_json::to_string(&task.tags)?,
                task.completed,
                serde_json::to_string(&task.roles)?,
                fmt_ts(task.updated_at),
                task.completed_at.map(fmt_ts),
            ],
        )?;
        if changed == 0 {
            return Err(CoreError::task_not_found(&task.id));
        }
        tracing::debug!(task_id = %task.id, "task updated");
        Ok(())
    }

    pub fn get_task(&self, id: &str) -> Result<Option<Task>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1");
        let raw = self
            .conn
            .query_row(&sql, params![id], RawTask::from_row)
            .optional()?;
        raw.map(RawTask::into_task).transpose()
    }

    /// Returns whether a row was removed.
    pub fn delete_task(&self, id: &str) -> Result<bool> {
        let removed = self.conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }

    /// All tasks, newest first.
    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY created_at DESC, rowid DESC");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], RawTask::from_row)?;
        let mut tasks = Vec::new();
        for raw in rows {
            tasks.push(raw?.into_task()?);
        }
        Ok(tasks)
    }

    /// Tasks the user owns or holds any role on, newest first.
    pub fn list_tasks_for(&self, user_id: &str) -> Result<Vec<Task>> {
        Ok(self
            .list_tasks()?
            .into_iter()
            .filter(|t| t.is_visible_to(user_id))
            .collect())
    }

    // ── Focus sessions ───────────────────────────────────────────────

    pub fn record_focus_session(
        &self,
        duration_min: u64,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        task_id: Option<&str>,
    ) -> Result<i64> {
        if completed_at < started_at {
            return Err(ValidationError::InvalidValue {
                field: "completed_at",
                message: "session cannot complete before it starts".to_string(),
            }
            .into());
        }
        self.conn.execute(
            "INSERT INTO focus_sessions (duration_min, started_at, completed_at, task_id)
             VALUES (?1, ?2, ?3, ?4)",
            params![duration_min, fmt_ts(started_at), fmt_ts(completed_at), task_id],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::info!(session_id = id, duration_min, "focus session recorded");
        Ok(id)
    }

    /// Sessions completed after `since`, most recent first.
    pub fn focus_sessions_since(&self, since: DateTime<Utc>) -> Result<Vec<FocusSession>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, duration_min, started_at, completed_at, task_id
             FROM focus_sessions
             WHERE completed_at > ?1
             ORDER BY completed_at DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![fmt_ts(since)], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?;

        let mut sessions = Vec::new();
        for row in rows {
            let (id, duration_min, started, completed, task_id) = row?;
            sessions.push(FocusSession {
                id,
                duration_min,
                started_at: parse_ts(&started)?,
                completed_at: parse_ts(&completed)?,
                task_id,
            });
        }
        Ok(sessions)
    }

    /// Minutes and count of sessions completed in the trailing 7 days.
    pub fn focus_aggregate(&self, now: DateTime<Utc>) -> Result<FocusAggregate> {
        let (total, count) = self.conn.query_row(
            "SELECT COALESCE(SUM(duration_min), 0), COUNT(*)
             FROM focus_sessions
             WHERE completed_at > ?1 AND completed_at <= ?2",
            params![fmt_ts(FocusAggregate::window_start(now)), fmt_ts(now)],
            |row| Ok((row.get::<_, u64>(0)?, row.get::<_, u64>(1)?)),
        )?;
        Ok(FocusAggregate {
            total_focus_minutes: total,
            focus_session_count: count,
        })
    }

    // ── Users ────────────────────────────────────────────────────────

    /// Register a local user. Emails are unique, case-insensitively.
    pub fn register_user(&self, email: &str, now: DateTime<Utc>) -> Result<UserRecord> {
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(ValidationError::InvalidValue {
                field: "email",
                message: format!("'{email}' is not an email address"),
            }
            .into());
        }
        let user = UserRecord {
            uid: Uuid::new_v4().to_string(),
            email: email.to_string(),
            created_at: now,
        };
        self.conn.execute(
            "INSERT INTO users (uid, email, created_at) VALUES (?1, ?2, ?3)",
            params![user.uid, user.email, fmt_ts(user.created_at)],
        )?;
        tracing::info!(uid = %user.uid, "user registered");
        Ok(user)
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        self.query_user("SELECT uid, email, created_at FROM users WHERE email = ?1", email.trim())
    }

    pub fn get_user(&self, uid: &str) -> Result<Option<UserRecord>> {
        self.query_user("SELECT uid, email, created_at FROM users WHERE uid = ?1", uid)
    }

    fn query_user(&self, sql: &str, key: &str) -> Result<Option<UserRecord>> {
        let raw = self
            .conn
            .query_row(sql, params![key], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .optional()?;
        raw.map(|(uid, email, created)| {
            Ok(UserRecord {
                uid,
                email,
                created_at: parse_ts(&created)?,
            })
        })
        .transpose()
    }

    // ── Key-value ────────────────────────────────────────────────────

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<()> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

/// Column values as read, before JSON and enum decoding.
struct RawTask {
    id: String,
    title: String,
    description: Option<String>,
    priority: String,
    due_date: Option<String>,
    estimated_hours: Option<f64>,
    progress: u8,
    tags: String,
    completed: bool,
    owner_id: String,
    roles: String,
    created_at: String,
    updated_at: String,
    completed_at: Option<String>,
}

impl RawTask {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            priority: row.get(3)?,
            due_date: row.get(4)?,
            estimated_hours: row.get(5)?,
            progress: row.get(6)?,
            tags: row.get(7)?,
            completed: row.get(8)?,
            owner_id: row.get(9)?,
            roles: row.get(10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
            completed_at: row.get(13)?,
        })
    }

    fn into_task(self) -> Result<Task> {
        let priority: Priority = self.priority.parse()?;
        let roles: BTreeMap<String, PermissionLevel> = serde_json::from_str(&self.roles)?;
        Ok(Task {
            id: self.id,
            title: self.title,
            description: self.description,
            priority,
            due_date: self.due_date.as_deref().map(parse_ts).transpose()?,
            estimated_hours: self.estimated_hours,
            progress: self.progress,
            tags: serde_json::from_str(&self.tags)?,
            completed: self.completed,
            owner_id: self.owner_id,
            roles,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
            completed_at: self.completed_at.as_deref().map(parse_ts).transpose()?,
        })
    }
}

/// Fixed-width UTC timestamps so that text comparison in SQL orders correctly.
fn fmt_ts(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::QueryFailed(format!("bad timestamp '{s}': {e}")).into())
}
