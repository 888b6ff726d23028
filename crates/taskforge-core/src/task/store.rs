//! In-memory task collection scoped to one user, with snapshot subscriptions.
//!
//! Every mutation pushes the full visible collection to each subscriber;
//! subscribers recompute whatever they derive from it (the insights feed
//! re-runs the scorer) instead of patching incrementally.

use chrono::{DateTime, Utc};

use super::sharing::{self, Capability, PermissionLevel};
use super::{Task, TaskDraft, TaskUpdate};
use crate::error::{CoreError, Result};

pub type SubscriptionId = u64;

type Listener = Box<dyn FnMut(&[Task])>;

pub struct TaskStore {
    user_id: String,
    /// Newest first.
    tasks: Vec<Task>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: SubscriptionId,
}

impl std::fmt::Debug for TaskStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskStore")
            .field("user_id", &self.user_id)
            .field("tasks", &self.tasks.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl TaskStore {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            tasks: Vec::new(),
            listeners: Vec::new(),
            next_subscription: 1,
        }
    }

    /// Seed from an existing collection, keeping only tasks the user can see.
    pub fn with_tasks(user_id: impl Into<String>, tasks: Vec<Task>) -> Self {
        let mut store = Self::new(user_id);
        store.tasks = tasks;
        store.retain_visible();
        store
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Register a snapshot callback. It is called once immediately with the
    /// current collection, then after every mutation.
    pub fn subscribe<F>(&mut self, mut listener: F) -> SubscriptionId
    where
        F: FnMut(&[Task]) + 'static,
    {
        let id = self.next_subscription;
        self.next_subscription += 1;
        listener(&self.tasks);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn add(&mut self, draft: TaskDraft, now: DateTime<Utc>) -> Result<Task> {
        let task = Task::new(draft, &self.user_id, now)?;
        tracing::info!(task_id = %task.id, title = %task.title, "task added");
        self.tasks.insert(0, task.clone());
        self.notify();
        Ok(task)
    }

    pub fn edit(&mut self, id: &str, update: TaskUpdate, now: DateTime<Utc>) -> Result<Task> {
        let user = self.user_id.clone();
        let task = self.get_mut(id)?;
        task.require(&user, Capability::Edit)?;
        task.apply(update, now)?;
        let updated = task.clone();
        tracing::info!(task_id = %id, "task edited");
        self.notify();
        Ok(updated)
    }

    pub fn toggle_complete(&mut self, id: &str, now: DateTime<Utc>) -> Result<Task> {
        let user = self.user_id.clone();
        let task = self.get_mut(id)?;
        task.require(&user, Capability::Edit)?;
        task.toggle_complete(now);
        let updated = task.clone();
        tracing::info!(task_id = %id, completed = updated.completed, "task completion toggled");
        self.notify();
        Ok(updated)
    }

    pub fn delete(&mut self, id: &str) -> Result<Task> {
        let pos = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| CoreError::task_not_found(id))?;
        self.tasks[pos].require(&self.user_id, Capability::Delete)?;
        let removed = self.tasks.remove(pos);
        tracing::info!(task_id = %id, "task deleted");
        self.notify();
        Ok(removed)
    }

    pub fn share(&mut self, id: &str, collaborator: &str, level: PermissionLevel) -> Result<Task> {
        let user = self.user_id.clone();
        let task = self.get_mut(id)?;
        sharing::share(task, &user, collaborator, level)?;
        let updated = task.clone();
        self.notify();
        Ok(updated)
    }

    pub fn revoke(&mut self, id: &str, collaborator: &str) -> Result<bool> {
        let user = self.user_id.clone();
        let task = self.get_mut(id)?;
        let removed = sharing::revoke(task, &user, collaborator)?;
        if removed {
            // a manager may revoke their own access
            self.retain_visible();
            self.notify();
        }
        Ok(removed)
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| CoreError::task_not_found(id))
    }

    fn retain_visible(&mut self) {
        let user = &self.user_id;
        self.tasks.retain(|t| t.is_visible_to(user));
    }

    fn notify(&mut self) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&self.tasks);
        }
    }
}
