//! Role-based sharing of tasks.
//!
//! Each task carries a flat `user -> role` map. There is no conflict
//! resolution: the last grant for a user wins.
//!
//! | Role    | view | edit/complete | share | delete |
//! |---------|------|---------------|-------|--------|
//! | owner   | yes  | yes           | yes   | yes    |
//! | manager | yes  | yes           | yes   | no     |
//! | editor  | yes  | yes           | no    | no     |
//! | viewer  | yes  | no            | no    | no     |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Task;
use crate::error::{SharingError, ValidationError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    Owner,
    Manager,
    Editor,
    Viewer,
}

/// Something a user may want to do with a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    View,
    Edit,
    Share,
    Delete,
}

impl Capability {
    fn verb(&self) -> &'static str {
        match self {
            Capability::View => "view",
            Capability::Edit => "edit",
            Capability::Share => "share",
            Capability::Delete => "delete",
        }
    }
}

impl PermissionLevel {
    pub fn allows(&self, capability: Capability) -> bool {
        use PermissionLevel::*;
        match capability {
            Capability::View => true,
            Capability::Edit => matches!(self, Owner | Manager | Editor),
            Capability::Share => matches!(self, Owner | Manager),
            Capability::Delete => matches!(self, Owner),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionLevel::Owner => "owner",
            PermissionLevel::Manager => "manager",
            PermissionLevel::Editor => "editor",
            PermissionLevel::Viewer => "viewer",
        }
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "owner" => Ok(PermissionLevel::Owner),
            "manager" => Ok(PermissionLevel::Manager),
            "editor" => Ok(PermissionLevel::Editor),
            "viewer" => Ok(PermissionLevel::Viewer),
            other => Err(ValidationError::UnknownVariant {
                kind: "permission level",
                value: other.to_string(),
            }),
        }
    }
}

impl Task {
    pub fn role_of(&self, user_id: &str) -> Option<PermissionLevel> {
        self.roles.get(user_id).copied()
    }

    /// A task is visible to anyone holding a role on it.
    pub fn is_visible_to(&self, user_id: &str) -> bool {
        self.roles.contains_key(user_id)
    }

    pub fn can(&self, user_id: &str, capability: Capability) -> bool {
        self.role_of(user_id)
            .map(|role| role.allows(capability))
            .unwrap_or(false)
    }

    /// Fail with `PermissionDenied` unless `user_id` holds `capability`.
    pub fn require(&self, user_id: &str, capability: Capability) -> Result<(), SharingError> {
        if self.can(user_id, capability) {
            Ok(())
        } else {
            Err(SharingError::PermissionDenied {
                user: user_id.to_string(),
                action: capability.verb(),
            })
        }
    }

    /// Non-owner role holders.
    pub fn collaborators(&self) -> Vec<(&str, PermissionLevel)> {
        self.roles
            .iter()
            .filter(|(_, role)| **role != PermissionLevel::Owner)
            .map(|(uid, role)| (uid.as_str(), *role))
            .collect()
    }
}

/// Grant `level` on `task` to `collaborator`, acting as `actor`.
pub fn share(
    task: &mut Task,
    actor: &str,
    collaborator: &str,
    level: PermissionLevel,
) -> Result<(), SharingError> {
    task.require(actor, Capability::Share)?;
    if collaborator == task.owner_id {
        return Err(SharingError::AlreadyOwner(collaborator.to_string()));
    }
    if level == PermissionLevel::Owner {
        return Err(SharingError::CannotGrantOwner);
    }
    task.roles.insert(collaborator.to_string(), level);
    tracing::debug!(task_id = %task.id, collaborator, role = %level, "task shared");
    Ok(())
}

/// Remove `collaborator`'s role. Returns whether a role was removed.
pub fn revoke(task: &mut Task, actor: &str, collaborator: &str) -> Result<bool, SharingError> {
    task.require(actor, Capability::Share)?;
    if collaborator == task.owner_id {
        return Err(SharingError::CannotRevokeOwner);
    }
    let removed = task.roles.remove(collaborator).is_some();
    if removed {
        tracing::debug!(task_id = %task.id, collaborator, "task access revoked");
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Priority, TaskDraft};
    use chrono::Utc;

    fn owned_by(owner: &str) -> Task {
        let draft = TaskDraft {
            title: "Quarterly review".into(),
            priority: Priority::High,
            ..Default::default()
        };
        Task::new(draft, owner, Utc::now()).unwrap()
    }

    #[test]
    fn capability_table() {
        use PermissionLevel::*;
        assert!(Viewer.allows(Capability::View));
        assert!(!Viewer.allows(Capability::Edit));
        assert!(Editor.allows(Capability::Edit));
        assert!(!Editor.allows(Capability::Share));
        assert!(Manager.allows(Capability::Share));
        assert!(!Manager.allows(Capability::Delete));
        assert!(Owner.allows(Capability::Delete));
    }

    #[test]
    fn owner_can_share_and_last_grant_wins() {
        let mut task = owned_by("alice");
        share(&mut task, "alice", "bob", PermissionLevel::Viewer).unwrap();
        share(&mut task, "alice", "bob", PermissionLevel::Editor).unwrap();
        assert_eq!(task.role_of("bob"), Some(PermissionLevel::Editor));
        assert_eq!(task.collaborators(), vec![("bob", PermissionLevel::Editor)]);
    }

    #[test]
    fn manager_can_share_but_editor_cannot() {
        let mut task = owned_by("alice");
        share(&mut task, "alice", "bob", PermissionLevel::Manager).unwrap();
        share(&mut task, "alice", "carol", PermissionLevel::Editor).unwrap();

        share(&mut task, "bob", "dave", PermissionLevel::Viewer).unwrap();
        let err = share(&mut task, "carol", "erin", PermissionLevel::Viewer).unwrap_err();
        assert_eq!(
            err,
            SharingError::PermissionDenied {
                user: "carol".into(),
                action: "share"
            }
        );
    }

    #[test]
    fn sharing_with_owner_is_refused() {
        let mut task = owned_by("alice");
        let err = share(&mut task, "alice", "alice", PermissionLevel::Editor).unwrap_err();
        assert_eq!(err, SharingError::AlreadyOwner("alice".into()));
    }

    #[test]
    fn owner_role_cannot_be_granted() {
        let mut task = owned_by("alice");
        let err = share(&mut task, "alice", "bob", PermissionLevel::Owner).unwrap_err();
        assert_eq!(err, SharingError::CannotGrantOwner);
    }

    #[test]
    fn revoke_rules() {
        let mut task = owned_by("alice");
        share(&mut task, "alice", "bob", PermissionLevel::Viewer).unwrap();
        assert!(revoke(&mut task, "alice", "bob").unwrap());
        assert!(!revoke(&mut task, "alice", "bob").unwrap());
        assert_eq!(
            revoke(&mut task, "alice", "alice").unwrap_err(),
            SharingError::CannotRevokeOwner
        );
        assert!(!task.is_visible_to("bob"));
    }

    #[test]
    fn strangers_have_no_access() {
        let task = owned_by("alice");
        assert!(!task.is_visible_to("mallory"));
        assert!(!task.can("mallory", Capability::View));
        assert!(task.require("mallory", Capability::Edit).is_err());
    }

    #[test]
    fn permission_level_parse() {
        assert_eq!("Editor".parse::<PermissionLevel>().unwrap(), PermissionLevel::Editor);
        assert!("admin".parse::<PermissionLevel>().is_err());
    }
}
