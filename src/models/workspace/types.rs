use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkspaceRole {
    Owner,
    Admin,
    Member,
}

impl WorkspaceRole {
    /// Owners and admins manage members.
    pub fn can_manage(self) -> bool {
        matches!(self, WorkspaceRole::Owner | WorkspaceRole::Admin)
    }
}

/// A workspace together with the caller's role in it.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Membership {
    pub workspace_id: i64,
    pub workspace_name: String,
    pub role: WorkspaceRole,
    pub joined_at: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Member {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub role: WorkspaceRole,
    pub joined_at: String,
}
