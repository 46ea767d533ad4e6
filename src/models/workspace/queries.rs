use sqlx::{SqliteConnection, SqlitePool};

use crate::db::now_timestamp;
use crate::errors::AppError;
use super::types::*;

const SELECT_MEMBERSHIP: &str = "\
    SELECT m.workspace_id, w.name AS workspace_name, m.role, m.joined_at \
    FROM workspace_members m \
    JOIN workspaces w ON w.id = m.workspace_id";

/// Create a workspace and make `owner_id` its OWNER. Returns the workspace ID.
pub async fn create(pool: &SqlitePool, name: &str, owner_id: i64) -> Result<i64, AppError> {
    let mut tx = pool.begin().await?;
    let workspace_id = insert_with_owner(&mut tx, name, owner_id).await?;
    tx.commit().await?;
    Ok(workspace_id)
}

/// Insert the workspace row and its OWNER membership on `conn`. The caller
/// owns the transaction.
pub(crate) async fn insert_with_owner(
    conn: &mut SqliteConnection,
    name: &str,
    owner_id: i64,
) -> Result<i64, AppError> {
    let now = now_timestamp();
    let workspace_id = sqlx::query(
        "INSERT INTO workspaces (name, owner_id, created_at) VALUES (?1, ?2, ?3)",
    )
    .bind(name.trim())
    .bind(owner_id)
    .bind(&now)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    sqlx::query(
        "INSERT INTO workspace_members (workspace_id, user_id, role, joined_at) \
         VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(workspace_id)
    .bind(owner_id)
    .bind(WorkspaceRole::Owner)
    .bind(&now)
    .execute(&mut *conn)
    .await?;

    Ok(workspace_id)
}

/// All workspaces the user belongs to, oldest membership first.
pub async fn list_for_user(pool: &SqlitePool, user_id: i64) -> Result<Vec<Membership>, AppError> {
    let rows = sqlx::query_as::<_, Membership>(&format!(
        "{SELECT_MEMBERSHIP} WHERE m.user_id = ?1 ORDER BY m.joined_at ASC, m.workspace_id ASC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_membership(
    pool: &SqlitePool,
    workspace_id: i64,
    user_id: i64,
) -> Result<Option<Membership>, AppError> {
    let row = sqlx::query_as::<_, Membership>(&format!(
        "{SELECT_MEMBERSHIP} WHERE m.workspace_id = ?1 AND m.user_id = ?2"
    ))
    .bind(workspace_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn first_membership(pool: &SqlitePool, user_id: i64) -> Result<Option<Membership>, AppError> {
    Ok(list_for_user(pool, user_id).await?.into_iter().next())
}

/// Add an existing user to a workspace. Re-adding updates the role.
pub async fn add_member(
    pool: &SqlitePool,
    workspace_id: i64,
    user_id: i64,
    role: WorkspaceRole,
) -> Result<(), AppError> {
    if role == WorkspaceRole::Owner {
        return Err(AppError::Validation(vec![
            "A workspace has exactly one owner".to_string(),
        ]));
    }
    if let Some(existing) = find_membership(pool, workspace_id, user_id).await? {
        if existing.role == WorkspaceRole::Owner {
            return Err(AppError::Conflict("Cannot change the owner's role".to_string()));
        }
    }

    sqlx::query(
        "INSERT INTO workspace_members (workspace_id, user_id, role, joined_at) \
         VALUES (?1, ?2, ?3, ?4) \
         ON CONFLICT (workspace_id, user_id) DO UPDATE SET role = excluded.role",
    )
    .bind(workspace_id)
    .bind(user_id)
    .bind(role)
    .bind(now_timestamp())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn members(pool: &SqlitePool, workspace_id: i64) -> Result<Vec<Member>, AppError> {
    let rows = sqlx::query_as::<_, Member>(
        "SELECT u.id AS user_id, u.name, u.email, m.role, m.joined_at \
         FROM workspace_members m \
         JOIN users u ON u.id = m.user_id \
         WHERE m.workspace_id = ?1 \
         ORDER BY m.joined_at ASC, u.id ASC",
    )
    .bind(workspace_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Default name for the workspace created at registration.
pub fn personal_workspace_name(user_name: &str) -> String {
    format!("{}'s workspace", user_name.trim())
}
