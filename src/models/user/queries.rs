use sqlx::{SqliteConnection, SqlitePool};

use crate::db::now_timestamp;
use crate::errors::AppError;
use crate::models::workspace;
use super::types::{NewUser, ProfileChanges, User};

const SELECT_USER: &str =
    "SELECT id, email, name, company, phone, created_at, updated_at FROM users";

/// Emails are stored and compared lowercase.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub async fn create(pool: &SqlitePool, user: &NewUser) -> Result<i64, AppError> {
    let email = available_email(pool, &user.email).await?;
    let mut conn = pool.acquire().await?;
    insert(&mut conn, &email, user).await
}

/// Create the user together with a workspace they own, atomically: either
/// both rows exist afterwards or neither does. Returns (user id, workspace id).
pub async fn create_with_workspace(
    pool: &SqlitePool,
    user: &NewUser,
    workspace_name: &str,
) -> Result<(i64, i64), AppError> {
    let email = available_email(pool, &user.email).await?;
    let mut tx = pool.begin().await?;
    let user_id = insert(&mut tx, &email, user).await?;
    let workspace_id = workspace::insert_with_owner(&mut tx, workspace_name, user_id).await?;
    tx.commit().await?;
    Ok((user_id, workspace_id))
}

async fn available_email(pool: &SqlitePool, raw: &str) -> Result<String, AppError> {
    let email = normalize_email(raw);
    if email_taken(pool, &email, None).await? {
        return Err(AppError::Conflict("Email is already registered".to_string()));
    }
    Ok(email)
}

async fn insert(conn: &mut SqliteConnection, email: &str, user: &NewUser) -> Result<i64, AppError> {
    let now = now_timestamp();
    let result = sqlx::query(
        "INSERT INTO users (email, name, company, password_hash, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
    )
    .bind(email)
    .bind(user.name.trim())
    .bind(user.company.as_deref().map(str::trim))
    .bind(&user.password_hash)
    .bind(&now)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!("{SELECT_USER} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!("{SELECT_USER} WHERE email = ?1"))
        .bind(normalize_email(email))
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// Returns (user id, password hash) for login.
pub async fn find_credentials(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<(i64, String)>, AppError> {
    let row: Option<(i64, String)> =
        sqlx::query_as("SELECT id, password_hash FROM users WHERE email = ?1")
            .bind(normalize_email(email))
            .fetch_optional(pool)
            .await?;
    Ok(row)
}

pub async fn find_password_hash(pool: &SqlitePool, id: i64) -> Result<Option<String>, AppError> {
    let row: Option<(String,)> = sqlx::query_as("SELECT password_hash FROM users WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| r.0))
}

/// True if another user (not `except_id`) already uses `email`.
pub async fn email_taken(
    pool: &SqlitePool,
    email: &str,
    except_id: Option<i64>,
) -> Result<bool, AppError> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ?1 AND id != ?2")
            .bind(normalize_email(email))
            .bind(except_id.unwrap_or(0))
            .fetch_one(pool)
            .await?;
    Ok(count > 0)
}

/// Apply the set fields of `changes`. Empty company/phone strings clear the column.
pub async fn update_profile(
    pool: &SqlitePool,
    id: i64,
    changes: &ProfileChanges,
) -> Result<User, AppError> {
    let current = find_by_id(pool, id).await?.ok_or(AppError::NotFound)?;

    let email = match &changes.email {
        Some(e) => {
            let e = normalize_email(e);
            if email_taken(pool, &e, Some(id)).await? {
                return Err(AppError::Conflict("Email is already registered".to_string()));
            }
            e
        }
        None => current.email,
    };
    let name = changes
        .name
        .as_deref()
        .map(|n| n.trim().to_string())
        .unwrap_or(current.name);
    let company = match &changes.company {
        Some(c) => non_empty(c),
        None => current.company,
    };
    let phone = match &changes.phone {
        Some(p) => non_empty(p),
        None => current.phone,
    };

    sqlx::query(
        "UPDATE users SET email = ?1, name = ?2, company = ?3, phone = ?4, updated_at = ?5 \
         WHERE id = ?6",
    )
    .bind(&email)
    .bind(&name)
    .bind(&company)
    .bind(&phone)
    .bind(now_timestamp())
    .bind(id)
    .execute(pool)
    .await?;

    find_by_id(pool, id).await?.ok_or(AppError::NotFound)
}

pub async fn update_password(pool: &SqlitePool, id: i64, password_hash: &str) -> Result<(), AppError> {
    sqlx::query("UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(password_hash)
        .bind(now_timestamp())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
