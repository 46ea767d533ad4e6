use sqlx::{SqliteConnection, SqlitePool};

use crate::db::now_timestamp;
use crate::errors::AppError;
use super::types::*;

const SELECT_TEMPLATE: &str = "\
    SELECT id, user_id, name, description, content, is_default, is_active, created_at, updated_at \
    FROM templates";

fn inactive_default_error() -> AppError {
    AppError::Validation(vec!["An inactive template cannot be the default".to_string()])
}

/// Create a template. When `is_default` is set, any other default of the
/// same user is cleared in the same transaction.
pub async fn create(pool: &SqlitePool, user_id: i64, new: &NewTemplate) -> Result<i64, AppError> {
    if new.is_default && !new.is_active {
        return Err(inactive_default_error());
    }

    let now = now_timestamp();
    let mut tx = pool.begin().await?;
    if new.is_default {
        clear_default(&mut tx, user_id).await?;
    }

    let id = sqlx::query(
        "INSERT INTO templates (user_id, name, description, content, is_default, is_active, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
    )
    .bind(user_id)
    .bind(new.name.trim())
    .bind(new.description.trim())
    .bind(&new.content)
    .bind(new.is_default)
    .bind(new.is_active)
    .bind(&now)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    tx.commit().await?;
    Ok(id)
}

/// Find a template owned by `user_id`. Other users' templates read as missing.
pub async fn find(pool: &SqlitePool, id: i64, user_id: i64) -> Result<Option<Template>, AppError> {
    let t = sqlx::query_as::<_, Template>(&format!(
        "{SELECT_TEMPLATE} WHERE id = ?1 AND user_id = ?2"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(t)
}

/// Default template first, then by name.
pub async fn list_for_user(pool: &SqlitePool, user_id: i64) -> Result<Vec<Template>, AppError> {
    let rows = sqlx::query_as::<_, Template>(&format!(
        "{SELECT_TEMPLATE} WHERE user_id = ?1 ORDER BY is_default DESC, name COLLATE NOCASE ASC, id ASC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_default(pool: &SqlitePool, user_id: i64) -> Result<Option<Template>, AppError> {
    let t = sqlx::query_as::<_, Template>(&format!(
        "{SELECT_TEMPLATE} WHERE user_id = ?1 AND is_default = 1 AND is_active = 1"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(t)
}

pub async fn update(
    pool: &SqlitePool,
    id: i64,
    user_id: i64,
    changes: &TemplateChanges,
) -> Result<Template, AppError> {
    let current = find(pool, id, user_id).await?.ok_or(AppError::NotFound)?;

    let is_active = changes.is_active.unwrap_or(current.is_active);
    // Deactivating a default template also drops its default flag.
    let is_default = match changes.is_default {
        Some(true) if !is_active => return Err(inactive_default_error()),
        Some(flag) => flag,
        None => current.is_default && is_active,
    };

    let mut tx = pool.begin().await?;
    if is_default && !current.is_default {
        clear_default(&mut tx, user_id).await?;
    }

    sqlx::query(
        "UPDATE templates SET name = ?1, description = ?2, content = ?3, is_default = ?4, \
         is_active = ?5, updated_at = ?6 WHERE id = ?7",
    )
    .bind(changes.name.as_deref().map(str::trim).unwrap_or(&current.name))
    .bind(changes.description.as_deref().map(str::trim).unwrap_or(&current.description))
    .bind(changes.content.as_deref().unwrap_or(&current.content))
    .bind(is_default)
    .bind(is_active)
    .bind(now_timestamp())
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    find(pool, id, user_id).await?.ok_or(AppError::NotFound)
}

/// Make `id` the user's only default template.
pub async fn set_default(pool: &SqlitePool, id: i64, user_id: i64) -> Result<Template, AppError> {
    let current = find(pool, id, user_id).await?.ok_or(AppError::NotFound)?;
    if !current.is_active {
        return Err(inactive_default_error());
    }

    let mut tx = pool.begin().await?;
    clear_default(&mut tx, user_id).await?;
    sqlx::query("UPDATE templates SET is_default = 1, updated_at = ?1 WHERE id = ?2")
        .bind(now_timestamp())
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    find(pool, id, user_id).await?.ok_or(AppError::NotFound)
}

pub async fn delete(pool: &SqlitePool, id: i64, user_id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM templates WHERE id = ?1 AND user_id = ?2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

async fn clear_default(conn: &mut SqliteConnection, user_id: i64) -> Result<(), AppError> {
    sqlx::query("UPDATE templates SET is_default = 0 WHERE user_id = ?1 AND is_default = 1")
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(())
}
