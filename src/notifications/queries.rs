use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::db::{TIMESTAMP_FORMAT, now_timestamp};
use crate::errors::AppError;
use crate::models::PageParams;
use super::types::*;

const SELECT_NOTIFICATION: &str = "\
    SELECT id, user_id, kind, category, title, message, is_read, action_url, created_at, read_at \
    FROM notifications";

pub async fn create(pool: &SqlitePool, new: &NewNotification) -> Result<Notification, AppError> {
    let id = sqlx::query(
        "INSERT INTO notifications (user_id, kind, category, title, message, action_url, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .bind(new.user_id)
    .bind(new.kind)
    .bind(new.kind.category())
    .bind(&new.title)
    .bind(&new.message)
    .bind(&new.action_url)
    .bind(now_timestamp())
    .execute(pool)
    .await?
    .last_insert_rowid();

    find(pool, id, new.user_id).await?.ok_or(AppError::NotFound)
}

pub async fn find(pool: &SqlitePool, id: i64, user_id: i64) -> Result<Option<Notification>, AppError> {
    let n = sqlx::query_as::<_, Notification>(&format!(
        "{SELECT_NOTIFICATION} WHERE id = ?1 AND user_id = ?2"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(n)
}

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, user_id: i64, query: &NotificationQuery) {
    qb.push(" WHERE user_id = ").push_bind(user_id);
    if query.unread_only {
        qb.push(" AND is_read = 0");
    }
    if let Some(category) = query.category {
        qb.push(" AND category = ").push_bind(category);
    }
}

/// Newest first. Returns (page items, total matching).
pub async fn find_for_user(
    pool: &SqlitePool,
    user_id: i64,
    query: &NotificationQuery,
) -> Result<(Vec<Notification>, i64), AppError> {
    let page = PageParams {
        page: query.page,
        per_page: query.per_page,
    };

    let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM notifications");
    push_filter(&mut count_qb, user_id, query);
    let (total,): (i64,) = count_qb.build_query_as::<(i64,)>().fetch_one(pool).await?;

    let mut qb = QueryBuilder::<Sqlite>::new(SELECT_NOTIFICATION);
    push_filter(&mut qb, user_id, query);
    qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(page.per_page())
        .push(" OFFSET ")
        .push_bind(page.offset());
    let items = qb.build_query_as::<Notification>().fetch_all(pool).await?;

    Ok((items, total))
}

pub async fn count_unread(pool: &SqlitePool, user_id: i64) -> Result<i64, AppError> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND is_read = 0")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

/// Mark one notification read. Marking an already-read one is a no-op.
pub async fn mark_read(pool: &SqlitePool, id: i64, user_id: i64) -> Result<Notification, AppError> {
    sqlx::query(
        "UPDATE notifications SET is_read = 1, read_at = COALESCE(read_at, ?1) \
         WHERE id = ?2 AND user_id = ?3",
    )
    .bind(now_timestamp())
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;
    find(pool, id, user_id).await?.ok_or(AppError::NotFound)
}

/// Returns how many notifications changed.
pub async fn mark_all_read(pool: &SqlitePool, user_id: i64) -> Result<u64, AppError> {
    let result = sqlx::query(
        "UPDATE notifications SET is_read = 1, read_at = ?1 WHERE user_id = ?2 AND is_read = 0",
    )
    .bind(now_timestamp())
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn delete(pool: &SqlitePool, id: i64, user_id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM notifications WHERE id = ?1 AND user_id = ?2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

/// Delete read notifications older than `days`. Returns the number removed.
pub async fn cleanup_read_older_than(pool: &SqlitePool, days: i64) -> Result<u64, AppError> {
    let cutoff = (chrono::Utc::now() - chrono::Duration::days(days))
        .format(TIMESTAMP_FORMAT)
        .to_string();
    let result = sqlx::query("DELETE FROM notifications WHERE is_read = 1 AND created_at < ?1")
        .bind(cutoff)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
