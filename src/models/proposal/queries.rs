use rand::Rng;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::db::now_timestamp;
use crate::errors::AppError;
use crate::models::signature::{self, Signature, SignatureInput};
use crate::models::PageParams;
use super::types::*;

const SELECT_PROPOSAL: &str = "\
    SELECT id, workspace_id, owner_id, template_id, title, content, client_name, client_email, \
           amount_cents, currency, valid_until, status, access_token, sent_at, viewed_at, \
           signed_at, rejected_at, rejection_reason, created_at, updated_at \
    FROM proposals";

/// Random 32-byte hex token addressing a proposal in the public API.
pub fn generate_access_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

fn invalid_transition(action: &str, status: ProposalStatus) -> AppError {
    AppError::InvalidState(format!(
        "Cannot {action} a proposal with status {}",
        status.as_str()
    ))
}

pub async fn create(pool: &SqlitePool, new: &NewProposal) -> Result<i64, AppError> {
    let now = now_timestamp();
    let id = sqlx::query(
        "INSERT INTO proposals (workspace_id, owner_id, template_id, title, content, client_name, \
         client_email, amount_cents, currency, valid_until, status, access_token, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)",
    )
    .bind(new.workspace_id)
    .bind(new.owner_id)
    .bind(new.template_id)
    .bind(new.title.trim())
    .bind(&new.content)
    .bind(new.client_name.trim())
    .bind(new.client_email.trim().to_lowercase())
    .bind(new.amount_cents)
    .bind(new.currency.trim().to_uppercase())
    .bind(&new.valid_until)
    .bind(ProposalStatus::Draft)
    .bind(generate_access_token())
    .bind(&now)
    .execute(pool)
    .await?
    .last_insert_rowid();
    Ok(id)
}

/// Find a proposal inside a workspace. Proposals of other workspaces read as missing.
pub async fn find_in_workspace(
    pool: &SqlitePool,
    id: i64,
    workspace_id: i64,
) -> Result<Option<Proposal>, AppError> {
    let p = sqlx::query_as::<_, Proposal>(&format!(
        "{SELECT_PROPOSAL} WHERE id = ?1 AND workspace_id = ?2"
    ))
    .bind(id)
    .bind(workspace_id)
    .fetch_optional(pool)
    .await?;
    Ok(p)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Proposal>, AppError> {
    let p = sqlx::query_as::<_, Proposal>(&format!("{SELECT_PROPOSAL} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(p)
}

/// Look up a proposal by its public token. Drafts are never exposed.
pub async fn find_by_token(pool: &SqlitePool, token: &str) -> Result<Option<Proposal>, AppError> {
    let p = sqlx::query_as::<_, Proposal>(&format!(
        "{SELECT_PROPOSAL} WHERE access_token = ?1 AND status != ?2"
    ))
    .bind(token.trim())
    .bind(ProposalStatus::Draft)
    .fetch_optional(pool)
    .await?;
    Ok(p)
}

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, workspace_id: i64, filter: &ProposalFilter) {
    qb.push(" WHERE workspace_id = ").push_bind(workspace_id);
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{search}%");
        qb.push(" AND (title LIKE ")
            .push_bind(pattern.clone())
            .push(" OR client_name LIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Newest first. Returns (page items, total matching).
pub async fn list(
    pool: &SqlitePool,
    workspace_id: i64,
    filter: &ProposalFilter,
    page: &PageParams,
) -> Result<(Vec<Proposal>, i64), AppError> {
    let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM proposals");
    push_filter(&mut count_qb, workspace_id, filter);
    let (total,): (i64,) = count_qb.build_query_as::<(i64,)>().fetch_one(pool).await?;

    let mut qb = QueryBuilder::<Sqlite>::new(SELECT_PROPOSAL);
    push_filter(&mut qb, workspace_id, filter);
    qb.push(" ORDER BY updated_at DESC, id DESC LIMIT ")
        .push_bind(page.per_page())
        .push(" OFFSET ")
        .push_bind(page.offset());
    let items = qb.build_query_as::<Proposal>().fetch_all(pool).await?;

    Ok((items, total))
}

pub async fn count_by_status(pool: &SqlitePool, workspace_id: i64) -> Result<ProposalStats, AppError> {
    let rows: Vec<(ProposalStatus, i64)> = sqlx::query_as(
        "SELECT status, COUNT(*) FROM proposals WHERE workspace_id = ?1 GROUP BY status",
    )
    .bind(workspace_id)
    .fetch_all(pool)
    .await?;

    let mut stats = ProposalStats::default();
    for (status, count) in rows {
        stats.total += count;
        match status {
            ProposalStatus::Draft => stats.draft = count,
            ProposalStatus::Sent => stats.sent = count,
            ProposalStatus::Viewed => stats.viewed = count,
            ProposalStatus::Signed => stats.signed = count,
            ProposalStatus::Rejected => stats.rejected = count,
        }
    }
    Ok(stats)
}

/// Replace fields of a DRAFT proposal. Unset fields keep their value.
///
/// The status guard lives in the UPDATE itself, so a proposal sent
/// concurrently is reported as an invalid edit rather than left untouched.
pub async fn update(
    pool: &SqlitePool,
    id: i64,
    workspace_id: i64,
    changes: &ProposalChanges,
) -> Result<Proposal, AppError> {
    let result = sqlx::query(
        "UPDATE proposals SET title = COALESCE(?1, title), content = COALESCE(?2, content), \
         client_name = COALESCE(?3, client_name), client_email = COALESCE(?4, client_email), \
         amount_cents = COALESCE(?5, amount_cents), currency = COALESCE(?6, currency), \
         valid_until = COALESCE(?7, valid_until), updated_at = ?8 \
         WHERE id = ?9 AND workspace_id = ?10 AND status = ?11",
    )
    .bind(changes.title.as_deref().map(str::trim))
    .bind(changes.content.as_deref())
    .bind(changes.client_name.as_deref().map(str::trim))
    .bind(changes.client_email.as_deref().map(|e| e.trim().to_lowercase()))
    .bind(changes.amount_cents)
    .bind(changes.currency.as_deref().map(|c| c.trim().to_uppercase()))
    .bind(changes.valid_until.as_deref())
    .bind(now_timestamp())
    .bind(id)
    .bind(workspace_id)
    .bind(ProposalStatus::Draft)
    .execute(pool)
    .await?;

    let current = find_in_workspace(pool, id, workspace_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if result.rows_affected() == 0 {
        return Err(invalid_transition("edit", current.status));
    }
    Ok(current)
}

/// Delete a proposal. Signed proposals are kept as a record of the agreement.
pub async fn delete(pool: &SqlitePool, id: i64, workspace_id: i64) -> Result<(), AppError> {
    let current = find_in_workspace(pool, id, workspace_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if current.status == ProposalStatus::Signed {
        return Err(invalid_transition("delete", current.status));
    }
    sqlx::query("DELETE FROM proposals WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Copy a proposal into a new DRAFT owned by `owner_id`.
pub async fn duplicate(
    pool: &SqlitePool,
    id: i64,
    workspace_id: i64,
    owner_id: i64,
) -> Result<i64, AppError> {
    let source = find_in_workspace(pool, id, workspace_id)
        .await?
        .ok_or(AppError::NotFound)?;
    create(
        pool,
        &NewProposal {
            workspace_id,
            owner_id,
            template_id: source.template_id,
            title: format!("{} (copy)", source.title),
            content: source.content,
            client_name: source.client_name,
            client_email: source.client_email,
            amount_cents: source.amount_cents,
            currency: source.currency,
            valid_until: source.valid_until,
        },
    )
    .await
}

/// DRAFT -> SENT. Resending an open proposal keeps its status. Returns the
/// proposal after the change and whether this was the first send.
pub async fn mark_sent(
    pool: &SqlitePool,
    id: i64,
    workspace_id: i64,
) -> Result<(Proposal, bool), AppError> {
    let current = find_in_workspace(pool, id, workspace_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let now = now_timestamp();

    let first_send = match current.status {
        ProposalStatus::Draft => {
            let result = sqlx::query(
                "UPDATE proposals SET status = ?1, sent_at = ?2, updated_at = ?2 \
                 WHERE id = ?3 AND status = ?4",
            )
            .bind(ProposalStatus::Sent)
            .bind(&now)
            .bind(id)
            .bind(ProposalStatus::Draft)
            .execute(pool)
            .await?;
            if result.rows_affected() == 0 {
                return Err(AppError::Conflict("Proposal changed concurrently".to_string()));
            }
            true
        }
        status if status.is_open() => {
            sqlx::query("UPDATE proposals SET sent_at = ?1, updated_at = ?1 WHERE id = ?2")
                .bind(&now)
                .bind(id)
                .execute(pool)
                .await?;
            false
        }
        status => return Err(invalid_transition("send", status)),
    };

    let updated = find_by_id(pool, id).await?.ok_or(AppError::NotFound)?;
    Ok((updated, first_send))
}

/// Record a recipient view. Only the first view of a SENT proposal changes
/// anything; returns true in that case.
pub async fn mark_viewed(pool: &SqlitePool, id: i64) -> Result<bool, AppError> {
    let now = now_timestamp();
    let result = sqlx::query(
        "UPDATE proposals SET status = ?1, viewed_at = ?2, updated_at = ?2 \
         WHERE id = ?3 AND status = ?4",
    )
    .bind(ProposalStatus::Viewed)
    .bind(&now)
    .bind(id)
    .bind(ProposalStatus::Sent)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// SENT/VIEWED -> SIGNED, storing the signature in the same transaction.
pub async fn mark_signed(
    pool: &SqlitePool,
    id: i64,
    input: &SignatureInput,
) -> Result<(Proposal, Signature), AppError> {
    let current = find_by_id(pool, id).await?.ok_or(AppError::NotFound)?;
    if !current.status.is_open() {
        return Err(invalid_transition("sign", current.status));
    }

    let now = now_timestamp();
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "UPDATE proposals SET status = ?1, signed_at = ?2, updated_at = ?2 \
         WHERE id = ?3 AND status IN (?4, ?5)",
    )
    .bind(ProposalStatus::Signed)
    .bind(&now)
    .bind(id)
    .bind(ProposalStatus::Sent)
    .bind(ProposalStatus::Viewed)
    .execute(&mut *tx)
    .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::Conflict("Proposal changed concurrently".to_string()));
    }

    let sig = signature::insert(&mut tx, &current, input, &now).await?;
    tx.commit().await?;

    let updated = find_by_id(pool, id).await?.ok_or(AppError::NotFound)?;
    Ok((updated, sig))
}

/// SENT/VIEWED -> REJECTED with an optional reason.
pub async fn mark_rejected(
    pool: &SqlitePool,
    id: i64,
    reason: Option<&str>,
) -> Result<Proposal, AppError> {
    let current = find_by_id(pool, id).await?.ok_or(AppError::NotFound)?;
    if !current.status.is_open() {
        return Err(invalid_transition("reject", current.status));
    }

    let reason = reason.map(str::trim).filter(|r| !r.is_empty());
    let now = now_timestamp();
    let result = sqlx::query(
        "UPDATE proposals SET status = ?1, rejected_at = ?2, rejection_reason = ?3, updated_at = ?2 \
         WHERE id = ?4 AND status IN (?5, ?6)",
    )
    .bind(ProposalStatus::Rejected)
    .bind(&now)
    .bind(reason)
    .bind(id)
    .bind(ProposalStatus::Sent)
    .bind(ProposalStatus::Viewed)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::Conflict("Proposal changed concurrently".to_string()));
    }

    find_by_id(pool, id).await?.ok_or(AppError::NotFound)
}

/// Public view of a proposal, joined with its sender.
pub async fn to_public(pool: &SqlitePool, proposal: &Proposal) -> Result<PublicProposal, AppError> {
    let sender = crate::models::user::find_by_id(pool, proposal.owner_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(PublicProposal {
        title: proposal.title.clone(),
        content: proposal.content.clone(),
        client_name: proposal.client_name.clone(),
        amount_cents: proposal.amount_cents,
        currency: proposal.currency.clone(),
        valid_until: proposal.valid_until.clone(),
        status: proposal.status,
        sender_name: sender.name,
        sender_company: sender.company,
        signed_at: proposal.signed_at.clone(),
        rejected_at: proposal.rejected_at.clone(),
    })
}
