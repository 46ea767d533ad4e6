use actix_web::{HttpResponse, web};
use serde::Deserialize;

use crate::auth::AuthContext;
use crate::dto::{CreateProposalDto, UpdateProposalDto};
use crate::errors::AppError;
use crate::models::proposal::{self, NewProposal, ProposalChanges, ProposalFilter, ProposalStatus};
use crate::models::template::{self, Template};
use crate::models::{Page, PageParams};
use crate::state::AppState;

const DEFAULT_CURRENCY: &str = "USD";
const UNTITLED: &str = "Untitled proposal";

#[derive(Deserialize)]
pub struct ListQuery {
    page: Option<i64>,
    per_page: Option<i64>,
    status: Option<String>,
    q: Option<String>,
}

/// GET /api/proposals?status=&q=&page=&per_page=
pub async fn list(
    ctx: AuthContext,
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, AppError> {
    let status = match query.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(ProposalStatus::parse(raw).ok_or_else(|| {
            AppError::Validation(vec![format!("Unknown proposal status '{raw}'")])
        })?),
        None => None,
    };
    let filter = ProposalFilter {
        status,
        search: query.q.clone(),
    };
    let params = PageParams {
        page: query.page,
        per_page: query.per_page,
    };

    let (items, total) = proposal::list(&state.pool, ctx.workspace_id, &filter, &params).await?;
    Ok(HttpResponse::Ok().json(Page::new(items, &params, total)))
}

/// GET /api/proposals/stats
pub async fn stats(ctx: AuthContext, state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let stats = proposal::count_by_status(&state.pool, ctx.workspace_id).await?;
    Ok(HttpResponse::Ok().json(stats))
}

/// GET /api/proposals/{id}
pub async fn get(
    ctx: AuthContext,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let found = proposal::find_in_workspace(&state.pool, path.into_inner(), ctx.workspace_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(found))
}

/// Template that seeds a new proposal: the one asked for, else the user's
/// default when no content was supplied.
async fn seed_template(
    state: &AppState,
    user_id: i64,
    template_id: Option<i64>,
    has_content: bool,
) -> Result<Option<Template>, AppError> {
    match template_id {
        Some(id) => {
            let found = template::find(&state.pool, id, user_id)
                .await?
                .ok_or_else(|| AppError::Validation(vec!["Template not found".to_string()]))?;
            if !found.is_active {
                return Err(AppError::Validation(vec![
                    "An inactive template cannot be used for new proposals".to_string(),
                ]));
            }
            Ok(Some(found))
        }
        None if !has_content => template::find_default(&state.pool, user_id).await,
        None => Ok(None),
    }
}

/// POST /api/proposals: new DRAFT in the active workspace.
pub async fn create(
    ctx: AuthContext,
    state: web::Data<AppState>,
    body: web::Json<CreateProposalDto>,
) -> Result<HttpResponse, AppError> {
    ctx.require_editor()?;
    body.validate()?;
    let body = body.into_inner();

    let content = body.content.filter(|c| !c.trim().is_empty());
    let seed = seed_template(&state, ctx.user_id(), body.template_id, content.is_some()).await?;

    let title = body
        .title
        .filter(|t| !t.trim().is_empty())
        .or_else(|| seed.as_ref().map(|t| t.name.clone()))
        .unwrap_or_else(|| UNTITLED.to_string());
    let content = content
        .or_else(|| seed.as_ref().map(|t| t.content.clone()))
        .unwrap_or_default();

    let id = proposal::create(
        &state.pool,
        &NewProposal {
            workspace_id: ctx.workspace_id,
            owner_id: ctx.user_id(),
            template_id: seed.as_ref().map(|t| t.id),
            title,
            content,
            client_name: body.client_name,
            client_email: body.client_email,
            amount_cents: body.amount_cents,
            currency: body.currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            valid_until: body.valid_until,
        },
    )
    .await?;

    let created = proposal::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::NotFound)?;
    log::info!("Proposal {id} created in workspace {}", ctx.workspace_id);
    Ok(HttpResponse::Created().json(created))
}

/// PUT /api/proposals/{id}: drafts only.
pub async fn update(
    ctx: AuthContext,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<UpdateProposalDto>,
) -> Result<HttpResponse, AppError> {
    ctx.require_editor()?;
    body.validate()?;
    let body = body.into_inner();

    let updated = proposal::update(
        &state.pool,
        path.into_inner(),
        ctx.workspace_id,
        &ProposalChanges {
            title: body.title,
            content: body.content,
            client_name: body.client_name,
            client_email: body.client_email,
            amount_cents: body.amount_cents,
            currency: body.currency,
            valid_until: body.valid_until,
        },
    )
    .await?;
    Ok(HttpResponse::Ok().json(updated))
}

/// DELETE /api/proposals/{id}
pub async fn delete(
    ctx: AuthContext,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    ctx.require_editor()?;
    let id = path.into_inner();
    proposal::delete(&state.pool, id, ctx.workspace_id).await?;
    log::info!("Proposal {id} deleted by user {}", ctx.user_id());
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/proposals/{id}/duplicate
pub async fn duplicate(
    ctx: AuthContext,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    ctx.require_editor()?;
    let id = proposal::duplicate(&state.pool, path.into_inner(), ctx.workspace_id, ctx.user_id()).await?;
    let copy = proposal::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Created().json(copy))
}
