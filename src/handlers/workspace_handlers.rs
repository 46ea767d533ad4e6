use actix_session::Session;
use actix_web::{HttpResponse, web};

use crate::auth::{AuthContext, session};
use crate::dto::{AddMemberDto, CreateWorkspaceDto, SwitchWorkspaceDto};
use crate::errors::AppError;
use crate::models::{user, workspace};
use crate::state::AppState;

/// GET /api/workspaces: every workspace the caller belongs to.
pub async fn list(ctx: AuthContext, state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let memberships = workspace::list_for_user(&state.pool, ctx.user_id()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "active_workspace_id": ctx.workspace_id,
        "workspaces": memberships,
    })))
}

/// POST /api/workspaces: create a workspace and switch to it.
pub async fn create(
    ctx: AuthContext,
    state: web::Data<AppState>,
    session: Session,
    body: web::Json<CreateWorkspaceDto>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;
    let id = workspace::create(&state.pool, &body.name, ctx.user_id()).await?;
    session::set_workspace_id(&session, id)?;

    let membership = workspace::find_membership(&state.pool, id, ctx.user_id())
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Created().json(membership))
}

/// POST /api/workspaces/switch
pub async fn switch(
    ctx: AuthContext,
    state: web::Data<AppState>,
    session: Session,
    body: web::Json<SwitchWorkspaceDto>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;
    let membership = workspace::find_membership(&state.pool, body.workspace_id, ctx.user_id())
        .await?
        .ok_or_else(|| AppError::PermissionDenied("not a member of this workspace".to_string()))?;
    session::set_workspace_id(&session, membership.workspace_id)?;

    let (switched, _) =
        AuthContext::resolve(&state, ctx.user_id(), Some(membership.workspace_id)).await?;
    Ok(HttpResponse::Ok().json(switched))
}

/// GET /api/workspaces/members
pub async fn members(ctx: AuthContext, state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let members = workspace::members(&state.pool, ctx.workspace_id).await?;
    Ok(HttpResponse::Ok().json(members))
}

/// POST /api/workspaces/members: add a registered user to the active
/// workspace. Owners and admins only.
pub async fn add_member(
    ctx: AuthContext,
    state: web::Data<AppState>,
    body: web::Json<AddMemberDto>,
) -> Result<HttpResponse, AppError> {
    ctx.require_admin()?;
    body.validate()?;

    let member = user::find_by_email(&state.pool, &body.email)
        .await?
        .ok_or(AppError::NotFound)?;
    workspace::add_member(&state.pool, ctx.workspace_id, member.id, body.role).await?;
    log::info!(
        "User {} added {} to workspace {} as {:?}",
        ctx.user_id(),
        member.email,
        ctx.workspace_id,
        body.role
    );

    let members = workspace::members(&state.pool, ctx.workspace_id).await?;
    Ok(HttpResponse::Created().json(members))
}
