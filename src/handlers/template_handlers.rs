use actix_web::{HttpResponse, web};

use crate::auth::AuthContext;
use crate::dto::{CreateTemplateDto, UpdateTemplateDto};
use crate::errors::AppError;
use crate::models::template::{self, NewTemplate, Template, TemplateChanges};
use crate::notifications::events;
use crate::state::AppState;

/// The caller's templates, served from the template cache when warm.
pub(crate) async fn cached_list(state: &AppState, user_id: i64) -> Result<Vec<Template>, AppError> {
    if let Some(templates) = state.templates.get(&user_id) {
        return Ok(templates);
    }
    let templates = template::list_for_user(&state.pool, user_id).await?;
    state.templates.set(user_id, templates.clone(), None);
    Ok(templates)
}

/// GET /api/templates
pub async fn list(ctx: AuthContext, state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let templates = cached_list(&state, ctx.user_id()).await?;
    Ok(HttpResponse::Ok().json(templates))
}

/// GET /api/templates/{id}
pub async fn get(
    ctx: AuthContext,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let found = template::find(&state.pool, id, ctx.user_id())
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(found))
}

/// POST /api/templates
pub async fn create(
    ctx: AuthContext,
    state: web::Data<AppState>,
    body: web::Json<CreateTemplateDto>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;
    let body = body.into_inner();

    let id = template::create(
        &state.pool,
        ctx.user_id(),
        &NewTemplate {
            name: body.name,
            description: body.description.unwrap_or_default(),
            content: body.content,
            is_default: body.is_default.unwrap_or(false),
            is_active: body.is_active.unwrap_or(true),
        },
    )
    .await?;
    state.templates.delete(&ctx.user_id());

    let created = template::find(&state.pool, id, ctx.user_id())
        .await?
        .ok_or(AppError::NotFound)?;
    events::template_created(&state, &created).await;

    Ok(HttpResponse::Created().json(created))
}

/// PUT /api/templates/{id}
pub async fn update(
    ctx: AuthContext,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<UpdateTemplateDto>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;
    let body = body.into_inner();

    let updated = template::update(
        &state.pool,
        path.into_inner(),
        ctx.user_id(),
        &TemplateChanges {
            name: body.name,
            description: body.description,
            content: body.content,
            is_default: body.is_default,
            is_active: body.is_active,
        },
    )
    .await?;
    state.templates.delete(&ctx.user_id());

    Ok(HttpResponse::Ok().json(updated))
}

/// DELETE /api/templates/{id}
///
/// Proposals created from the template keep their content.
pub async fn delete(
    ctx: AuthContext,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    template::delete(&state.pool, path.into_inner(), ctx.user_id()).await?;
    state.templates.delete(&ctx.user_id());
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/templates/{id}/default
pub async fn set_default(
    ctx: AuthContext,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let updated = template::set_default(&state.pool, path.into_inner(), ctx.user_id()).await?;
    state.templates.delete(&ctx.user_id());
    Ok(HttpResponse::Ok().json(updated))
}
