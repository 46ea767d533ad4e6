pub mod ws;

use actix_web::{HttpResponse, web};

use crate::auth::AuthContext;
use crate::errors::AppError;
use crate::models::{Page, PageParams};
use crate::notifications::{NotificationQuery, events, queries};
use crate::state::AppState;

/// GET /api/notifications?unread_only=&category=&page=&per_page=
pub async fn list(
    ctx: AuthContext,
    state: web::Data<AppState>,
    query: web::Query<NotificationQuery>,
) -> Result<HttpResponse, AppError> {
    let query = query.into_inner();
    let (items, total) = queries::find_for_user(&state.pool, ctx.user_id(), &query).await?;
    let params = PageParams {
        page: query.page,
        per_page: query.per_page,
    };
    Ok(HttpResponse::Ok().json(Page::new(items, &params, total)))
}

/// GET /api/notifications/unread-count
pub async fn unread_count(ctx: AuthContext, state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let count = queries::count_unread(&state.pool, ctx.user_id()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "unread_count": count })))
}

/// POST /api/notifications/{id}/read
pub async fn mark_read(
    ctx: AuthContext,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let notification = queries::mark_read(&state.pool, path.into_inner(), ctx.user_id()).await?;
    events::refresh_count(&state, ctx.user_id()).await;
    Ok(HttpResponse::Ok().json(notification))
}

/// POST /api/notifications/read-all
pub async fn mark_all_read(ctx: AuthContext, state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let updated = queries::mark_all_read(&state.pool, ctx.user_id()).await?;
    events::refresh_count(&state, ctx.user_id()).await;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "updated": updated })))
}

/// DELETE /api/notifications/{id}
pub async fn delete(
    ctx: AuthContext,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    queries::delete(&state.pool, path.into_inner(), ctx.user_id()).await?;
    events::refresh_count(&state, ctx.user_id()).await;
    Ok(HttpResponse::NoContent().finish())
}
