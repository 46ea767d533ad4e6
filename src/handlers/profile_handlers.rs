use actix_web::{HttpResponse, web};

use crate::auth::{AuthContext, password};
use crate::dto::{ChangePasswordDto, UpdateProfileDto};
use crate::errors::AppError;
use crate::models::user::{self, ProfileChanges};
use crate::state::AppState;

/// GET /api/profile
pub async fn get(ctx: AuthContext) -> HttpResponse {
    HttpResponse::Ok().json(ctx.user)
}

/// PUT /api/profile
pub async fn update(
    ctx: AuthContext,
    state: web::Data<AppState>,
    body: web::Json<UpdateProfileDto>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;
    let body = body.into_inner();

    let updated = user::update_profile(
        &state.pool,
        ctx.user_id(),
        &ProfileChanges {
            name: body.name,
            email: body.email,
            company: body.company,
            phone: body.phone,
        },
    )
    .await?;
    state.identities.delete(&updated.id);

    Ok(HttpResponse::Ok().json(updated))
}

/// PUT /api/profile/password
pub async fn change_password(
    ctx: AuthContext,
    state: web::Data<AppState>,
    body: web::Json<ChangePasswordDto>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;

    let current_hash = user::find_password_hash(&state.pool, ctx.user_id())
        .await?
        .ok_or(AppError::NotFound)?;
    if !password::verify_password(&body.current_password, &current_hash) {
        return Err(AppError::Validation(vec![
            "Current password is incorrect".to_string(),
        ]));
    }

    let new_hash = password::hash_password(&body.new_password)?;
    user::update_password(&state.pool, ctx.user_id(), &new_hash).await?;
    log::info!("User {} changed their password", ctx.user_id());

    Ok(HttpResponse::NoContent().finish())
}
