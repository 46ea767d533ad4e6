use actix_session::Session;
use actix_web::{HttpRequest, HttpResponse, web};

use crate::auth::{AuthContext, password, session};
use crate::dto::{LoginDto, RegisterDto};
use crate::errors::AppError;
use crate::models::user::{self, NewUser};
use crate::models::workspace;
use crate::notifications::events;
use crate::state::AppState;
use super::client_ip;

/// POST /api/auth/register
///
/// Creates the user and a personal workspace they own, then logs them in.
pub async fn register(
    state: web::Data<AppState>,
    session: Session,
    body: web::Json<RegisterDto>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;

    let password_hash = password::hash_password(&body.password)?;
    let (user_id, workspace_id) = user::create_with_workspace(
        &state.pool,
        &NewUser {
            email: body.email.clone(),
            name: body.name.clone(),
            company: body.company.clone().filter(|c| !c.trim().is_empty()),
            password_hash,
        },
        &workspace::personal_workspace_name(&body.name),
    )
    .await?;

    session::log_in(&session, user_id, Some(workspace_id))?;
    let (ctx, _) = AuthContext::resolve(&state, user_id, Some(workspace_id)).await?;
    log::info!("User {} registered", ctx.user.email);

    events::user_registered(&state, &ctx.user).await;
    Ok(HttpResponse::Created().json(ctx))
}

/// POST /api/auth/login
pub async fn login(
    req: HttpRequest,
    state: web::Data<AppState>,
    session: Session,
    body: web::Json<LoginDto>,
) -> Result<HttpResponse, AppError> {
    // Rate-limit check BEFORE any database access
    let ip = client_ip(&req);
    if state.rate_limiter.is_blocked(ip) {
        log::warn!("Login blocked for {ip}: too many failed attempts");
        return Err(AppError::TooManyRequests);
    }
    body.validate()?;

    let user_id = match user::find_credentials(&state.pool, &body.email).await? {
        Some((id, hash)) if password::verify_password(&body.password, &hash) => id,
        _ => {
            state.rate_limiter.record_failure(ip);
            log::info!("Failed login for {}", user::normalize_email(&body.email));
            return Err(AppError::InvalidCredentials);
        }
    };
    state.rate_limiter.clear(ip);

    session::log_in(&session, user_id, None)?;
    let (ctx, _) = AuthContext::resolve(&state, user_id, None).await?;
    session::set_workspace_id(&session, ctx.workspace_id)?;

    Ok(HttpResponse::Ok().json(ctx))
}

/// POST /api/auth/logout
pub async fn logout(session: Session) -> HttpResponse {
    session::log_out(&session);
    HttpResponse::NoContent().finish()
}

/// GET /api/auth/me
pub async fn me(ctx: AuthContext) -> HttpResponse {
    HttpResponse::Ok().json(ctx)
}
