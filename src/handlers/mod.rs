pub mod auth_handlers;
pub mod notification_handlers;
pub mod profile_handlers;
pub mod proposal_handlers;
pub mod public_handlers;
pub mod signature_handlers;
pub mod template_handlers;
pub mod workspace_handlers;

use actix_web::{HttpRequest, HttpResponse, middleware::from_fn, web};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::auth::middleware::{require_auth, require_json_content_type};
use crate::errors::AppError;
use crate::state::AppState;

const JSON_LIMIT: usize = 1 << 20;

#[derive(Serialize)]
struct Health {
    status: &'static str,
    database: bool,
    mail_provider: &'static str,
}

/// GET /api/health
pub async fn health(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let database = sqlx::query("SELECT 1").execute(&state.pool).await.is_ok();
    let body = Health {
        status: if database { "ok" } else { "degraded" },
        database,
        mail_provider: state.mailer.provider(),
    };
    Ok(if database {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    })
}

/// Client address for throttling and signature records.
pub(crate) fn client_ip(req: &HttpRequest) -> std::net::IpAddr {
    req.peer_addr()
        .map(|addr| addr.ip())
        .unwrap_or(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED))
}

/// Body for endpoints where the payload is optional: an empty body yields
/// `T::default()`, anything else must be valid JSON for `T`.
pub(crate) fn optional_json<T: DeserializeOwned + Default>(body: &web::Bytes) -> Result<T, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::Validation(vec![format!("Invalid JSON body: {e}")]))
}

/// Register every `/api` route. Public routes come first; everything else
/// sits behind `require_auth`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    // Malformed bodies get the same JSON error shape as failed validation.
    cfg.app_data(
        web::JsonConfig::default()
            .limit(JSON_LIMIT)
            .error_handler(|err, _req| AppError::Validation(vec![err.to_string()]).into()),
    );
    cfg.service(
        web::scope("/api")
            .wrap(from_fn(require_json_content_type))
            .route("/health", web::get().to(health))
            // Public: account
            .route("/auth/register", web::post().to(auth_handlers::register))
            .route("/auth/login", web::post().to(auth_handlers::login))
            .route("/auth/logout", web::post().to(auth_handlers::logout))
            // Public: recipient access by token
            .route("/public/proposals/{token}", web::get().to(public_handlers::view))
            .route("/public/proposals/{token}/sign", web::post().to(public_handlers::sign))
            .route("/public/proposals/{token}/reject", web::post().to(public_handlers::reject))
            .route(
                "/public/proposals/{token}/signature",
                web::get().to(public_handlers::signature_status),
            )
            // Protected
            .service(
                web::scope("")
                    .wrap(from_fn(require_auth))
                    .route("/auth/me", web::get().to(auth_handlers::me))
                    // Profile
                    .route("/profile", web::get().to(profile_handlers::get))
                    .route("/profile", web::put().to(profile_handlers::update))
                    .route("/profile/password", web::put().to(profile_handlers::change_password))
                    // Workspaces
                    .route("/workspaces", web::get().to(workspace_handlers::list))
                    .route("/workspaces", web::post().to(workspace_handlers::create))
                    .route("/workspaces/switch", web::post().to(workspace_handlers::switch))
                    .route("/workspaces/members", web::get().to(workspace_handlers::members))
                    .route("/workspaces/members", web::post().to(workspace_handlers::add_member))
                    // Templates
                    .route("/templates", web::get().to(template_handlers::list))
                    .route("/templates", web::post().to(template_handlers::create))
                    .route("/templates/{id}", web::get().to(template_handlers::get))
                    .route("/templates/{id}", web::put().to(template_handlers::update))
                    .route("/templates/{id}", web::delete().to(template_handlers::delete))
                    .route("/templates/{id}/default", web::post().to(template_handlers::set_default))
                    // Proposals: /stats BEFORE /{id}
                    .route("/proposals", web::get().to(proposal_handlers::crud::list))
                    .route("/proposals", web::post().to(proposal_handlers::crud::create))
                    .route("/proposals/stats", web::get().to(proposal_handlers::crud::stats))
                    .route("/proposals/{id}", web::get().to(proposal_handlers::crud::get))
                    .route("/proposals/{id}", web::put().to(proposal_handlers::crud::update))
                    .route("/proposals/{id}", web::delete().to(proposal_handlers::crud::delete))
                    .route("/proposals/{id}/duplicate", web::post().to(proposal_handlers::crud::duplicate))
                    .route("/proposals/{id}/send", web::post().to(proposal_handlers::workflow::send))
                    .route("/proposals/{id}/signature", web::get().to(proposal_handlers::workflow::signature))
                    // Signatures
                    .route("/signatures/verify", web::post().to(signature_handlers::verify))
                    // Notifications: fixed paths BEFORE /{id}
                    .route("/notifications", web::get().to(notification_handlers::list))
                    .route("/notifications/unread-count", web::get().to(notification_handlers::unread_count))
                    .route("/notifications/read-all", web::post().to(notification_handlers::mark_all_read))
                    .route("/notifications/ws", web::get().to(notification_handlers::ws::ws_connect))
                    .route("/notifications/{id}/read", web::post().to(notification_handlers::mark_read))
                    .route("/notifications/{id}", web::delete().to(notification_handlers::delete)),
            ),
    );
}
