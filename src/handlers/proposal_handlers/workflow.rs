use actix_web::{HttpResponse, web};
use serde::Serialize;

use crate::auth::AuthContext;
use crate::dto::SendProposalDto;
use crate::errors::AppError;
use crate::handlers::optional_json;
use crate::mail::EmailResult;
use crate::models::proposal::{self, Proposal};
use crate::models::signature::{self, Signature, Verification};
use crate::notifications::events;
use crate::state::AppState;

#[derive(Serialize)]
struct SendResponse {
    proposal: Proposal,
    /// Recipient link, so the sender can share it by other means.
    public_url: String,
    email: EmailResult,
}

/// POST /api/proposals/{id}/send
///
/// DRAFT proposals become SENT; SENT or VIEWED ones are resent without a
/// status change. The body is optional.
pub async fn send(
    ctx: AuthContext,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    ctx.require_editor()?;
    let body: SendProposalDto = optional_json(&body)?;
    body.validate()?;

    let (sent, first_send) = proposal::mark_sent(&state.pool, path.into_inner(), ctx.workspace_id).await?;
    let message = body.message.as_deref().map(str::trim).filter(|m| !m.is_empty());
    let email = events::proposal_sent(&state, &ctx.user, &sent, message, first_send).await;

    Ok(HttpResponse::Ok().json(SendResponse {
        public_url: state.public_link(&sent.access_token),
        proposal: sent,
        email,
    }))
}

#[derive(Serialize)]
struct SignatureResponse {
    signature: Option<Signature>,
    verification: Verification,
}

/// GET /api/proposals/{id}/signature
pub async fn signature(
    ctx: AuthContext,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let found = proposal::find_in_workspace(&state.pool, path.into_inner(), ctx.workspace_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let sig = signature::find_for_proposal(&state.pool, found.id).await?;
    let verification = signature::verify(&found, sig.as_ref(), None);

    Ok(HttpResponse::Ok().json(SignatureResponse {
        signature: sig,
        verification,
    }))
}
