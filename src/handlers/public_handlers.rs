//! Recipient-facing endpoints, addressed by the proposal's access token.
//! No session is involved; drafts are invisible here.

use actix_web::{HttpRequest, HttpResponse, http::header, web};
use serde::Serialize;

use crate::dto::{RejectProposalDto, SignProposalDto};
use crate::errors::AppError;
use crate::models::proposal::{self, Proposal};
use crate::models::signature::{self, SignatureInput};
use crate::notifications::events;
use crate::state::AppState;
use super::{client_ip, optional_json};

const USER_AGENT_MAX: usize = 512;

async fn by_token(state: &AppState, token: &str) -> Result<Proposal, AppError> {
    proposal::find_by_token(&state.pool, token)
        .await?
        .ok_or(AppError::NotFound)
}

/// GET /api/public/proposals/{token}
///
/// The first view of a SENT proposal marks it VIEWED and tells the owner.
pub async fn view(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let mut found = by_token(&state, &path).await?;

    if proposal::mark_viewed(&state.pool, found.id).await? {
        found = proposal::find_by_id(&state.pool, found.id)
            .await?
            .ok_or(AppError::NotFound)?;
        events::proposal_viewed(&state, &found).await;
    }

    let public = proposal::to_public(&state.pool, &found).await?;
    Ok(HttpResponse::Ok().json(public))
}

#[derive(Serialize)]
struct SignResponse {
    status: proposal::ProposalStatus,
    signed_at: Option<String>,
    signature_hash: String,
}

/// POST /api/public/proposals/{token}/sign
pub async fn sign(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<SignProposalDto>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;
    let found = by_token(&state, &path).await?;
    let body = body.into_inner();

    let user_agent = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|ua| ua.chars().take(USER_AGENT_MAX).collect::<String>());
    let input = SignatureInput {
        signer_name: body.signer_name.trim().to_string(),
        signer_email: body.signer_email,
        signature_data: body.signature_data,
        ip_address: Some(client_ip(&req).to_string()),
        user_agent,
    };

    let (signed, sig) = proposal::mark_signed(&state.pool, found.id, &input).await?;
    log::info!("Proposal {} signed by {}", signed.id, sig.signer_email);
    events::proposal_signed(&state, &signed, &sig).await;

    Ok(HttpResponse::Ok().json(SignResponse {
        status: signed.status,
        signed_at: signed.signed_at,
        signature_hash: sig.signature_hash,
    }))
}

/// POST /api/public/proposals/{token}/reject
pub async fn reject(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let body: RejectProposalDto = optional_json(&body)?;
    body.validate()?;
    let found = by_token(&state, &path).await?;

    let rejected = proposal::mark_rejected(&state.pool, found.id, body.reason.as_deref()).await?;
    log::info!("Proposal {} rejected by recipient", rejected.id);
    events::proposal_rejected(&state, &rejected).await;

    let public = proposal::to_public(&state.pool, &rejected).await?;
    Ok(HttpResponse::Ok().json(public))
}

/// GET /api/public/proposals/{token}/signature
pub async fn signature_status(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let found = by_token(&state, &path).await?;
    let sig = signature::find_for_proposal(&state.pool, found.id).await?;
    Ok(HttpResponse::Ok().json(signature::verify(&found, sig.as_ref(), None)))
}
