use actix_web::{HttpResponse, web};

use crate::auth::AuthContext;
use crate::dto::VerifySignatureDto;
use crate::errors::AppError;
use crate::models::{proposal, signature};
use crate::state::AppState;

/// POST /api/signatures/verify
///
/// Recomputes the hashes of a signed proposal in the caller's workspace and
/// optionally compares them against a hash the caller holds.
pub async fn verify(
    ctx: AuthContext,
    state: web::Data<AppState>,
    body: web::Json<VerifySignatureDto>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;
    let found = proposal::find_in_workspace(&state.pool, body.proposal_id, ctx.workspace_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let sig = signature::find_for_proposal(&state.pool, found.id).await?;

    let verification = signature::verify(&found, sig.as_ref(), body.signature_hash.as_deref());
    if !verification.valid {
        log::warn!(
            "Signature check failed for proposal {}: {:?}",
            found.id,
            verification.reason
        );
    }
    Ok(HttpResponse::Ok().json(verification))
}
