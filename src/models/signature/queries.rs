use sha2::{Digest, Sha256};
use sqlx::{SqliteConnection, SqlitePool};

use crate::errors::AppError;
use crate::models::proposal::Proposal;
use super::types::*;

/// Hash of the signed terms: title, content, amount and currency.
pub fn content_hash(proposal: &Proposal) -> String {
    let mut hasher = Sha256::new();
    hasher.update(proposal.title.as_bytes());
    hasher.update([0u8]);
    hasher.update(proposal.content.as_bytes());
    hasher.update([0u8]);
    hasher.update(proposal.amount_cents.map(|a| a.to_string()).unwrap_or_default());
    hasher.update([0u8]);
    hasher.update(proposal.currency.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hash binding a signer to a specific version of a proposal.
pub fn signature_hash(
    proposal_id: i64,
    content_hash: &str,
    signer_email: &str,
    signature_data: &str,
    signed_at: &str,
) -> String {
    let id = proposal_id.to_string();
    let mut hasher = Sha256::new();
    for part in [
        id.as_str(),
        content_hash,
        signer_email,
        signature_data,
        signed_at,
    ] {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

/// Insert a signature row inside the caller's transaction.
pub(crate) async fn insert(
    conn: &mut SqliteConnection,
    proposal: &Proposal,
    input: &SignatureInput,
    signed_at: &str,
) -> Result<Signature, AppError> {
    let signer_email = input.signer_email.trim().to_lowercase();
    let content = content_hash(proposal);
    let hash = signature_hash(
        proposal.id,
        &content,
        &signer_email,
        &input.signature_data,
        signed_at,
    );

    let id = sqlx::query(
        "INSERT INTO signatures (proposal_id, signer_name, signer_email, signature_data, \
         ip_address, user_agent, content_hash, signature_hash, signed_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )
    .bind(proposal.id)
    .bind(input.signer_name.trim())
    .bind(&signer_email)
    .bind(&input.signature_data)
    .bind(&input.ip_address)
    .bind(&input.user_agent)
    .bind(&content)
    .bind(&hash)
    .bind(signed_at)
    .execute(conn)
    .await?
    .last_insert_rowid();

    Ok(Signature {
        id,
        proposal_id: proposal.id,
        signer_name: input.signer_name.trim().to_string(),
        signer_email,
        signature_data: input.signature_data.clone(),
        ip_address: input.ip_address.clone(),
        user_agent: input.user_agent.clone(),
        content_hash: content,
        signature_hash: hash,
        signed_at: signed_at.to_string(),
    })
}

pub async fn find_for_proposal(
    pool: &SqlitePool,
    proposal_id: i64,
) -> Result<Option<Signature>, AppError> {
    let sig = sqlx::query_as::<_, Signature>(
        "SELECT id, proposal_id, signer_name, signer_email, signature_data, ip_address, \
         user_agent, content_hash, signature_hash, signed_at \
         FROM signatures WHERE proposal_id = ?1",
    )
    .bind(proposal_id)
    .fetch_optional(pool)
    .await?;
    Ok(sig)
}

/// Check a stored signature against the proposal as it is now.
///
/// Both hashes are recomputed, so edits to the proposal after signing and
/// edits to the signature row itself are detected. When `expected_hash` is
/// given it must also match the stored signature hash.
pub fn verify(
    proposal: &Proposal,
    signature: Option<&Signature>,
    expected_hash: Option<&str>,
) -> Verification {
    let Some(sig) = signature else {
        return Verification {
            valid: false,
            reason: Some(VerifyFailure::NotSigned),
            proposal_id: proposal.id,
            signer_name: None,
            signer_email: None,
            signed_at: None,
            signature_hash: None,
        };
    };

    let current_content = content_hash(proposal);
    let recomputed = signature_hash(
        proposal.id,
        &sig.content_hash,
        &sig.signer_email,
        &sig.signature_data,
        &sig.signed_at,
    );

    let reason = if current_content != sig.content_hash {
        Some(VerifyFailure::ContentChanged)
    } else if recomputed != sig.signature_hash {
        Some(VerifyFailure::SignatureTampered)
    } else if expected_hash.is_some_and(|h| !h.trim().eq_ignore_ascii_case(&sig.signature_hash)) {
        Some(VerifyFailure::HashMismatch)
    } else {
        None
    };

    Verification {
        valid: reason.is_none(),
        reason,
        proposal_id: proposal.id,
        signer_name: Some(sig.signer_name.clone()),
        signer_email: Some(sig.signer_email.clone()),
        signed_at: Some(sig.signed_at.clone()),
        signature_hash: Some(sig.signature_hash.clone()),
    }
}
