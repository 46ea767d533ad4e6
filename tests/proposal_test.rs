//! Proposal lifecycle tests: DRAFT -> SENT -> VIEWED -> SIGNED/REJECTED,
//! workspace scoping, listing and signature verification.

mod common;

use propdesk::errors::AppError;
use propdesk::models::PageParams;
use propdesk::models::proposal::{self, ProposalChanges, ProposalFilter, ProposalStatus};
use propdesk::models::signature::{self, SignatureInput, VerifyFailure};
use regex::Regex;
use common::*;

fn signer() -> SignatureInput {
    SignatureInput {
        signer_name: "Bea Client".to_string(),
        signer_email: "Bea@Client.example".to_string(),
        signature_data: "data:image/png;base64,iVBORw0KGgo=".to_string(),
        ip_address: Some("203.0.113.7".to_string()),
        user_agent: Some("test-agent".to_string()),
    }
}

#[tokio::test]
async fn test_new_proposal_is_draft_with_token() {
    let db = setup_test_db().await;
    let (ana, ws) = create_test_user(db.pool(), "ana@example.com", "Ana").await;
    let id = create_test_proposal(db.pool(), ws, ana, "Website").await;

    let p = proposal::find_in_workspace(db.pool(), id, ws).await.unwrap().unwrap();
    assert_eq!(p.status, ProposalStatus::Draft);
    assert!(Regex::new("^[0-9a-f]{64}$").unwrap().is_match(&p.access_token));
    assert!(p.sent_at.is_none());

    // Drafts are invisible through the public token
    assert!(proposal::find_by_token(db.pool(), &p.access_token).await.unwrap().is_none());
}

#[tokio::test]
async fn test_workspace_scoping() {
    let db = setup_test_db().await;
    let (ana, ws) = create_test_user(db.pool(), "ana@example.com", "Ana").await;
    let (_, other_ws) = create_test_user(db.pool(), "bob@example.com", "Bob").await;
    let id = create_test_proposal(db.pool(), ws, ana, "Website").await;

    assert!(proposal::find_in_workspace(db.pool(), id, other_ws).await.unwrap().is_none());
    assert!(matches!(
        proposal::delete(db.pool(), id, other_ws).await,
        Err(AppError::NotFound)
    ));
}

#[tokio::test]
async fn test_full_lifecycle_to_signed() {
    let db = setup_test_db().await;
    let (ana, ws) = create_test_user(db.pool(), "ana@example.com", "Ana").await;
    let id = create_test_proposal(db.pool(), ws, ana, "Website").await;

    let (sent, first) = proposal::mark_sent(db.pool(), id, ws).await.unwrap();
    assert!(first);
    assert_eq!(sent.status, ProposalStatus::Sent);
    assert!(sent.sent_at.is_some());

    // Resend keeps the status
    let (resent, first_again) = proposal::mark_sent(db.pool(), id, ws).await.unwrap();
    assert!(!first_again);
    assert_eq!(resent.status, ProposalStatus::Sent);

    // Editing is no longer possible
    let edit = proposal::update(db.pool(), id, ws, &ProposalChanges::default()).await;
    assert!(matches!(edit, Err(AppError::InvalidState(_))));

    // Only the first view counts
    assert!(proposal::mark_viewed(db.pool(), id).await.unwrap());
    assert!(!proposal::mark_viewed(db.pool(), id).await.unwrap());
    let viewed = proposal::find_by_id(db.pool(), id).await.unwrap().unwrap();
    assert_eq!(viewed.status, ProposalStatus::Viewed);

    let (signed, sig) = proposal::mark_signed(db.pool(), id, &signer()).await.unwrap();
    assert_eq!(signed.status, ProposalStatus::Signed);
    assert_eq!(sig.signer_email, "bea@client.example");
    assert_eq!(sig.signed_at, signed.signed_at.clone().unwrap());

    // Final states accept nothing more
    assert!(matches!(
        proposal::mark_signed(db.pool(), id, &signer()).await,
        Err(AppError::InvalidState(_))
    ));
    assert!(matches!(
        proposal::mark_rejected(db.pool(), id, None).await,
        Err(AppError::InvalidState(_))
    ));
    assert!(matches!(
        proposal::mark_sent(db.pool(), id, ws).await,
        Err(AppError::InvalidState(_))
    ));
    assert!(matches!(
        proposal::delete(db.pool(), id, ws).await,
        Err(AppError::InvalidState(_))
    ));
    assert!(!proposal::mark_viewed(db.pool(), id).await.unwrap());
}

#[tokio::test]
async fn test_draft_cannot_be_signed_or_rejected() {
    let db = setup_test_db().await;
    let (ana, ws) = create_test_user(db.pool(), "ana@example.com", "Ana").await;
    let id = create_test_proposal(db.pool(), ws, ana, "Website").await;

    assert!(matches!(
        proposal::mark_signed(db.pool(), id, &signer()).await,
        Err(AppError::InvalidState(_))
    ));
    assert!(matches!(
        proposal::mark_rejected(db.pool(), id, Some("no")).await,
        Err(AppError::InvalidState(_))
    ));
    assert!(!proposal::mark_viewed(db.pool(), id).await.unwrap());
}

#[tokio::test]
async fn test_reject_stores_trimmed_reason() {
    let db = setup_test_db().await;
    let (ana, ws) = create_test_user(db.pool(), "ana@example.com", "Ana").await;
    let id = create_test_proposal(db.pool(), ws, ana, "Website").await;
    proposal::mark_sent(db.pool(), id, ws).await.unwrap();

    let rejected = proposal::mark_rejected(db.pool(), id, Some("  Too expensive  ")).await.unwrap();
    assert_eq!(rejected.status, ProposalStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("Too expensive"));
    assert!(rejected.rejected_at.is_some());

    // Rejected proposals may be deleted
    proposal::delete(db.pool(), id, ws).await.unwrap();
    assert!(proposal::find_by_id(db.pool(), id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_draft_replaces_only_given_fields() {
    let db = setup_test_db().await;
    let (ana, ws) = create_test_user(db.pool(), "ana@example.com", "Ana").await;
    let id = create_test_proposal(db.pool(), ws, ana, "Website").await;

    let updated = proposal::update(
        db.pool(),
        id,
        ws,
        &ProposalChanges {
            title: Some("Website v2".to_string()),
            currency: Some("usd".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.title, "Website v2");
    assert_eq!(updated.currency, "USD");
    assert_eq!(updated.content, "Scope of work");
    assert_eq!(updated.amount_cents, Some(150_000));
}

#[tokio::test]
async fn test_update_refused_outside_draft_leaves_fields() {
    let db = setup_test_db().await;
    let (ana, ws) = create_test_user(db.pool(), "ana@example.com", "Ana").await;
    let (_, other_ws) = create_test_user(db.pool(), "bob@example.com", "Bob").await;
    let id = create_test_proposal(db.pool(), ws, ana, "Website").await;

    let retitle = ProposalChanges {
        title: Some("Renamed".to_string()),
        ..Default::default()
    };
    assert!(matches!(
        proposal::update(db.pool(), id, other_ws, &retitle).await,
        Err(AppError::NotFound)
    ));

    proposal::mark_sent(db.pool(), id, ws).await.unwrap();
    let err = proposal::update(db.pool(), id, ws, &retitle).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState(ref msg) if msg.contains("SENT")));

    let unchanged = proposal::find_by_id(db.pool(), id).await.unwrap().unwrap();
    assert_eq!(unchanged.title, "Website");
    assert_eq!(unchanged.status, ProposalStatus::Sent);
}

#[tokio::test]
async fn test_duplicate_makes_fresh_draft() {
    let db = setup_test_db().await;
    let (ana, ws) = create_test_user(db.pool(), "ana@example.com", "Ana").await;
    let id = create_test_proposal(db.pool(), ws, ana, "Website").await;
    let (original, _) = proposal::mark_sent(db.pool(), id, ws).await.unwrap();

    let copy_id = proposal::duplicate(db.pool(), id, ws, ana).await.unwrap();
    let copy = proposal::find_by_id(db.pool(), copy_id).await.unwrap().unwrap();
    assert_eq!(copy.status, ProposalStatus::Draft);
    assert_eq!(copy.title, "Website (copy)");
    assert_eq!(copy.content, original.content);
    assert_ne!(copy.access_token, original.access_token);
    assert!(copy.sent_at.is_none());
}

#[tokio::test]
async fn test_list_filters_and_stats() {
    let db = setup_test_db().await;
    let (ana, ws) = create_test_user(db.pool(), "ana@example.com", "Ana").await;
    for title in ["Alpha site", "Beta app", "Gamma site"] {
        create_test_proposal(db.pool(), ws, ana, title).await;
    }
    let sent_id = create_test_proposal(db.pool(), ws, ana, "Delta site").await;
    proposal::mark_sent(db.pool(), sent_id, ws).await.unwrap();

    let all = PageParams::default();
    let (items, total) = proposal::list(db.pool(), ws, &ProposalFilter::default(), &all).await.unwrap();
    assert_eq!(total, 4);
    assert_eq!(items.len(), 4);

    let drafts = ProposalFilter {
        status: Some(ProposalStatus::Draft),
        search: Some("site".to_string()),
    };
    let (items, total) = proposal::list(db.pool(), ws, &drafts, &all).await.unwrap();
    assert_eq!(total, 2);
    assert!(items.iter().all(|p| p.status == ProposalStatus::Draft));

    let page_two = PageParams {
        page: Some(2),
        per_page: Some(3),
    };
    let (items, total) = proposal::list(db.pool(), ws, &ProposalFilter::default(), &page_two).await.unwrap();
    assert_eq!(total, 4);
    assert_eq!(items.len(), 1);

    let stats = proposal::count_by_status(db.pool(), ws).await.unwrap();
    assert_eq!(stats.total, 4);
    assert_eq!(stats.draft, 3);
    assert_eq!(stats.sent, 1);
    assert_eq!(stats.signed, 0);
}

#[tokio::test]
async fn test_signature_verification() {
    let db = setup_test_db().await;
    let (ana, ws) = create_test_user(db.pool(), "ana@example.com", "Ana").await;
    let id = create_test_proposal(db.pool(), ws, ana, "Website").await;

    let draft = proposal::find_by_id(db.pool(), id).await.unwrap().unwrap();
    let unsigned = signature::verify(&draft, None, None);
    assert!(!unsigned.valid);
    assert_eq!(unsigned.reason, Some(VerifyFailure::NotSigned));

    proposal::mark_sent(db.pool(), id, ws).await.unwrap();
    let (signed, sig) = proposal::mark_signed(db.pool(), id, &signer()).await.unwrap();
    assert!(Regex::new("^[0-9a-f]{64}$").unwrap().is_match(&sig.signature_hash));

    let stored = signature::find_for_proposal(db.pool(), id).await.unwrap().unwrap();
    let ok = signature::verify(&signed, Some(&stored), Some(&sig.signature_hash.to_uppercase()));
    assert!(ok.valid, "{:?}", ok.reason);

    let wrong = signature::verify(&signed, Some(&stored), Some(&"0".repeat(64)));
    assert_eq!(wrong.reason, Some(VerifyFailure::HashMismatch));

    // Content edited behind the API's back
    sqlx::query("UPDATE proposals SET content = 'changed' WHERE id = ?1")
        .bind(id)
        .execute(db.pool())
        .await
        .unwrap();
    let edited = proposal::find_by_id(db.pool(), id).await.unwrap().unwrap();
    assert_eq!(
        signature::verify(&edited, Some(&stored), None).reason,
        Some(VerifyFailure::ContentChanged)
    );

    // Signature row tampered with
    let mut tampered = stored.clone();
    tampered.signer_email = "mallory@example.com".to_string();
    assert_eq!(
        signature::verify(&signed, Some(&tampered), None).reason,
        Some(VerifyFailure::SignatureTampered)
    );
}
