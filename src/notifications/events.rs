//! Domain events. Each one stores a notification for the affected user,
//! pushes it over the live feed and sends the matching email. Nothing here
//! returns an error: failures are logged so the request that triggered the
//! event still succeeds.

use crate::mail::{Attachment, EmailPayload, EmailResult, templates};
use crate::models::proposal::Proposal;
use crate::models::signature::Signature;
use crate::models::template::Template;
use crate::models::user::{self, User};
use crate::state::AppState;
use super::queries;
use super::types::{NewNotification, Notification, NotificationType};

/// Store a notification and push it to the user's open connections.
pub async fn notify(state: &AppState, new: NewNotification) -> Option<Notification> {
    let notification = match queries::create(&state.pool, &new).await {
        Ok(n) => n,
        Err(e) => {
            log::error!("Failed to store {:?} notification for user {}: {e}", new.kind, new.user_id);
            return None;
        }
    };
    let unread = queries::count_unread(&state.pool, new.user_id).await.unwrap_or(0);
    state.hub.notify(&notification, unread);
    Some(notification)
}

/// Push the current unread count to a user's open connections.
pub async fn refresh_count(state: &AppState, user_id: i64) {
    match queries::count_unread(&state.pool, user_id).await {
        Ok(unread) => state.hub.send_count_update(user_id, unread),
        Err(e) => log::error!("Failed to count unread notifications for user {user_id}: {e}"),
    }
}

async fn owner_of(state: &AppState, proposal: &Proposal) -> Option<User> {
    match user::find_by_id(&state.pool, proposal.owner_id).await {
        Ok(Some(owner)) => Some(owner),
        Ok(None) => {
            log::warn!("Proposal {} has no owner {}", proposal.id, proposal.owner_id);
            None
        }
        Err(e) => {
            log::error!("Failed to load owner of proposal {}: {e}", proposal.id);
            None
        }
    }
}

pub async fn user_registered(state: &AppState, user: &User) -> EmailResult {
    let payload = EmailPayload::new(&user.email, "Welcome to Propdesk", templates::WELCOME)
        .with("name", user.name.as_str())
        .with("app_url", state.config.server.app_url.as_str());
    state.mailer.send(payload).await
}

/// Email the recipient a link to the proposal and tell the sender it went out.
pub async fn proposal_sent(
    state: &AppState,
    sender: &User,
    proposal: &Proposal,
    message: Option<&str>,
    first_send: bool,
) -> EmailResult {
    let mut payload = EmailPayload::new(
        &proposal.client_email,
        format!("{} sent you a proposal: {}", sender.name, proposal.title),
        templates::PROPOSAL_SENT,
    )
    .with("client_name", proposal.client_name.as_str())
    .with("sender_name", sender.name.as_str())
    .with("title", proposal.title.as_str())
    .with("link", state.public_link(&proposal.access_token));
    if let Some(message) = message {
        payload = payload.with("message", message);
    }
    let result = state.mailer.send(payload).await;

    let verb = if first_send { "sent" } else { "resent" };
    notify(
        state,
        NewNotification {
            user_id: proposal.owner_id,
            kind: NotificationType::ProposalSent,
            title: format!("Proposal {verb}"),
            message: format!("\"{}\" was {verb} to {}", proposal.title, proposal.client_email),
            action_url: Some(state.proposal_link(proposal.id)),
        },
    )
    .await;

    result
}

pub async fn proposal_viewed(state: &AppState, proposal: &Proposal) {
    notify(
        state,
        NewNotification {
            user_id: proposal.owner_id,
            kind: NotificationType::ProposalViewed,
            title: "Proposal viewed".to_string(),
            message: format!("{} opened \"{}\"", proposal.client_name, proposal.title),
            action_url: Some(state.proposal_link(proposal.id)),
        },
    )
    .await;

    let Some(owner) = owner_of(state, proposal).await else {
        return;
    };
    let payload = EmailPayload::new(
        &owner.email,
        format!("{} viewed your proposal", proposal.client_name),
        templates::PROPOSAL_VIEWED,
    )
    .with("owner_name", owner.name.as_str())
    .with("title", proposal.title.as_str())
    .with("client_name", proposal.client_name.as_str())
    .with("link", state.proposal_link(proposal.id));
    state.mailer.send(payload).await;
}

/// Signing receipt attached to the signer's copy.
fn signature_receipt(proposal: &Proposal, signature: &Signature) -> Attachment {
    let receipt = serde_json::json!({
        "proposal_id": proposal.id,
        "title": proposal.title,
        "amount_cents": proposal.amount_cents,
        "currency": proposal.currency,
        "signer_name": signature.signer_name,
        "signer_email": signature.signer_email,
        "signed_at": signature.signed_at,
        "content_hash": signature.content_hash,
        "signature_hash": signature.signature_hash,
    });
    Attachment {
        filename: format!("proposal-{}-signature.json", proposal.id),
        content_type: "application/json".to_string(),
        content: serde_json::to_vec_pretty(&receipt).unwrap_or_default(),
    }
}

pub async fn proposal_signed(state: &AppState, proposal: &Proposal, signature: &Signature) {
    notify(
        state,
        NewNotification {
            user_id: proposal.owner_id,
            kind: NotificationType::ProposalSigned,
            title: "Proposal signed".to_string(),
            message: format!("{} signed \"{}\"", signature.signer_name, proposal.title),
            action_url: Some(state.proposal_link(proposal.id)),
        },
    )
    .await;

    if let Some(owner) = owner_of(state, proposal).await {
        let payload = EmailPayload::new(
            &owner.email,
            format!("Signed: {}", proposal.title),
            templates::PROPOSAL_SIGNED,
        )
        .with("owner_name", owner.name.as_str())
        .with("title", proposal.title.as_str())
        .with("signer_name", signature.signer_name.as_str())
        .with("signed_at", signature.signed_at.as_str())
        .with("link", state.proposal_link(proposal.id));
        state.mailer.send(payload).await;
    }

    let copy = EmailPayload::new(
        &signature.signer_email,
        format!("Your signed copy: {}", proposal.title),
        templates::PROPOSAL_SIGNED_COPY,
    )
    .with("signer_name", signature.signer_name.as_str())
    .with("title", proposal.title.as_str())
    .with("signed_at", signature.signed_at.as_str())
    .with("signature_hash", signature.signature_hash.as_str())
    .attach(signature_receipt(proposal, signature));
    state.mailer.send(copy).await;
}

pub async fn proposal_rejected(state: &AppState, proposal: &Proposal) {
    notify(
        state,
        NewNotification {
            user_id: proposal.owner_id,
            kind: NotificationType::ProposalRejected,
            title: "Proposal rejected".to_string(),
            message: match &proposal.rejection_reason {
                Some(reason) => format!("{} rejected \"{}\": {reason}", proposal.client_name, proposal.title),
                None => format!("{} rejected \"{}\"", proposal.client_name, proposal.title),
            },
            action_url: Some(state.proposal_link(proposal.id)),
        },
    )
    .await;

    let Some(owner) = owner_of(state, proposal).await else {
        return;
    };
    let mut payload = EmailPayload::new(
        &owner.email,
        format!("Rejected: {}", proposal.title),
        templates::PROPOSAL_REJECTED,
    )
    .with("owner_name", owner.name.as_str())
    .with("title", proposal.title.as_str())
    .with("client_name", proposal.client_name.as_str())
    .with("link", state.proposal_link(proposal.id));
    if let Some(reason) = &proposal.rejection_reason {
        payload = payload.with("reason", reason.as_str());
    }
    state.mailer.send(payload).await;
}

pub async fn template_created(state: &AppState, template: &Template) {
    notify(
        state,
        NewNotification {
            user_id: template.user_id,
            kind: NotificationType::TemplateCreated,
            title: "Template created".to_string(),
            message: format!("Template \"{}\" is ready to use", template.name),
            action_url: Some(format!("{}/templates/{}", state.config.server.app_url, template.id)),
        },
    )
    .await;
}
