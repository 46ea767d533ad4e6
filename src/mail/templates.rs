use askama::Template;
use serde_json::{Map, Value};

use super::MailError;

pub const WELCOME: &str = "welcome";
pub const PROPOSAL_SENT: &str = "proposal_sent";
pub const PROPOSAL_VIEWED: &str = "proposal_viewed";
pub const PROPOSAL_SIGNED: &str = "proposal_signed";
pub const PROPOSAL_SIGNED_COPY: &str = "proposal_signed_copy";
pub const PROPOSAL_REJECTED: &str = "proposal_rejected";

#[derive(Template)]
#[template(path = "email/welcome.html")]
struct WelcomeEmail {
    name: String,
    app_url: String,
}

#[derive(Template)]
#[template(path = "email/proposal_sent.html")]
struct ProposalSentEmail {
    client_name: String,
    sender_name: String,
    title: String,
    message: Option<String>,
    link: String,
}

#[derive(Template)]
#[template(path = "email/proposal_viewed.html")]
struct ProposalViewedEmail {
    owner_name: String,
    title: String,
    client_name: String,
    link: String,
}

#[derive(Template)]
#[template(path = "email/proposal_signed.html")]
struct ProposalSignedEmail {
    owner_name: String,
    title: String,
    signer_name: String,
    signed_at: String,
    link: String,
}

#[derive(Template)]
#[template(path = "email/proposal_signed_copy.html")]
struct ProposalSignedCopyEmail {
    signer_name: String,
    title: String,
    signed_at: String,
    signature_hash: String,
}

#[derive(Template)]
#[template(path = "email/proposal_rejected.html")]
struct ProposalRejectedEmail {
    owner_name: String,
    title: String,
    client_name: String,
    reason: Option<String>,
    link: String,
}

/// String form of a context value; missing keys and nulls become "".
fn text(ctx: &Map<String, Value>, key: &str) -> String {
    match ctx.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn optional(ctx: &Map<String, Value>, key: &str) -> Option<String> {
    Some(text(ctx, key)).filter(|s| !s.trim().is_empty())
}

/// Render the HTML body of the named template with values from `ctx`.
pub fn render(name: &str, ctx: &Map<String, Value>) -> Result<String, MailError> {
    let html = match name {
        WELCOME => WelcomeEmail {
            name: text(ctx, "name"),
            app_url: text(ctx, "app_url"),
        }
        .render()?,
        PROPOSAL_SENT => ProposalSentEmail {
            client_name: text(ctx, "client_name"),
            sender_name: text(ctx, "sender_name"),
            title: text(ctx, "title"),
            message: optional(ctx, "message"),
            link: text(ctx, "link"),
        }
        .render()?,
        PROPOSAL_VIEWED => ProposalViewedEmail {
            owner_name: text(ctx, "owner_name"),
            title: text(ctx, "title"),
            client_name: text(ctx, "client_name"),
            link: text(ctx, "link"),
        }
        .render()?,
        PROPOSAL_SIGNED => ProposalSignedEmail {
            owner_name: text(ctx, "owner_name"),
            title: text(ctx, "title"),
            signer_name: text(ctx, "signer_name"),
            signed_at: text(ctx, "signed_at"),
            link: text(ctx, "link"),
        }
        .render()?,
        PROPOSAL_SIGNED_COPY => ProposalSignedCopyEmail {
            signer_name: text(ctx, "signer_name"),
            title: text(ctx, "title"),
            signed_at: text(ctx, "signed_at"),
            signature_hash: text(ctx, "signature_hash"),
        }
        .render()?,
        PROPOSAL_REJECTED => ProposalRejectedEmail {
            owner_name: text(ctx, "owner_name"),
            title: text(ctx, "title"),
            client_name: text(ctx, "client_name"),
            reason: optional(ctx, "reason"),
            link: text(ctx, "link"),
        }
        .render()?,
        other => return Err(MailError::UnknownTemplate(other.to_string())),
    };
    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn sent_email_includes_link_and_optional_message() {
        let with_message = render(
            PROPOSAL_SENT,
            &ctx(json!({
                "client_name": "Bea",
                "sender_name": "Ana",
                "title": "Website redesign",
                "message": "Looking forward to it",
                "link": "https://app.example/p/abc",
            })),
        )
        .unwrap();
        assert!(with_message.contains("Website redesign"));
        assert!(with_message.contains("https://app.example/p/abc"));
        assert!(with_message.contains("Looking forward to it"));

        let without = render(
            PROPOSAL_SENT,
            &ctx(json!({ "title": "Website redesign", "link": "x" })),
        )
        .unwrap();
        assert!(!without.contains("Looking forward to it"));
    }

    #[test]
    fn values_are_html_escaped() {
        let html = render(
            PROPOSAL_REJECTED,
            &ctx(json!({ "title": "<b>t</b>", "reason": "too <i>pricey</i>" })),
        )
        .unwrap();
        assert!(!html.contains("<b>t</b>"));
        assert!(!html.contains("<i>pricey</i>"));
        assert!(html.contains("pricey"));
    }

    #[test]
    fn non_string_context_values_are_stringified() {
        let html = render(WELCOME, &ctx(json!({ "name": 42, "app_url": "u" }))).unwrap();
        assert!(html.contains("42"));
    }

    #[test]
    fn unknown_template_is_an_error() {
        assert!(matches!(
            render("nope", &Map::new()),
            Err(MailError::UnknownTemplate(_))
        ));
    }
}
