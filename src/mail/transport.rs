use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use rand::Rng;
use serde_json::json;

use super::{Attachment, MailError};

const OUTBOX_CAPACITY: usize = 50;
const SENDGRID_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// A fully rendered message ready for a transport.
pub(super) struct OutgoingEmail {
    pub from: String,
    pub from_name: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    pub attachments: Vec<Attachment>,
}

/// What the log transport remembers about a delivered message.
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub message_id: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    pub attachment_names: Vec<String>,
}

/// Writes messages to the log and keeps the most recent ones in memory.
pub(super) struct LogTransport {
    outbox: Arc<Mutex<VecDeque<SentEmail>>>,
}

impl LogTransport {
    pub fn new() -> Self {
        Self {
            outbox: Arc::new(Mutex::new(VecDeque::with_capacity(OUTBOX_CAPACITY))),
        }
    }

    pub fn deliver(&self, email: OutgoingEmail) -> String {
        let mut rng = rand::rng();
        let id_bytes: [u8; 8] = rng.random();
        let message_id = format!("log-{}", hex::encode(id_bytes));

        log::info!(
            "[mail] {} <{}> -> {}: {} ({} bytes, {} attachments)",
            email.from_name,
            email.from,
            email.to.join(", "),
            email.subject,
            email.html.len(),
            email.attachments.len()
        );

        let mut outbox = self.outbox.lock().unwrap_or_else(|e| e.into_inner());
        if outbox.len() == OUTBOX_CAPACITY {
            outbox.pop_front();
        }
        outbox.push_back(SentEmail {
            message_id: message_id.clone(),
            to: email.to,
            subject: email.subject,
            html: email.html,
            attachment_names: email.attachments.into_iter().map(|a| a.filename).collect(),
        });
        message_id
    }

    pub fn outbox(&self) -> Vec<SentEmail> {
        self.outbox
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }
}

/// SendGrid v3 `mail/send` over HTTPS.
pub(super) struct SendGridTransport {
    client: reqwest::Client,
    api_key: String,
}

impl SendGridTransport {
    pub fn new(api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|e| {
                log::warn!("Falling back to default HTTP client: {e}");
                reqwest::Client::new()
            });
        Self { client, api_key }
    }

    pub async fn deliver(&self, email: &OutgoingEmail) -> Result<String, MailError> {
        let to: Vec<_> = email.to.iter().map(|addr| json!({ "email": addr })).collect();
        let mut body = json!({
            "personalizations": [{ "to": to }],
            "from": { "email": email.from, "name": email.from_name },
            "subject": email.subject,
            "content": [{ "type": "text/html", "value": email.html }],
        });
        if !email.attachments.is_empty() {
            let attachments: Vec<_> = email
                .attachments
                .iter()
                .map(|a| {
                    json!({
                        "content": STANDARD.encode(&a.content),
                        "filename": a.filename,
                        "type": a.content_type,
                        "disposition": "attachment",
                    })
                })
                .collect();
            body["attachments"] = json!(attachments);
        }

        let response = self
            .client
            .post(SENDGRID_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| MailError::Delivery(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(MailError::Delivery(format!("SendGrid returned {status}: {text}")));
        }

        Ok(response
            .headers()
            .get("x-message-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| format!("sendgrid-{}", status.as_u16())))
    }
}
