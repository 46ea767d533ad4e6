//! Transactional email: payload → askama-rendered HTML → transport.
//!
//! `Mailer::send` never fails the caller. Delivery problems come back in
//! `EmailResult` and are logged, so a broken mail provider cannot break a
//! proposal workflow.

pub mod templates;
mod transport;

pub use transport::SentEmail;

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

use crate::config::{Environment, MailConfig, MailProvider};
use transport::{LogTransport, OutgoingEmail, SendGridTransport};

#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct EmailPayload {
    pub to: Vec<String>,
    pub subject: String,
    /// Name of a template in `templates::render`.
    pub template: String,
    pub context: Map<String, Value>,
    pub attachments: Vec<Attachment>,
}

impl EmailPayload {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, template: &str) -> Self {
        EmailPayload {
            to: vec![to.into()],
            subject: subject.into(),
            template: template.to_string(),
            context: Map::new(),
            attachments: Vec::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }

    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EmailResult {
    pub success: bool,
    pub message_id: Option<String>,
    pub provider: String,
    pub error: Option<String>,
}

#[derive(Debug)]
pub enum MailError {
    UnsupportedProvider(&'static str),
    UnknownTemplate(String),
    Render(askama::Error),
    NoRecipients,
    Delivery(String),
}

impl fmt::Display for MailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MailError::UnsupportedProvider(p) => {
                write!(f, "Mail provider '{p}' has no transport in this build")
            }
            MailError::UnknownTemplate(name) => write!(f, "Unknown email template '{name}'"),
            MailError::Render(e) => write!(f, "Email render error: {e}"),
            MailError::NoRecipients => write!(f, "Email has no recipients"),
            MailError::Delivery(e) => write!(f, "Delivery failed: {e}"),
        }
    }
}

impl std::error::Error for MailError {}

impl From<askama::Error> for MailError {
    fn from(e: askama::Error) -> Self {
        MailError::Render(e)
    }
}

enum Transport {
    Log(LogTransport),
    SendGrid(SendGridTransport),
}

pub struct Mailer {
    transport: Transport,
    from: String,
    from_name: String,
    /// Every message goes here instead of its real recipients.
    redirect_to: Option<String>,
}

impl Mailer {
    pub fn from_config(config: &MailConfig, env: Environment) -> Result<Self, MailError> {
        let transport = match config.provider {
            MailProvider::Log => Transport::Log(LogTransport::new()),
            MailProvider::SendGrid => {
                let key = config
                    .sendgrid_api_key
                    .clone()
                    .ok_or(MailError::Delivery("SENDGRID_API_KEY is not set".to_string()))?;
                Transport::SendGrid(SendGridTransport::new(key))
            }
            MailProvider::Smtp => return Err(MailError::UnsupportedProvider("smtp")),
        };

        let redirect_to = if env.is_production() {
            None
        } else {
            config.test_to.clone()
        };
        if let Some(to) = &redirect_to {
            log::info!("All outgoing email is redirected to {to}");
        }

        Ok(Mailer {
            transport,
            from: config.from.clone(),
            from_name: config.from_name.clone(),
            redirect_to,
        })
    }

    pub fn provider(&self) -> &'static str {
        match self.transport {
            Transport::Log(_) => MailProvider::Log.as_str(),
            Transport::SendGrid(_) => MailProvider::SendGrid.as_str(),
        }
    }

    /// Messages kept by the log transport, oldest first. Empty for other
    /// transports.
    pub fn outbox(&self) -> Vec<SentEmail> {
        match &self.transport {
            Transport::Log(t) => t.outbox(),
            Transport::SendGrid(_) => Vec::new(),
        }
    }

    pub async fn send(&self, payload: EmailPayload) -> EmailResult {
        let template = payload.template.clone();
        let result = match self.deliver(payload).await {
            Ok(message_id) => EmailResult {
                success: true,
                message_id: Some(message_id),
                provider: self.provider().to_string(),
                error: None,
            },
            Err(e) => EmailResult {
                success: false,
                message_id: None,
                provider: self.provider().to_string(),
                error: Some(e.to_string()),
            },
        };

        if result.success {
            log::info!(
                "Email '{template}' sent via {} ({})",
                result.provider,
                result.message_id.as_deref().unwrap_or("-")
            );
        } else {
            log::warn!(
                "Email '{template}' failed via {}: {}",
                result.provider,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
        result
    }

    async fn deliver(&self, payload: EmailPayload) -> Result<String, MailError> {
        let recipients: Vec<String> = payload
            .to
            .iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();
        if recipients.is_empty() {
            return Err(MailError::NoRecipients);
        }

        let html = templates::render(&payload.template, &payload.context)?;

        let (to, subject) = match &self.redirect_to {
            Some(test_to) => (
                vec![test_to.clone()],
                format!("[to: {}] {}", recipients.join(", "), payload.subject),
            ),
            None => (recipients, payload.subject),
        };

        let email = OutgoingEmail {
            from: self.from.clone(),
            from_name: self.from_name.clone(),
            to,
            subject,
            html,
            attachments: payload.attachments,
        };

        match &self.transport {
            Transport::Log(t) => Ok(t.deliver(email)),
            Transport::SendGrid(t) => t.deliver(&email).await,
        }
    }
}
