use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    ProposalSent,
    ProposalViewed,
    ProposalSigned,
    ProposalRejected,
    TemplateCreated,
    System,
}

impl NotificationType {
    pub fn category(self) -> NotificationCategory {
        match self {
            NotificationType::ProposalSent
            | NotificationType::ProposalViewed
            | NotificationType::ProposalSigned
            | NotificationType::ProposalRejected => NotificationCategory::Proposal,
            NotificationType::TemplateCreated => NotificationCategory::Template,
            NotificationType::System => NotificationCategory::System,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationCategory {
    Proposal,
    Template,
    Account,
    System,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub category: NotificationCategory,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub action_url: Option<String>,
    pub created_at: String,
    pub read_at: Option<String>,
}

pub struct NewNotification {
    pub user_id: i64,
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub action_url: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct NotificationQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    #[serde(default)]
    pub unread_only: bool,
    pub category: Option<NotificationCategory>,
}
