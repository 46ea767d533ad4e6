use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposalStatus {
    Draft,
    Sent,
    Viewed,
    Signed,
    Rejected,
}

impl ProposalStatus {
    pub const ALL: [ProposalStatus; 5] = [
        ProposalStatus::Draft,
        ProposalStatus::Sent,
        ProposalStatus::Viewed,
        ProposalStatus::Signed,
        ProposalStatus::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProposalStatus::Draft => "DRAFT",
            ProposalStatus::Sent => "SENT",
            ProposalStatus::Viewed => "VIEWED",
            ProposalStatus::Signed => "SIGNED",
            ProposalStatus::Rejected => "REJECTED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
    }

    /// Out with the recipient and still awaiting a decision.
    pub fn is_open(self) -> bool {
        matches!(self, ProposalStatus::Sent | ProposalStatus::Viewed)
    }

    pub fn is_editable(self) -> bool {
        self == ProposalStatus::Draft
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Proposal {
    pub id: i64,
    pub workspace_id: i64,
    pub owner_id: i64,
    pub template_id: Option<i64>,
    pub title: String,
    pub content: String,
    pub client_name: String,
    pub client_email: String,
    pub amount_cents: Option<i64>,
    pub currency: String,
    pub valid_until: Option<String>,
    pub status: ProposalStatus,
    #[serde(skip_serializing)]
    pub access_token: String,
    pub sent_at: Option<String>,
    pub viewed_at: Option<String>,
    pub signed_at: Option<String>,
    pub rejected_at: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// What a recipient sees through the public link.
#[derive(Debug, Clone, Serialize)]
pub struct PublicProposal {
    pub title: String,
    pub content: String,
    pub client_name: String,
    pub amount_cents: Option<i64>,
    pub currency: String,
    pub valid_until: Option<String>,
    pub status: ProposalStatus,
    pub sender_name: String,
    pub sender_company: Option<String>,
    pub signed_at: Option<String>,
    pub rejected_at: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewProposal {
    pub workspace_id: i64,
    pub owner_id: i64,
    pub template_id: Option<i64>,
    pub title: String,
    pub content: String,
    pub client_name: String,
    pub client_email: String,
    pub amount_cents: Option<i64>,
    pub currency: String,
    pub valid_until: Option<String>,
}

#[derive(Debug, Default)]
pub struct ProposalChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub amount_cents: Option<i64>,
    pub currency: Option<String>,
    pub valid_until: Option<String>,
}

/// Filters for the proposal list endpoint.
#[derive(Debug, Default, Clone)]
pub struct ProposalFilter {
    pub status: Option<ProposalStatus>,
    pub search: Option<String>,
}

/// Proposal counts per status for a workspace.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProposalStats {
    pub total: i64,
    pub draft: i64,
    pub sent: i64,
    pub viewed: i64,
    pub signed: i64,
    pub rejected: i64,
}
