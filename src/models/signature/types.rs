use serde::Serialize;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Signature {
    pub id: i64,
    pub proposal_id: i64,
    pub signer_name: String,
    pub signer_email: String,
    #[serde(skip_serializing)]
    pub signature_data: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub content_hash: String,
    pub signature_hash: String,
    pub signed_at: String,
}

/// Signer input captured when a recipient signs.
#[derive(Debug, Clone)]
pub struct SignatureInput {
    pub signer_name: String,
    pub signer_email: String,
    pub signature_data: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyFailure {
    NotSigned,
    ContentChanged,
    SignatureTampered,
    HashMismatch,
}

#[derive(Debug, Clone, Serialize)]
pub struct Verification {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<VerifyFailure>,
    pub proposal_id: i64,
    pub signer_name: Option<String>,
    pub signer_email: Option<String>,
    pub signed_at: Option<String>,
    pub signature_hash: Option<String>,
}
