//! Request payloads. Every DTO collects all of its field errors into a
//! single `AppError::Validation` so a client sees every problem at once.

use serde::Deserialize;

use crate::auth::validate::*;
use crate::errors::{AppError, validation_result};
use crate::models::workspace::WorkspaceRole;

const NAME_MAX: usize = 100;
const TITLE_MAX: usize = 200;
const DESCRIPTION_MAX: usize = 500;
const CONTENT_MAX: usize = 100_000;
const REASON_MAX: usize = 1000;
const MESSAGE_MAX: usize = 2000;
const SIGNATURE_MAX: usize = 200_000;

#[derive(Debug, Deserialize)]
pub struct RegisterDto {
    pub email: String,
    pub password: String,
    pub name: String,
    pub company: Option<String>,
}

impl RegisterDto {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = Vec::new();
        errors.extend(validate_email(&self.email, "Email"));
        errors.extend(validate_password(&self.password));
        errors.extend(validate_required(&self.name, "Name", NAME_MAX));
        errors.extend(validate_optional(self.company.as_deref(), "Company", NAME_MAX));
        validation_result(errors)
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginDto {
    pub email: String,
    pub password: String,
}

impl LoginDto {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = Vec::new();
        errors.extend(validate_email(&self.email, "Email"));
        if self.password.is_empty() {
            errors.push("Password is required".to_string());
        }
        validation_result(errors)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileDto {
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
}

impl UpdateProfileDto {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = Vec::new();
        errors.extend(validate_present(self.name.as_deref(), "Name", NAME_MAX));
        if let Some(email) = &self.email {
            errors.extend(validate_email(email, "Email"));
        }
        errors.extend(validate_optional(self.company.as_deref(), "Company", NAME_MAX));
        errors.extend(validate_optional(self.phone.as_deref(), "Phone", 32));
        validation_result(errors)
    }
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordDto {
    pub current_password: String,
    pub new_password: String,
}

impl ChangePasswordDto {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = Vec::new();
        if self.current_password.is_empty() {
            errors.push("Current password is required".to_string());
        }
        errors.extend(validate_password(&self.new_password));
        if !self.current_password.is_empty() && self.current_password == self.new_password {
            errors.push("New password must differ from the current one".to_string());
        }
        validation_result(errors)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateWorkspaceDto {
    pub name: String,
}

impl CreateWorkspaceDto {
    pub fn validate(&self) -> Result<(), AppError> {
        validation_result(validate_required(&self.name, "Workspace name", NAME_MAX).into_iter().collect())
    }
}

#[derive(Debug, Deserialize)]
pub struct SwitchWorkspaceDto {
    pub workspace_id: i64,
}

impl SwitchWorkspaceDto {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.workspace_id <= 0 {
            return Err(AppError::Validation(vec!["Workspace id is invalid".to_string()]));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct AddMemberDto {
    pub email: String,
    #[serde(default = "default_member_role")]
    pub role: WorkspaceRole,
}

fn default_member_role() -> WorkspaceRole {
    WorkspaceRole::Member
}

impl AddMemberDto {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = Vec::new();
        errors.extend(validate_email(&self.email, "Email"));
        if self.role == WorkspaceRole::Owner {
            errors.push("Role must be ADMIN or MEMBER".to_string());
        }
        validation_result(errors)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateTemplateDto {
    pub name: String,
    pub description: Option<String>,
    pub content: String,
    pub is_default: Option<bool>,
    pub is_active: Option<bool>,
}

impl CreateTemplateDto {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = Vec::new();
        errors.extend(validate_required(&self.name, "Name", NAME_MAX));
        errors.extend(validate_optional(self.description.as_deref(), "Description", DESCRIPTION_MAX));
        errors.extend(validate_required(&self.content, "Content", CONTENT_MAX));
        if self.is_default == Some(true) && self.is_active == Some(false) {
            errors.push("An inactive template cannot be the default".to_string());
        }
        validation_result(errors)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTemplateDto {
    pub name: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub is_default: Option<bool>,
    pub is_active: Option<bool>,
}

impl UpdateTemplateDto {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = Vec::new();
        errors.extend(validate_present(self.name.as_deref(), "Name", NAME_MAX));
        errors.extend(validate_optional(self.description.as_deref(), "Description", DESCRIPTION_MAX));
        errors.extend(validate_present(self.content.as_deref(), "Content", CONTENT_MAX));
        if self.is_default == Some(true) && self.is_active == Some(false) {
            errors.push("An inactive template cannot be the default".to_string());
        }
        validation_result(errors)
    }
}

fn proposal_field_errors(
    errors: &mut Vec<String>,
    amount_cents: Option<i64>,
    currency: Option<&str>,
    valid_until: Option<&str>,
) {
    if let Some(amount) = amount_cents {
        errors.extend(validate_non_negative(amount, "Amount"));
    }
    if let Some(currency) = currency {
        errors.extend(validate_currency(currency));
    }
    if let Some(date) = valid_until {
        errors.extend(validate_date(date, "Valid until"));
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateProposalDto {
    pub title: Option<String>,
    pub content: Option<String>,
    pub client_name: String,
    pub client_email: String,
    pub amount_cents: Option<i64>,
    pub currency: Option<String>,
    pub valid_until: Option<String>,
    pub template_id: Option<i64>,
}

impl CreateProposalDto {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = Vec::new();
        errors.extend(validate_present(self.title.as_deref(), "Title", TITLE_MAX));
        errors.extend(validate_optional(self.content.as_deref(), "Content", CONTENT_MAX));
        errors.extend(validate_required(&self.client_name, "Client name", NAME_MAX));
        errors.extend(validate_email(&self.client_email, "Client email"));
        proposal_field_errors(
            &mut errors,
            self.amount_cents,
            self.currency.as_deref(),
            self.valid_until.as_deref(),
        );
        validation_result(errors)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProposalDto {
    pub title: Option<String>,
    pub content: Option<String>,
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub amount_cents: Option<i64>,
    pub currency: Option<String>,
    pub valid_until: Option<String>,
}

impl UpdateProposalDto {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = Vec::new();
        errors.extend(validate_present(self.title.as_deref(), "Title", TITLE_MAX));
        errors.extend(validate_optional(self.content.as_deref(), "Content", CONTENT_MAX));
        errors.extend(validate_present(self.client_name.as_deref(), "Client name", NAME_MAX));
        if let Some(email) = &self.client_email {
            errors.extend(validate_email(email, "Client email"));
        }
        proposal_field_errors(
            &mut errors,
            self.amount_cents,
            self.currency.as_deref(),
            self.valid_until.as_deref(),
        );
        validation_result(errors)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SendProposalDto {
    pub message: Option<String>,
}

impl SendProposalDto {
    pub fn validate(&self) -> Result<(), AppError> {
        validation_result(
            validate_optional(self.message.as_deref(), "Message", MESSAGE_MAX)
                .into_iter()
                .collect(),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct SignProposalDto {
    pub signer_name: String,
    pub signer_email: String,
    /// Drawn signature (data URL) or typed name.
    pub signature_data: String,
}

impl SignProposalDto {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = Vec::new();
        errors.extend(validate_required(&self.signer_name, "Signer name", NAME_MAX));
        errors.extend(validate_email(&self.signer_email, "Signer email"));
        if self.signature_data.trim().is_empty() {
            errors.push("Signature is required".to_string());
        } else if self.signature_data.len() > SIGNATURE_MAX {
            errors.push("Signature is too large".to_string());
        }
        validation_result(errors)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RejectProposalDto {
    pub reason: Option<String>,
}

impl RejectProposalDto {
    pub fn validate(&self) -> Result<(), AppError> {
        validation_result(
            validate_optional(self.reason.as_deref(), "Reason", REASON_MAX)
                .into_iter()
                .collect(),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct VerifySignatureDto {
    pub proposal_id: i64,
    pub signature_hash: Option<String>,
}

impl VerifySignatureDto {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = Vec::new();
        if self.proposal_id <= 0 {
            errors.push("Proposal id is invalid".to_string());
        }
        if let Some(hash) = &self.signature_hash {
            let hash = hash.trim();
            if hash.len() != 64 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
                errors.push("Signature hash must be 64 hex characters".to_string());
            }
        }
        validation_result(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(result: Result<(), AppError>) -> Vec<String> {
        match result {
            Err(AppError::Validation(errors)) => errors,
            Err(other) => panic!("unexpected error: {other}"),
            Ok(()) => Vec::new(),
        }
    }

    #[test]
    fn register_collects_every_error() {
        let dto = RegisterDto {
            email: "nope".to_string(),
            password: "short".to_string(),
            name: " ".to_string(),
            company: None,
        };
        let errors = messages(dto.validate());
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn register_accepts_valid_payload() {
        let dto = RegisterDto {
            email: "ana@example.com".to_string(),
            password: "correct horse".to_string(),
            name: "Ana".to_string(),
            company: Some("Acme".to_string()),
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn profile_update_checks_only_sent_fields() {
        assert!(UpdateProfileDto::default().validate().is_ok());

        let dto = UpdateProfileDto {
            name: Some("".to_string()),
            email: Some("bad".to_string()),
            ..Default::default()
        };
        assert_eq!(messages(dto.validate()).len(), 2);
    }

    #[test]
    fn change_password_rejects_same_password() {
        let dto = ChangePasswordDto {
            current_password: "password123".to_string(),
            new_password: "password123".to_string(),
        };
        assert!(messages(dto.validate())[0].contains("differ"));
    }

    #[test]
    fn proposal_rejects_bad_money_and_dates() {
        let dto = CreateProposalDto {
            client_name: "Bea".to_string(),
            client_email: "bea@example.com".to_string(),
            amount_cents: Some(-1),
            currency: Some("EURO".to_string()),
            valid_until: Some("31/12/2026".to_string()),
            ..Default::default()
        };
        assert_eq!(messages(dto.validate()).len(), 3);
    }

    #[test]
    fn template_cannot_be_inactive_default() {
        let dto = UpdateTemplateDto {
            is_default: Some(true),
            is_active: Some(false),
            ..Default::default()
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn add_member_defaults_to_member_role() {
        let dto: AddMemberDto = serde_json::from_str(r#"{"email":"bea@example.com"}"#).unwrap();
        assert_eq!(dto.role, WorkspaceRole::Member);
        assert!(dto.validate().is_ok());

        let owner: AddMemberDto =
            serde_json::from_str(r#"{"email":"bea@example.com","role":"OWNER"}"#).unwrap();
        assert!(owner.validate().is_err());
    }

    #[test]
    fn verify_hash_must_be_hex() {
        let dto = VerifySignatureDto {
            proposal_id: 1,
            signature_hash: Some("xyz".to_string()),
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn sign_requires_signature_data() {
        let dto = SignProposalDto {
            signer_name: "Bea".to_string(),
            signer_email: "bea@example.com".to_string(),
            signature_data: "  ".to_string(),
        };
        assert_eq!(messages(dto.validate()), vec!["Signature is required".to_string()]);
    }
}
