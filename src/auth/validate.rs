//! Field validators shared by the request DTOs.
//!
//! Each returns `Some(message)` when the value is invalid so callers can
//! collect every problem with `errors.extend(...)`.

/// Validate an email: must contain '@' and '.', max 254 chars.
pub fn validate_email(email: &str, field_name: &str) -> Option<String> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Some(format!("{field_name} is required"));
    }
    if trimmed.len() > 254 {
        return Some(format!("{field_name} must be at most 254 characters"));
    }
    let Some((local, domain)) = trimmed.split_once('@') else {
        return Some(format!("{field_name} must be a valid email address"));
    };
    if local.is_empty() || !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.')
        || trimmed.chars().any(char::is_whitespace)
    {
        return Some(format!("{field_name} must be a valid email address"));
    }
    None
}

/// Validate a password: 8-128 chars.
pub fn validate_password(password: &str) -> Option<String> {
    if password.is_empty() {
        return Some("Password is required".to_string());
    }
    if password.len() < 8 {
        return Some("Password must be at least 8 characters".to_string());
    }
    if password.len() > 128 {
        return Some("Password must be at most 128 characters".to_string());
    }
    None
}

/// Validate a required text field with a max length.
pub fn validate_required(value: &str, field_name: &str, max_len: usize) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(format!("{field_name} is required"));
    }
    if trimmed.chars().count() > max_len {
        return Some(format!("{field_name} must be at most {max_len} characters"));
    }
    None
}

/// Validate an optional text field with a max length (empty is OK).
pub fn validate_optional(value: Option<&str>, field_name: &str, max_len: usize) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.chars().count() > max_len {
        return Some(format!("{field_name} must be at most {max_len} characters"));
    }
    None
}

/// Like `validate_required`, but only when the field was sent at all.
pub fn validate_present(value: Option<&str>, field_name: &str, max_len: usize) -> Option<String> {
    validate_required(value?, field_name, max_len)
}

/// Three-letter uppercase ISO currency code.
pub fn validate_currency(code: &str) -> Option<String> {
    let trimmed = code.trim();
    if trimmed.len() != 3 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        return Some("Currency must be a 3-letter code".to_string());
    }
    None
}

/// `YYYY-MM-DD` calendar date.
pub fn validate_date(value: &str, field_name: &str) -> Option<String> {
    if chrono::NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").is_err() {
        return Some(format!("{field_name} must be a date in YYYY-MM-DD format"));
    }
    None
}

pub fn validate_non_negative(value: i64, field_name: &str) -> Option<String> {
    if value < 0 {
        return Some(format!("{field_name} must not be negative"));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_accepts_plain_address() {
        assert!(validate_email("ana@example.com", "Email").is_none());
        assert!(validate_email("  ana@example.com ", "Email").is_none());
    }

    #[test]
    fn email_rejects_malformed() {
        for bad in ["", "ana", "ana@", "@example.com", "ana@example", "ana @example.com", "ana@.com"] {
            assert!(validate_email(bad, "Email").is_some(), "{bad} should be rejected");
        }
    }

    #[test]
    fn password_length_bounds() {
        assert!(validate_password("short").is_some());
        assert!(validate_password("long enough").is_none());
        assert!(validate_password(&"x".repeat(129)).is_some());
    }

    #[test]
    fn required_and_optional_fields() {
        assert_eq!(
            validate_required("   ", "Name", 10).as_deref(),
            Some("Name is required")
        );
        assert!(validate_required("Ana", "Name", 10).is_none());
        assert!(validate_optional(None, "Company", 3).is_none());
        assert!(validate_optional(Some("Acme"), "Company", 3).is_some());
        assert!(validate_present(None, "Title", 5).is_none());
        assert!(validate_present(Some(""), "Title", 5).is_some());
    }

    #[test]
    fn currency_and_date_formats() {
        assert!(validate_currency("usd").is_none());
        assert!(validate_currency("US").is_some());
        assert!(validate_date("2026-12-31", "Valid until").is_none());
        assert!(validate_date("31/12/2026", "Valid until").is_some());
    }
}
