//! Field checks applied to request payloads before they reach the directory or ledger.

use crate::error::HrError;

pub const EMPLOYEE_ID_MAX: usize = 50;
pub const TEXT_FIELD_MAX: usize = 255;
/// RFC 5321 limit.
pub const EMAIL_MAX: usize = 254;

/// Trimmed value must be 1..=`max` characters.
pub fn require_length(field: &str, value: &str, max: usize) -> Result<(), HrError> {
    let len = value.trim().chars().count();
    if len == 0 {
        return Err(HrError::Validation(format!("{field} must not be empty")));
    }
    if len > max {
        return Err(HrError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

/// Structural email check: one `@`, non-empty local part, dotted domain, no whitespace.
pub fn require_email(value: &str) -> Result<(), HrError> {
    let email = value.trim();
    let invalid = |reason: &str| Err(HrError::Validation(format!("email {reason}")));

    if email.is_empty() {
        return invalid("must not be empty");
    }
    if email.len() > EMAIL_MAX {
        return invalid(format!("must be at most {EMAIL_MAX} characters").as_str());
    }
    if email.chars().any(char::is_whitespace) {
        return invalid("must not contain whitespace");
    }

    let Some((local, domain)) = email.split_once('@') else {
        return invalid("must contain an @ symbol");
    };
    if local.is_empty() {
        return invalid("local part cannot be empty");
    }
    if domain.contains('@') {
        return invalid("must contain exactly one @ symbol");
    }
    if !domain.contains('.') || domain.split('.').any(str::is_empty) {
        return invalid("domain is not valid");
    }
    Ok(())
}
