use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::models::application::NewApplication;

pub const NAME_MIN_CHARS: usize = 2;

/// Word characters are ASCII only; `\w` in `regex` would also match
/// non-Latin letters.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9_]+([.-]?[A-Za-z0-9_]+)*@[A-Za-z0-9_]+([.-]?[A-Za-z0-9_]+)*(\.[A-Za-z0-9_]{2,3})+$",
    )
    .expect("email regex is valid")
});

/// Every rule an application record failed, in field order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .0.join(", "))]
pub struct ValidationErrors(pub Vec<String>);

/// Normalizes a record (trims the name, trims and lower-cases the email) and
/// checks it against the field rules. All failures are reported together.
pub fn validate_application(draft: NewApplication) -> Result<NewApplication, ValidationErrors> {
    let name = draft.name.trim().to_string();
    let email = draft.email.trim().to_lowercase();
    let mut errors = Vec::new();

    if name.is_empty() {
        errors.push("Candidate name is required".to_string());
    } else if name.chars().count() < NAME_MIN_CHARS {
        errors.push(format!(
            "Name must be at least {NAME_MIN_CHARS} characters long"
        ));
    }

    if email.is_empty() {
        errors.push("Email is required".to_string());
    } else if !is_valid_email(&email) {
        errors.push("Please provide a valid email".to_string());
    }

    if draft.resume_path.trim().is_empty() {
        errors.push("Resume path is required".to_string());
    }
    if draft.resume_file_name.trim().is_empty() {
        errors.push("Resume file name is required".to_string());
    }

    if !errors.is_empty() {
        return Err(ValidationErrors(errors));
    }

    Ok(NewApplication {
        name,
        email,
        ..draft
    })
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}
