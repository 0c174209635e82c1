//! GitHub username validation
//!
//! GitHub usernames may only contain ASCII alphanumerics and hyphens, cannot start
//! or end with a hyphen, cannot contain `--`, and are at most 39 characters long.

use thiserror::Error;

/// Maximum length of a GitHub username
pub const MAX_USERNAME_LEN: usize = 39;

/// Reasons a username is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("username is required")]
    Required,

    #[error("username is longer than 39 characters")]
    TooLong,

    #[error("username may only contain letters, digits and inner hyphens")]
    InvalidFormat,

    #[error("username cannot contain consecutive hyphens")]
    ConsecutiveHyphens,
}

impl ValidationError {
    /// Stable error code for display layers
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::Required => "validation.usernameRequired",
            ValidationError::TooLong => "validation.usernameTooLong",
            ValidationError::InvalidFormat => "validation.usernameInvalidFormat",
            ValidationError::ConsecutiveHyphens => "validation.usernameConsecutiveHyphens",
        }
    }
}

/// Trims and lowercases a username before validation and key construction
pub fn sanitize_username(raw: &str) -> String {
    crate::cache::normalize_param(raw)
}

/// Checks a username against GitHub's rules
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.trim().is_empty() {
        return Err(ValidationError::Required);
    }

    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(ValidationError::TooLong);
    }

    let allowed = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-');
    if !allowed || username.starts_with('-') || username.ends_with('-') {
        return Err(ValidationError::InvalidFormat);
    }

    if username.contains("--") {
        return Err(ValidationError::ConsecutiveHyphens);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_valid_usernames() {
        for name in ["octocat", "a", "rust-lang", "user123", "A-b-C"] {
            assert!(validate_username(name).is_ok(), "{} should be valid", name);
        }
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(validate_username(""), Err(ValidationError::Required));
        assert_eq!(validate_username("   "), Err(ValidationError::Required));
    }

    #[test]
    fn test_rejects_too_long() {
        let name = "a".repeat(40);
        assert_eq!(validate_username(&name), Err(ValidationError::TooLong));
        assert!(validate_username(&"a".repeat(39)).is_ok());
    }

    #[test]
    fn test_rejects_leading_or_trailing_hyphen() {
        assert_eq!(validate_username("-octo"), Err(ValidationError::InvalidFormat));
        assert_eq!(validate_username("octo-"), Err(ValidationError::InvalidFormat));
    }

    #[test]
    fn test_rejects_consecutive_hyphens() {
        assert_eq!(
            validate_username("octo--cat"),
            Err(ValidationError::ConsecutiveHyphens)
        );
    }

    #[test]
    fn test_rejects_special_characters() {
        for name in ["octo_cat", "octo.cat", "octo cat", "octo@cat", "ñandú"] {
            assert_eq!(
                validate_username(name),
                Err(ValidationError::InvalidFormat),
                "{} should be rejected",
                name
            );
        }
    }

    #[test]
    fn test_sanitize_trims_and_lowercases() {
        assert_eq!(sanitize_username("  OctoCat  "), "octocat");
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(ValidationError::Required.code(), "validation.usernameRequired");
        assert_eq!(ValidationError::TooLong.code(), "validation.usernameTooLong");
        assert_eq!(
            ValidationError::InvalidFormat.code(),
            "validation.usernameInvalidFormat"
        );
        assert_eq!(
            ValidationError::ConsecutiveHyphens.code(),
            "validation.usernameConsecutiveHyphens"
        );
    }
}
