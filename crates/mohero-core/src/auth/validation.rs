//! Form validation performed before any storage call.

use crate::error::ValidationError;

/// Normalise an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Accepts `local@domain.tld` with no whitespace.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::Required("email"));
    }
    let invalid = || ValidationError::InvalidEmail(email.to_string());
    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && tld.len() >= 2 && !host.ends_with('.') => Ok(()),
        _ => Err(invalid()),
    }
}

pub fn validate_password(password: &str, min_len: usize) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::Required("password"));
    }
    if password.chars().count() < min_len {
        return Err(ValidationError::PasswordTooShort { min: min_len });
    }
    Ok(())
}

pub fn validate_sign_in(email: &str, password: &str) -> Result<(), ValidationError> {
    validate_email(email)?;
    if password.is_empty() {
        return Err(ValidationError::Required("password"));
    }
    Ok(())
}

pub fn validate_sign_up(
    email: &str,
    password: &str,
    name: &str,
    min_password_len: usize,
) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::Required("name"));
    }
    validate_email(email)?;
    validate_password(password, min_password_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(validate_email("hero@example.com").is_ok());
        assert!(validate_email("  first.last@sub.example.org ").is_ok());
    }

    #[test]
    fn rejects_malformed_addresses() {
        for bad in ["hero", "@example.com", "hero@", "hero@example", "he ro@example.com", "a@b@c.com", "a@.com", "a@b.c"] {
            assert!(validate_email(bad).is_err(), "{bad} should be rejected");
        }
        assert_eq!(validate_email(""), Err(ValidationError::Required("email")));
    }

    #[test]
    fn password_length() {
        assert_eq!(
            validate_password("12345", 6),
            Err(ValidationError::PasswordTooShort { min: 6 })
        );
        assert!(validate_password("123456", 6).is_ok());
        assert_eq!(validate_password("", 6), Err(ValidationError::Required("password")));
    }

    #[test]
    fn sign_up_requires_name_first() {
        assert_eq!(
            validate_sign_up("bad", "x", " ", 6),
            Err(ValidationError::Required("name"))
        );
        assert!(validate_sign_up("hero@example.com", "secret1", "Hero", 6).is_ok());
    }

    #[test]
    fn normalizes_case() {
        assert_eq!(normalize_email(" Hero@Example.COM "), "hero@example.com");
    }
}
