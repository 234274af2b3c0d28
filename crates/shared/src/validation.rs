//! Common validation utilities.

use validator::ValidationError;

/// Rejects names that are empty or only whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Must not be blank".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Validates an optional email address, treating an empty string as absent.
pub fn validate_optional_email(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(());
    }
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        let mut err = ValidationError::new("email");
        err.message = Some("Invalid email address".into());
        Err(err)
    }
}

/// Trims a name and collapses it to `None` when nothing is left.
pub fn normalize_name(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_blank() {
        assert!(validate_not_blank("Screwdriver").is_ok());
        assert!(validate_not_blank(" a ").is_ok());
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank("   \t").is_err());
    }

    #[test]
    fn test_blank_error_code() {
        let err = validate_not_blank(" ").unwrap_err();
        assert_eq!(err.code, "blank");
    }

    #[test]
    fn test_optional_email() {
        assert!(validate_optional_email("").is_ok());
        assert!(validate_optional_email("  ").is_ok());
        assert!(validate_optional_email("alice@example.com").is_ok());
        assert!(validate_optional_email("alice").is_err());
        assert!(validate_optional_email("@example.com").is_err());
        assert!(validate_optional_email("alice@localhost").is_err());
        assert!(validate_optional_email("alice@.com").is_err());
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Hammer "), Some("Hammer".to_string()));
        assert_eq!(normalize_name("   "), None);
    }
}
