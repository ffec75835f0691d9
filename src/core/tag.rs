//! Tag predicates used by the registry at declaration time.

use super::error::{MigrateError, Result};
use super::types::NULL_TAG;

/// Returns true for the reserved tag of the pristine state.
#[inline]
pub fn is_null_tag(tag: &str) -> bool {
    tag == NULL_TAG
}

/// Returns true if the tag contains any whitespace character.
#[inline]
pub fn contains_whitespace(tag: &str) -> bool {
    tag.chars().any(char::is_whitespace)
}

/// Validates a step tag.
///
/// A tag must be non-empty, must not be the reserved `"null"` and must not
/// contain whitespace. Uniqueness is the registry's concern.
pub fn validate_tag(tag: &str) -> Result<()> {
    if tag.is_empty() {
        return Err(MigrateError::validation("tag is missing"));
    }
    if is_null_tag(tag) {
        return Err(MigrateError::validation(format!(
            "tag can't have reserved name {}",
            NULL_TAG
        )));
    }
    if contains_whitespace(tag) {
        return Err(MigrateError::validation(format!(
            "tag '{}' contains a whitespace",
            tag
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_tag() {
        assert!(validate_tag("user_table_start").is_ok());
        assert!(validate_tag("v2.1-add-index").is_ok());

        assert!(matches!(validate_tag(""), Err(MigrateError::Validation(_))));
        assert!(matches!(validate_tag("null"), Err(MigrateError::Validation(_))));
        assert!(matches!(validate_tag("two words"), Err(MigrateError::Validation(_))));
        assert!(matches!(validate_tag("tab\there"), Err(MigrateError::Validation(_))));
        assert!(matches!(validate_tag("trailing\n"), Err(MigrateError::Validation(_))));
    }

    #[test]
    fn test_null_is_case_sensitive() {
        assert!(is_null_tag("null"));
        assert!(!is_null_tag("NULL"));
        assert!(validate_tag("NULL").is_ok());
    }
}
