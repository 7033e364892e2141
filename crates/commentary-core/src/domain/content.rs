use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Maximum slug length accepted for a piece of content.
pub const MAX_SLUG_LEN: usize = 200;

/// Content entity - a named target that comments are posted against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub id: Uuid,
    pub slug: String,
    pub body: Option<String>,
}

impl Content {
    /// Create new content with a generated ID.
    pub fn new(slug: String, body: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            slug,
            body,
        }
    }
}

/// Check that a slug is non-empty, short enough and made of `[A-Za-z0-9_-]`.
pub fn validate_slug(slug: &str) -> Result<(), DomainError> {
    if slug.is_empty() {
        return Err(DomainError::Validation("slug must not be empty".to_string()));
    }
    if slug.len() > MAX_SLUG_LEN {
        return Err(DomainError::Validation(format!(
            "slug must be at most {} characters",
            MAX_SLUG_LEN
        )));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(DomainError::Validation(format!(
            "'{}' is not a valid slug",
            slug
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_slugs() {
        assert!(validate_slug("test-url").is_ok());
        assert!(validate_slug("a_new_url-2").is_ok());
    }

    #[test]
    fn test_invalid_slugs() {
        assert!(validate_slug("").is_err());
        assert!(validate_slug("has space").is_err());
        assert!(validate_slug("path/like").is_err());
        assert!(validate_slug(&"a".repeat(MAX_SLUG_LEN + 1)).is_err());
    }
}
