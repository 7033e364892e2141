use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Maximum username length.
const MAX_USERNAME_LEN: usize = 100;

/// Comment entity - text a visitor posted against a piece of content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub content_id: Uuid,
    pub username: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Create a new comment, validating the visitor-supplied fields.
    ///
    /// `created_at` is passed in rather than read from the wall clock so the
    /// timestamp agrees with the clock the throttles use.
    pub fn new(
        content_id: Uuid,
        username: String,
        text: String,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if username.trim().is_empty() {
            return Err(DomainError::Validation(
                "username must not be empty".to_string(),
            ));
        }
        if username.chars().count() > MAX_USERNAME_LEN {
            return Err(DomainError::Validation(format!(
                "username must be at most {} characters",
                MAX_USERNAME_LEN
            )));
        }
        if text.trim().is_empty() {
            return Err(DomainError::Validation(
                "comment must not be empty".to_string(),
            ));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            content_id,
            username,
            text,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_comment_keeps_text_verbatim() {
        let now = Utc::now();
        let comment =
            Comment::new(Uuid::new_v4(), "test".into(), "  hello ".into(), now).unwrap();
        assert_eq!(comment.text, "  hello ");
        assert_eq!(comment.created_at, now);
    }

    #[test]
    fn test_rejects_blank_fields() {
        let now = Utc::now();
        assert!(Comment::new(Uuid::new_v4(), " ".into(), "hi".into(), now).is_err());
        assert!(Comment::new(Uuid::new_v4(), "test".into(), "".into(), now).is_err());
        assert!(Comment::new(Uuid::new_v4(), "x".repeat(101), "hi".into(), now).is_err());
    }
}
