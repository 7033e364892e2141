//! Data Transfer Objects - request/response types for the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to post a comment.
///
/// `content_url` is the slug of the content being commented on; it is created
/// if it does not exist yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    pub username: String,
    pub content_url: String,
    pub comment: String,
}

/// A posted comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: Uuid,
    /// Id of the content the comment belongs to.
    pub content: Uuid,
    pub username: String,
    pub comment: String,
    pub created: DateTime<Utc>,
}

/// Request to edit a comment. `PUT` requires both fields, `PATCH` either.
///
/// Comments stay attached to their content; a `content_url` in the body is
/// ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCommentRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Request to register a piece of content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateContentRequest {
    pub slug: String,
    #[serde(default)]
    pub content: Option<String>,
}

/// Request to edit a piece of content. `PUT` requires `slug`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateContentRequest {
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// A piece of content with its comments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentResponse {
    pub id: Uuid,
    pub slug: String,
    pub content: Option<String>,
    pub comments: Vec<CommentResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_body_is_optional() {
        let req: CreateContentRequest = serde_json::from_str(r#"{"slug":"test-url"}"#).unwrap();
        assert_eq!(req.slug, "test-url");
        assert!(req.content.is_none());
    }

    #[test]
    fn test_partial_comment_update() {
        let req: UpdateCommentRequest =
            serde_json::from_str(r#"{"comment":"edited","content_url":"ignored"}"#).unwrap();
        assert_eq!(req.comment.as_deref(), Some("edited"));
        assert!(req.username.is_none());
    }
}
