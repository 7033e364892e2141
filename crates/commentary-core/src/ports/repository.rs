use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Comment, Content};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Replace an existing entity, matched by its ID.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// Content repository.
#[async_trait]
pub trait ContentRepository: BaseRepository<Content, Uuid> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Content>, RepoError>;

    /// Return the content with `slug`, creating an empty one if it does not exist.
    async fn get_or_create(&self, slug: &str) -> Result<Content, RepoError>;

    async fn list_content(&self) -> Result<Vec<Content>, RepoError>;
}

/// Comment repository.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// All comments, oldest first.
    async fn list_comments(&self) -> Result<Vec<Comment>, RepoError>;

    /// Comments posted against one piece of content, oldest first.
    async fn find_by_content_id(&self, content_id: Uuid) -> Result<Vec<Comment>, RepoError>;

    /// Remove every comment on one piece of content, returning how many went.
    async fn delete_by_content_id(&self, content_id: Uuid) -> Result<u64, RepoError>;
}

/// Read path into comment storage used by the duplicate-content throttle.
#[async_trait]
pub trait CommentHistory: Send + Sync {
    /// Whether a comment with exactly `text` was created at or after `since`.
    async fn posted_since(&self, text: &str, since: DateTime<Utc>) -> Result<bool, RepoError>;
}
