//! In-memory repositories for running without a database.
//!
//! Data lives in the process and is lost on restart.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use commentary_core::domain::{Comment, Content};
use commentary_core::error::RepoError;
use commentary_core::ports::{BaseRepository, CommentHistory, CommentRepository, ContentRepository};

/// Content keyed by id.
#[derive(Default)]
pub struct InMemoryContentRepository {
    store: RwLock<HashMap<Uuid, Content>>,
}

impl InMemoryContentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<Content, Uuid> for InMemoryContentRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Content>, RepoError> {
        Ok(self.store.read().await.get(&id).cloned())
    }

    async fn insert(&self, entity: Content) -> Result<Content, RepoError> {
        let mut store = self.store.write().await;
        if store.values().any(|c| c.slug == entity.slug) {
            return Err(RepoError::Constraint(format!(
                "content with slug '{}' already exists",
                entity.slug
            )));
        }
        store.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn update(&self, entity: Content) -> Result<Content, RepoError> {
        let mut store = self.store.write().await;
        if !store.contains_key(&entity.id) {
            return Err(RepoError::NotFound);
        }
        if store
            .values()
            .any(|c| c.slug == entity.slug && c.id != entity.id)
        {
            return Err(RepoError::Constraint(format!(
                "content with slug '{}' already exists",
                entity.slug
            )));
        }
        store.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.store
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl ContentRepository for InMemoryContentRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Content>, RepoError> {
        let store = self.store.read().await;
        Ok(store.values().find(|c| c.slug == slug).cloned())
    }

    async fn get_or_create(&self, slug: &str) -> Result<Content, RepoError> {
        // Check and insert under one lock so concurrent callers agree.
        let mut store = self.store.write().await;
        if let Some(existing) = store.values().find(|c| c.slug == slug) {
            return Ok(existing.clone());
        }
        let content = Content::new(slug.to_string(), None);
        store.insert(content.id, content.clone());
        Ok(content)
    }

    async fn list_content(&self) -> Result<Vec<Content>, RepoError> {
        let mut all: Vec<Content> = self.store.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(all)
    }
}

/// Comments in insertion order.
#[derive(Default)]
pub struct InMemoryCommentRepository {
    store: RwLock<Vec<Comment>>,
}

impl InMemoryCommentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.store.read().await.len()
    }
}

#[async_trait]
impl BaseRepository<Comment, Uuid> for InMemoryCommentRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        Ok(self.store.read().await.iter().find(|c| c.id == id).cloned())
    }

    async fn insert(&self, entity: Comment) -> Result<Comment, RepoError> {
        self.store.write().await.push(entity.clone());
        Ok(entity)
    }

    async fn update(&self, entity: Comment) -> Result<Comment, RepoError> {
        let mut store = self.store.write().await;
        let slot = store
            .iter_mut()
            .find(|c| c.id == entity.id)
            .ok_or(RepoError::NotFound)?;
        *slot = entity.clone();
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut store = self.store.write().await;
        let before = store.len();
        store.retain(|c| c.id != id);
        if store.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn list_comments(&self) -> Result<Vec<Comment>, RepoError> {
        let mut all = self.store.read().await.clone();
        all.sort_by_key(|c| c.created_at);
        Ok(all)
    }

    async fn find_by_content_id(&self, content_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let mut matching: Vec<Comment> = self
            .store
            .read()
            .await
            .iter()
            .filter(|c| c.content_id == content_id)
            .cloned()
            .collect();
        matching.sort_by_key(|c| c.created_at);
        Ok(matching)
    }

    async fn delete_by_content_id(&self, content_id: Uuid) -> Result<u64, RepoError> {
        let mut store = self.store.write().await;
        let before = store.len();
        store.retain(|c| c.content_id != content_id);
        Ok((before - store.len()) as u64)
    }
}

#[async_trait]
impl CommentHistory for InMemoryCommentRepository {
    async fn posted_since(&self, text: &str, since: DateTime<Utc>) -> Result<bool, RepoError> {
        let store = self.store.read().await;
        Ok(store.iter().any(|c| c.text == text && c.created_at >= since))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn comment(content_id: Uuid, text: &str, at: DateTime<Utc>) -> Comment {
        Comment::new(content_id, "test".into(), text.into(), at).unwrap()
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let repo = InMemoryContentRepository::new();
        let first = repo.get_or_create("test-url").await.unwrap();
        let second = repo.get_or_create("test-url").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(repo.list_content().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_slug() {
        let repo = InMemoryContentRepository::new();
        repo.insert(Content::new("test-url".into(), None))
            .await
            .unwrap();
        let err = repo
            .insert(Content::new("test-url".into(), Some("again".into())))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Constraint(_)));
    }

    #[tokio::test]
    async fn test_update_content_keeps_slugs_unique() {
        let repo = InMemoryContentRepository::new();
        let first = repo.get_or_create("first").await.unwrap();
        repo.get_or_create("second").await.unwrap();

        let renamed = Content {
            slug: "renamed".into(),
            body: Some("body".into()),
            ..first.clone()
        };
        repo.update(renamed).await.unwrap();
        assert_eq!(
            repo.find_by_slug("renamed").await.unwrap().unwrap().id,
            first.id
        );

        let clash = Content {
            slug: "second".into(),
            ..first.clone()
        };
        assert!(matches!(
            repo.update(clash).await,
            Err(RepoError::Constraint(_))
        ));
        assert!(matches!(
            repo.update(Content::new("ghost".into(), None)).await,
            Err(RepoError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_posted_since_matches_exact_text_in_window() {
        let repo = InMemoryCommentRepository::new();
        let now = Utc::now();
        repo.insert(comment(Uuid::new_v4(), "same comment", now - Duration::hours(2)))
            .await
            .unwrap();

        assert!(
            repo.posted_since("same comment", now - Duration::hours(24))
                .await
                .unwrap()
        );
        assert!(
            !repo
                .posted_since("same comment", now - Duration::hours(1))
                .await
                .unwrap()
        );
        assert!(
            !repo
                .posted_since("Same comment", now - Duration::hours(24))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_find_by_content_and_delete() {
        let repo = InMemoryCommentRepository::new();
        let content_id = Uuid::new_v4();
        let now = Utc::now();
        let kept = repo.insert(comment(content_id, "a", now)).await.unwrap();
        let other = repo
            .insert(comment(Uuid::new_v4(), "b", now))
            .await
            .unwrap();

        let found = repo.find_by_content_id(content_id).await.unwrap();
        assert_eq!(found, vec![kept]);

        repo.delete(other.id).await.unwrap();
        assert_eq!(repo.count().await, 1);
        assert!(matches!(
            repo.delete(other.id).await,
            Err(RepoError::NotFound)
        ));

        assert_eq!(repo.delete_by_content_id(content_id).await.unwrap(), 1);
        assert_eq!(repo.count().await, 0);
    }

    #[tokio::test]
    async fn test_update_comment_in_place() {
        let repo = InMemoryCommentRepository::new();
        let original = repo
            .insert(comment(Uuid::new_v4(), "before", Utc::now()))
            .await
            .unwrap();

        let edited = Comment {
            text: "after".into(),
            ..original.clone()
        };
        repo.update(edited).await.unwrap();

        let stored = repo.find_by_id(original.id).await.unwrap().unwrap();
        assert_eq!(stored.text, "after");
        assert_eq!(stored.created_at, original.created_at);
        assert_eq!(repo.count().await, 1);
    }
}
