//! PostgreSQL repository implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use commentary_core::domain::{Comment, Content};
use commentary_core::error::RepoError;
use commentary_core::ports::{BaseRepository, CommentHistory, CommentRepository, ContentRepository};

use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::content::{self, Entity as ContentEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL content repository.
pub type PostgresContentRepository = PostgresBaseRepository<ContentEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

#[async_trait]
impl ContentRepository for PostgresContentRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Content>, RepoError> {
        let result = ContentEntity::find()
            .filter(content::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn get_or_create(&self, slug: &str) -> Result<Content, RepoError> {
        if let Some(existing) = self.find_by_slug(slug).await? {
            return Ok(existing);
        }

        let fresh = Content::new(slug.to_string(), None);
        match BaseRepository::<Content, Uuid>::insert(self, fresh).await {
            Ok(created) => {
                tracing::debug!(slug = %slug, "Created content for new slug");
                Ok(created)
            }
            // Lost a race with another request creating the same slug.
            Err(RepoError::Constraint(_)) => {
                self.find_by_slug(slug).await?.ok_or(RepoError::NotFound)
            }
            Err(e) => Err(e),
        }
    }

    async fn list_content(&self) -> Result<Vec<Content>, RepoError> {
        let result = ContentEntity::find()
            .order_by_asc(content::Column::Slug)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn list_comments(&self) -> Result<Vec<Comment>, RepoError> {
        let result = CommentEntity::find()
            .order_by_asc(comment::Column::Created)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn find_by_content_id(&self, content_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let result = CommentEntity::find()
            .filter(comment::Column::ContentId.eq(content_id))
            .order_by_asc(comment::Column::Created)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn delete_by_content_id(&self, content_id: Uuid) -> Result<u64, RepoError> {
        let result = CommentEntity::delete_many()
            .filter(comment::Column::ContentId.eq(content_id))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected)
    }
}

#[async_trait]
impl CommentHistory for PostgresCommentRepository {
    async fn posted_since(&self, text: &str, since: DateTime<Utc>) -> Result<bool, RepoError> {
        let found = CommentEntity::find()
            .filter(comment::Column::Comment.eq(text))
            .filter(comment::Column::Created.gte(since))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(found.is_some())
    }
}
