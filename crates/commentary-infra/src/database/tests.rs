use chrono::Utc;
use sea_orm::{DatabaseBackend, MockDatabase};
use uuid::Uuid;

use commentary_core::domain::Content;
use commentary_core::ports::{BaseRepository, CommentHistory, ContentRepository};

use crate::database::entity::{comment, content};
use crate::database::postgres_repo::{PostgresCommentRepository, PostgresContentRepository};

fn comment_row(text: &str) -> comment::Model {
    comment::Model {
        id: Uuid::new_v4(),
        content_id: Uuid::new_v4(),
        username: "test".to_owned(),
        comment: text.to_owned(),
        created: Utc::now().into(),
    }
}

#[tokio::test]
async fn test_posted_since_reports_matches() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![comment_row("same comment")], vec![]])
        .into_connection();
    let repo = PostgresCommentRepository::new(db);
    let since = Utc::now() - chrono::Duration::hours(24);

    assert!(repo.posted_since("same comment", since).await.unwrap());
    assert!(!repo.posted_since("something else", since).await.unwrap());
}

#[tokio::test]
async fn test_get_or_create_inserts_missing_slug() {
    let created = content::Model {
        id: Uuid::new_v4(),
        slug: "a-new-url".to_owned(),
        content: None,
    };

    // First the slug lookup finds nothing, then the INSERT ... RETURNING row.
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![], vec![created.clone()]])
        .into_connection();
    let repo = PostgresContentRepository::new(db);

    let content = repo.get_or_create("a-new-url").await.unwrap();
    assert_eq!(content.slug, "a-new-url");
    assert_eq!(content.id, created.id);
}

#[tokio::test]
async fn test_find_content_by_id() {
    let id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![content::Model {
            id,
            slug: "test-url".to_owned(),
            content: Some("test content".to_owned()),
        }]])
        .into_connection();
    let repo = PostgresContentRepository::new(db);

    let found: Option<Content> = repo.find_by_id(id).await.unwrap();
    let found = found.unwrap();
    assert_eq!(found.slug, "test-url");
    assert_eq!(found.body.as_deref(), Some("test content"));
}

#[tokio::test]
async fn test_update_content_returns_stored_row() {
    let id = Uuid::new_v4();
    let updated = content::Model {
        id,
        slug: "renamed".to_owned(),
        content: Some("edited".to_owned()),
    };
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![updated.clone()]])
        .into_connection();
    let repo = PostgresContentRepository::new(db);

    let content = Content {
        id,
        slug: "renamed".to_owned(),
        body: Some("edited".to_owned()),
    };
    let stored: Content = repo.update(content).await.unwrap();
    assert_eq!(stored.slug, "renamed");
    assert_eq!(stored.body.as_deref(), Some("edited"));
}
