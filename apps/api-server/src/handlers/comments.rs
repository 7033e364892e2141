//! Comment handlers.
//!
//! Every handler runs the comment throttle chain before reading the body, so
//! a locked-out caller is refused whatever they send and malformed creates
//! still count against the quota.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use commentary_core::domain::{Comment, validate_slug};
use commentary_core::error::DomainError;
use commentary_core::throttle::{Action, RequestContext};
use commentary_shared::dto::{CommentResponse, CreateCommentRequest, UpdateCommentRequest};

use super::{Body, enforce, parsed};
use crate::middleware::caller::Caller;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

pub(super) fn to_response(comment: Comment) -> CommentResponse {
    CommentResponse {
        id: comment.id,
        content: comment.content_id,
        username: comment.username,
        comment: comment.text,
        created: comment.created_at,
    }
}

/// GET /api/comments
pub async fn list(state: web::Data<AppState>, caller: Caller) -> AppResult<HttpResponse> {
    enforce(
        &state.comment_throttle,
        RequestContext::new(caller.as_str(), Action::List),
    )
    .await?;

    let comments = state.comments.list_comments().await?;
    let body: Vec<CommentResponse> = comments.into_iter().map(to_response).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// POST /api/comments
///
/// Creates the target content on first use.
pub async fn create(
    state: web::Data<AppState>,
    caller: Caller,
    body: Body<CreateCommentRequest>,
) -> AppResult<HttpResponse> {
    let ctx = RequestContext::new(caller.as_str(), Action::Create);
    let ctx = match &body {
        Ok(req) => ctx.with_comment(&req.comment),
        Err(_) => ctx,
    };
    enforce(&state.comment_throttle, ctx).await?;

    let req = parsed(body)?;

    // Validate everything before the content row is created.
    validate_slug(&req.content_url)?;
    let mut comment = Comment::new(Uuid::nil(), req.username, req.comment, state.clock.now())?;

    let content = state.contents.get_or_create(&req.content_url).await?;
    comment.content_id = content.id;
    let saved = state.comments.insert(comment).await?;

    tracing::info!(
        comment_id = %saved.id,
        content = %content.slug,
        caller = %caller.as_str(),
        "Comment posted"
    );

    Ok(HttpResponse::Created().json(to_response(saved)))
}

/// GET /api/comments/{id}
pub async fn retrieve(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    enforce(
        &state.comment_throttle,
        RequestContext::new(caller.as_str(), Action::Retrieve),
    )
    .await?;

    let comment = find(&state, id).await?;
    Ok(HttpResponse::Ok().json(to_response(comment)))
}

/// PUT /api/comments/{id}
pub async fn update(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<Uuid>,
    body: Body<UpdateCommentRequest>,
) -> AppResult<HttpResponse> {
    edit(state, caller, path.into_inner(), body, false).await
}

/// PATCH /api/comments/{id}
pub async fn partial_update(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<Uuid>,
    body: Body<UpdateCommentRequest>,
) -> AppResult<HttpResponse> {
    edit(state, caller, path.into_inner(), body, true).await
}

async fn edit(
    state: web::Data<AppState>,
    caller: Caller,
    id: Uuid,
    body: Body<UpdateCommentRequest>,
    partial: bool,
) -> AppResult<HttpResponse> {
    enforce(
        &state.comment_throttle,
        RequestContext::new(caller.as_str(), Action::Update),
    )
    .await?;

    let req = parsed(body)?;
    if !partial && (req.username.is_none() || req.comment.is_none()) {
        return Err(AppError::BadRequest(
            "username and comment are required".to_string(),
        ));
    }

    let existing = find(&state, id).await?;
    let edited = Comment::new(
        existing.content_id,
        req.username.unwrap_or(existing.username),
        req.comment.unwrap_or(existing.text),
        existing.created_at,
    )?;
    let saved = state
        .comments
        .update(Comment {
            id: existing.id,
            ..edited
        })
        .await?;

    tracing::info!(comment_id = %saved.id, "Comment edited");
    Ok(HttpResponse::Ok().json(to_response(saved)))
}

/// DELETE /api/comments/{id}
pub async fn destroy(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    enforce(
        &state.comment_throttle,
        RequestContext::new(caller.as_str(), Action::Destroy),
    )
    .await?;

    state.comments.delete(id).await?;
    tracing::info!(comment_id = %id, "Comment deleted");
    Ok(HttpResponse::NoContent().finish())
}

async fn find(state: &AppState, id: Uuid) -> AppResult<Comment> {
    let comment = state
        .comments
        .find_by_id(id)
        .await?
        .ok_or(DomainError::NotFound {
            entity_type: "Comment",
            id,
        })?;
    Ok(comment)
}
