//! Content handlers.

use std::collections::HashMap;

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use commentary_core::domain::{Content, validate_slug};
use commentary_core::error::RepoError;
use commentary_core::throttle::{Action, RequestContext};
use commentary_shared::dto::{
    CommentResponse, ContentResponse, CreateContentRequest, UpdateContentRequest,
};

use super::comments::to_response;
use super::{Body, enforce, parsed};
use crate::middleware::caller::Caller;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn content_response(content: Content, comments: Vec<CommentResponse>) -> ContentResponse {
    ContentResponse {
        id: content.id,
        slug: content.slug,
        content: content.body,
        comments,
    }
}

fn slug_conflict(e: RepoError) -> AppError {
    match e {
        RepoError::Constraint(_) => {
            AppError::Conflict("Content with this slug already exists".to_string())
        }
        other => other.into(),
    }
}

/// GET /api/content
pub async fn list(state: web::Data<AppState>, caller: Caller) -> AppResult<HttpResponse> {
    enforce(
        &state.content_throttle,
        RequestContext::new(caller.as_str(), Action::List),
    )
    .await?;

    let contents = state.contents.list_content().await?;

    let mut by_content: HashMap<Uuid, Vec<CommentResponse>> = HashMap::new();
    for comment in state.comments.list_comments().await? {
        by_content
            .entry(comment.content_id)
            .or_default()
            .push(to_response(comment));
    }

    let body: Vec<ContentResponse> = contents
        .into_iter()
        .map(|c| {
            let comments = by_content.remove(&c.id).unwrap_or_default();
            content_response(c, comments)
        })
        .collect();
    Ok(HttpResponse::Ok().json(body))
}

/// POST /api/content
pub async fn create(
    state: web::Data<AppState>,
    caller: Caller,
    body: Body<CreateContentRequest>,
) -> AppResult<HttpResponse> {
    enforce(
        &state.content_throttle,
        RequestContext::new(caller.as_str(), Action::Create),
    )
    .await?;

    let req = parsed(body)?;
    validate_slug(&req.slug)?;
    let content = state
        .contents
        .insert(Content::new(req.slug, req.content))
        .await
        .map_err(slug_conflict)?;

    tracing::info!(content_id = %content.id, slug = %content.slug, "Content created");

    Ok(HttpResponse::Created().json(content_response(content, Vec::new())))
}

/// GET /api/content/{slug}
pub async fn retrieve(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    enforce(
        &state.content_throttle,
        RequestContext::new(caller.as_str(), Action::Retrieve),
    )
    .await?;

    let content = find(&state, &slug).await?;
    let comments = state.comments.find_by_content_id(content.id).await?;

    Ok(HttpResponse::Ok().json(content_response(
        content,
        comments.into_iter().map(to_response).collect(),
    )))
}

/// PUT /api/content/{slug}
pub async fn update(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<String>,
    body: Body<UpdateContentRequest>,
) -> AppResult<HttpResponse> {
    edit(state, caller, path.into_inner(), body, false).await
}

/// PATCH /api/content/{slug}
pub async fn partial_update(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<String>,
    body: Body<UpdateContentRequest>,
) -> AppResult<HttpResponse> {
    edit(state, caller, path.into_inner(), body, true).await
}

async fn edit(
    state: web::Data<AppState>,
    caller: Caller,
    slug: String,
    body: Body<UpdateContentRequest>,
    partial: bool,
) -> AppResult<HttpResponse> {
    enforce(
        &state.content_throttle,
        RequestContext::new(caller.as_str(), Action::Update),
    )
    .await?;

    let req = parsed(body)?;
    let existing = find(&state, &slug).await?;

    let new_slug = match (req.slug, partial) {
        (Some(new_slug), _) => new_slug,
        (None, true) => existing.slug,
        (None, false) => return Err(AppError::BadRequest("slug is required".to_string())),
    };
    validate_slug(&new_slug)?;

    // PUT replaces the body outright; PATCH keeps it unless one is given.
    let body = if partial {
        req.content.or(existing.body)
    } else {
        req.content
    };

    let saved = state
        .contents
        .update(Content {
            id: existing.id,
            slug: new_slug,
            body,
        })
        .await
        .map_err(slug_conflict)?;
    let comments = state.comments.find_by_content_id(saved.id).await?;

    tracing::info!(content_id = %saved.id, slug = %saved.slug, "Content edited");
    Ok(HttpResponse::Ok().json(content_response(
        saved,
        comments.into_iter().map(to_response).collect(),
    )))
}

/// DELETE /api/content/{slug}
///
/// Removes the content's comments with it.
pub async fn destroy(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    enforce(
        &state.content_throttle,
        RequestContext::new(caller.as_str(), Action::Destroy),
    )
    .await?;

    let content = find(&state, &slug).await?;
    let removed = state.comments.delete_by_content_id(content.id).await?;
    state.contents.delete(content.id).await?;

    tracing::info!(content_id = %content.id, slug = %slug, comments = removed, "Content deleted");
    Ok(HttpResponse::NoContent().finish())
}

async fn find(state: &AppState, slug: &str) -> AppResult<Content> {
    state
        .contents
        .find_by_slug(slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Content '{}' not found", slug)))
}
