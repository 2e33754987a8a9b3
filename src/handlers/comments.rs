use axum::{
    Json,
    extract::{Path, RawQuery, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use serde_json::Value;

use super::parse_pk;
use crate::{
    AppState,
    auth::Actor,
    error::ApiError,
    extract::{ApiJson, ApiQuery},
    filters::CommentFilterParams,
    models::{Comment, CommentInput, CommentResponse, NewComment},
    pagination::{PageParams, Paginated},
    permissions::{Action, comment_parent_permissions, comment_permissions},
    serializers::CommentSerializer,
};

async fn load_for(
    state: &AppState,
    actor: &Actor,
    action: Action,
    raw_id: &str,
) -> Result<Comment, ApiError> {
    let permissions = comment_permissions();
    permissions.check(actor, action)?;

    let comment = state
        .repo
        .get_comment(parse_pk(raw_id)?)
        .await?
        .ok_or_else(ApiError::not_found)?;

    permissions.check_object(actor, action, &comment)?;
    Ok(comment)
}

/// list_comments
///
/// [Public Route] Lists comments, filtered by the query parameters and paginated.
#[utoipa::path(
    get,
    path = "/api/comments/",
    params(CommentFilterParams, PageParams),
    responses(
        (status = 200, description = "One page of comments", body = Paginated<CommentResponse>),
        (status = 400, description = "Malformed filter value"),
        (status = 404, description = "Invalid page")
    )
)]
pub async fn list_comments(
    actor: Actor,
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<CommentFilterParams>,
    ApiQuery(paging): ApiQuery<PageParams>,
    RawQuery(raw_query): RawQuery,
) -> Result<Json<Paginated<CommentResponse>>, ApiError> {
    comment_permissions().check(&actor, Action::List)?;

    let query = filter.resolve(state.search.as_ref()).await?;
    let page = paging.resolve(state.config.page_size)?;
    let listing = state.repo.list_comments(&query, page).await?;

    let links = state.config.links();
    let results = listing
        .items
        .iter()
        .map(|comment| CommentSerializer::represent(comment, &links))
        .collect();

    Ok(Json(Paginated::build(
        results,
        listing.count,
        page,
        &links.comments(),
        raw_query.as_deref(),
    )?))
}

/// get_comment
///
/// [Public Route] Retrieves a single comment.
#[utoipa::path(
    get,
    path = "/api/comments/{id}/",
    params(("id" = i64, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Found", body = CommentResponse),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_comment(
    actor: Actor,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CommentResponse>, ApiError> {
    let comment = load_for(&state, &actor, Action::Retrieve, &id).await?;
    Ok(Json(CommentSerializer::represent(&comment, &state.config.links())))
}

/// create_comment
///
/// [Authenticated Route] Comments on the blogpost referenced by `blogpost`
/// (its URL). The author is the requester.
#[utoipa::path(
    post,
    path = "/api/comments/",
    request_body = CommentInput,
    responses(
        (status = 201, description = "Created", body = CommentResponse),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "The blogpost does not accept comments")
    )
)]
pub async fn create_comment(
    actor: Actor,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<Value>,
) -> Result<impl IntoResponse, ApiError> {
    comment_permissions().check(&actor, Action::Create)?;
    let author = actor
        .user()
        .ok_or_else(|| ApiError::AuthenticationRequired("Authentication required.".into()))?;

    let links = state.config.links();
    let draft = CommentSerializer::validate_create(&payload, &links)?;

    let post = state
        .repo
        .get_blogpost(draft.blogpost_id)
        .await?
        .ok_or_else(ApiError::missing_blogpost)?;

    comment_parent_permissions(state.config.enforce_comments_allowed).check_object(
        &actor,
        Action::Create,
        &post,
    )?;

    let comment = state
        .repo
        .create_comment(NewComment {
            content: draft.content,
            author_id: author.id,
            blogpost_id: post.id,
        })
        .await?;

    tracing::info!(comment_id = comment.id, blogpost_id = post.id, author = %author.username, "comment created");

    let body = CommentSerializer::represent(&comment, &links);
    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&body.url) {
        headers.insert(header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(body)))
}

async fn apply_update(
    actor: Actor,
    state: AppState,
    id: String,
    payload: Value,
    partial: bool,
) -> Result<Json<CommentResponse>, ApiError> {
    let action = if partial {
        Action::PartialUpdate
    } else {
        Action::Update
    };
    let comment = load_for(&state, &actor, action, &id).await?;

    let links = state.config.links();
    let current = CommentSerializer::represent(&comment, &links);
    let changes = CommentSerializer::validate_update(&payload, &current, &links, partial)?;

    let updated = state
        .repo
        .update_comment(comment.id, changes)
        .await?
        .ok_or_else(ApiError::not_found)?;

    tracing::info!(comment_id = updated.id, actor = actor.name(), partial, "comment updated");
    Ok(Json(CommentSerializer::represent(&updated, &links)))
}

/// update_comment
///
/// [Author Only] Replaces the content of a comment. `blogpost` cannot be moved.
#[utoipa::path(
    put,
    path = "/api/comments/{id}/",
    params(("id" = i64, Path, description = "Comment ID")),
    request_body = CommentInput,
    responses(
        (status = 200, description = "Updated", body = CommentResponse),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_comment(
    actor: Actor,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<Value>,
) -> Result<Json<CommentResponse>, ApiError> {
    apply_update(actor, state, id, payload, false).await
}

/// partial_update_comment
#[utoipa::path(
    patch,
    path = "/api/comments/{id}/",
    params(("id" = i64, Path, description = "Comment ID")),
    request_body = CommentInput,
    responses(
        (status = 200, description = "Updated", body = CommentResponse),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn partial_update_comment(
    actor: Actor,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<Value>,
) -> Result<Json<CommentResponse>, ApiError> {
    apply_update(actor, state, id, payload, true).await
}

/// delete_comment
///
/// [Author Only]
#[utoipa::path(
    delete,
    path = "/api/comments/{id}/",
    params(("id" = i64, Path, description = "Comment ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_comment(
    actor: Actor,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let comment = load_for(&state, &actor, Action::Destroy, &id).await?;

    if !state.repo.delete_comment(comment.id).await? {
        return Err(ApiError::not_found());
    }

    tracing::info!(comment_id = comment.id, actor = actor.name(), "comment deleted");
    Ok(StatusCode::NO_CONTENT)
}
