use std::collections::HashMap;

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
    filters::BlogpostFilterParams,
    models::{Blogpost, BlogpostInput, BlogpostResponse, Comment, NewBlogpost},
    pagination::{PageParams, Paginated},
    permissions::{Action, blogpost_permissions},
    serializers::{BlogpostSerializer, Links, slugify},
};

/// Serializes blogposts with their comments, fetched in one query.
async fn represent_all(
    state: &AppState,
    posts: &[Blogpost],
    links: &Links,
) -> Result<Vec<BlogpostResponse>, ApiError> {
    let ids: Vec<i64> = posts.iter().map(|post| post.id).collect();
    let mut by_post: HashMap<i64, Vec<Comment>> = HashMap::new();
    for comment in state.repo.comments_for_blogposts(&ids).await? {
        by_post.entry(comment.blogpost_id).or_default().push(comment);
    }

    Ok(posts
        .iter()
        .map(|post| {
            let comments = by_post.get(&post.id).map(Vec::as_slice).unwrap_or_default();
            BlogpostSerializer::represent(post, comments, links)
        })
        .collect())
}

async fn represent_one(state: &AppState, post: &Blogpost) -> Result<BlogpostResponse, ApiError> {
    let links = state.config.links();
    let comments = state.repo.comments_for_blogposts(&[post.id]).await?;
    Ok(BlogpostSerializer::represent(post, &comments, &links))
}

/// Loads the blogpost and runs the object-level checks for `action`.
async fn load_for(
    state: &AppState,
    actor: &Actor,
    action: Action,
    raw_id: &str,
) -> Result<Blogpost, ApiError> {
    let permissions = blogpost_permissions();
    permissions.check(actor, action)?;

    let post = state
        .repo
        .get_blogpost(parse_pk(raw_id)?)
        .await?
        .ok_or_else(ApiError::not_found)?;

    permissions.check_object(actor, action, &post)?;
    Ok(post)
}

/// list_blogposts
///
/// [Public Route] Lists blogposts, filtered by the query parameters and paginated.
#[utoipa::path(
    get,
    path = "/api/blogposts/",
    params(BlogpostFilterParams, PageParams),
    responses(
        (status = 200, description = "One page of blogposts", body = Paginated<BlogpostResponse>),
        (status = 400, description = "Malformed filter value"),
        (status = 404, description = "Invalid page")
    )
)]
pub async fn list_blogposts(
    actor: Actor,
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<BlogpostFilterParams>,
    ApiQuery(paging): ApiQuery<PageParams>,
    RawQuery(raw_query): RawQuery,
) -> Result<Json<Paginated<BlogpostResponse>>, ApiError> {
    blogpost_permissions().check(&actor, Action::List)?;

    let query = filter.resolve(state.search.as_ref()).await?;
    let page = paging.resolve(state.config.page_size)?;
    let listing = state.repo.list_blogposts(&query, page).await?;

    let links = state.config.links();
    let results = represent_all(&state, &listing.items, &links).await?;

    Ok(Json(Paginated::build(
        results,
        listing.count,
        page,
        &links.blogposts(),
        raw_query.as_deref(),
    )?))
}

/// get_blogpost
///
/// [Public Route] Retrieves a single blogpost with its comments.
#[utoipa::path(
    get,
    path = "/api/blogposts/{id}/",
    params(("id" = i64, Path, description = "Blogpost ID")),
    responses(
        (status = 200, description = "Found", body = BlogpostResponse),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_blogpost(
    actor: Actor,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BlogpostResponse>, ApiError> {
    let post = load_for(&state, &actor, Action::Retrieve, &id).await?;
    Ok(Json(represent_one(&state, &post).await?))
}

/// create_blogpost
///
/// [Authenticated Route] Creates a blogpost authored by the requester.
/// `slug` is derived from the title; any client-supplied `slug` or `author` is ignored.
#[utoipa::path(
    post,
    path = "/api/blogposts/",
    request_body = BlogpostInput,
    responses(
        (status = 201, description = "Created", body = BlogpostResponse),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create_blogpost(
    actor: Actor,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<Value>,
) -> Result<impl IntoResponse, ApiError> {
    blogpost_permissions().check(&actor, Action::Create)?;
    let author = actor
        .user()
        .ok_or_else(|| ApiError::AuthenticationRequired("Authentication required.".into()))?;

    let input = BlogpostSerializer::validate_create(&payload)?;
    let post = state
        .repo
        .create_blogpost(NewBlogpost {
            slug: slugify(&input.title),
            title: input.title,
            description: input.description,
            content: input.content,
            allow_comments: input.allow_comments,
            author_id: author.id,
        })
        .await?;

    tracing::info!(blogpost_id = post.id, slug = %post.slug, author = %author.username, "blogpost created");

    let body = represent_one(&state, &post).await?;
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
) -> Result<Json<BlogpostResponse>, ApiError> {
    let action = if partial {
        Action::PartialUpdate
    } else {
        Action::Update
    };
    let post = load_for(&state, &actor, action, &id).await?;
    let current = represent_one(&state, &post).await?;

    let changes = BlogpostSerializer::validate_update(&payload, &current, partial)?;
    let updated = state
        .repo
        .update_blogpost(post.id, changes)
        .await?
        .ok_or_else(ApiError::not_found)?;

    tracing::info!(blogpost_id = updated.id, actor = actor.name(), partial, "blogpost updated");
    Ok(Json(represent_one(&state, &updated).await?))
}

/// update_blogpost
///
/// [Author Only] Replaces the writable fields of a blogpost.
#[utoipa::path(
    put,
    path = "/api/blogposts/{id}/",
    params(("id" = i64, Path, description = "Blogpost ID")),
    request_body = BlogpostInput,
    responses(
        (status = 200, description = "Updated", body = BlogpostResponse),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_blogpost(
    actor: Actor,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<Value>,
) -> Result<Json<BlogpostResponse>, ApiError> {
    apply_update(actor, state, id, payload, false).await
}

/// partial_update_blogpost
///
/// [Author Only] Updates only the supplied fields.
#[utoipa::path(
    patch,
    path = "/api/blogposts/{id}/",
    params(("id" = i64, Path, description = "Blogpost ID")),
    request_body = BlogpostInput,
    responses(
        (status = 200, description = "Updated", body = BlogpostResponse),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn partial_update_blogpost(
    actor: Actor,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<Value>,
) -> Result<Json<BlogpostResponse>, ApiError> {
    apply_update(actor, state, id, payload, true).await
}

/// delete_blogpost
///
/// [Author Only] Deletes a blogpost together with its comments.
#[utoipa::path(
    delete,
    path = "/api/blogposts/{id}/",
    params(("id" = i64, Path, description = "Blogpost ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_blogpost(
    actor: Actor,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let post = load_for(&state, &actor, Action::Destroy, &id).await?;

    if !state.repo.delete_blogpost(post.id).await? {
        return Err(ApiError::not_found());
    }

    tracing::info!(blogpost_id = post.id, actor = actor.name(), "blogpost deleted");
    Ok(StatusCode::NO_CONTENT)
}
