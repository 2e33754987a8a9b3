//! Resource endpoints.
//!
//! Each viewset module follows the same order of operations: view-level
//! permission check, object lookup (404), object-level permission check,
//! validation, persistence, serialization.

pub mod blogposts;
pub mod comments;
pub mod tokens;
pub mod users;

use axum::{Json, extract::State};

use crate::{AppState, auth::Actor, error::ApiError, models::ApiRoot};

/// Path ids are numeric; anything else simply does not exist.
pub(crate) fn parse_pk(raw: &str) -> Result<i64, ApiError> {
    raw.parse().map_err(|_| ApiError::not_found())
}

/// api_root
///
/// [Public Route] Lists the URLs of the resource collections.
#[utoipa::path(
    get,
    path = "/api/",
    responses((status = 200, description = "Resource index", body = ApiRoot))
)]
pub async fn api_root(_actor: Actor, State(state): State<AppState>) -> Json<ApiRoot> {
    let links = state.config.links();
    Json(ApiRoot {
        users: links.users(),
        blogposts: links.blogposts(),
        comments: links.comments(),
    })
}
