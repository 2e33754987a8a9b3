use axum::{
    Json,
    extract::{Path, RawQuery, State},
};

use crate::{
    AppState,
    auth::Actor,
    error::ApiError,
    extract::ApiQuery,
    models::UserResponse,
    pagination::{PageParams, Paginated},
    serializers::UserSerializer,
};

/// list_users
///
/// [Public Route] Lists users ordered by username.
#[utoipa::path(
    get,
    path = "/api/users/",
    params(PageParams),
    responses(
        (status = 200, description = "One page of users", body = Paginated<UserResponse>),
        (status = 404, description = "Invalid page")
    )
)]
pub async fn list_users(
    _actor: Actor,
    State(state): State<AppState>,
    ApiQuery(paging): ApiQuery<PageParams>,
    RawQuery(raw_query): RawQuery,
) -> Result<Json<Paginated<UserResponse>>, ApiError> {
    let page = paging.resolve(state.config.page_size)?;
    let listing = state.repo.list_users(page).await?;

    let links = state.config.links();
    let results = listing
        .items
        .iter()
        .map(|user| UserSerializer::represent(user, &links))
        .collect();

    Ok(Json(Paginated::build(
        results,
        listing.count,
        page,
        &links.users(),
        raw_query.as_deref(),
    )?))
}

/// get_user
///
/// [Public Route] Users are addressed by username.
#[utoipa::path(
    get,
    path = "/api/users/{username}/",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "Found", body = UserResponse),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_user(
    _actor: Actor,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .repo
        .get_user_by_username(&username)
        .await?
        .ok_or_else(ApiError::not_found)?;

    Ok(Json(UserSerializer::represent(&user, &state.config.links())))
}
