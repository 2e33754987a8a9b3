use crate::{
    AppState,
    handlers::{self, blogposts, comments, users},
};
use axum::{Router, routing::get};

/// Resource Router Module
///
/// Every collection and item path ends with a slash. `prefix` is either empty
/// or starts with `/` and has no trailing slash.
pub fn resource_routes(prefix: &str) -> Router<AppState> {
    Router::new()
        // GET {prefix}/
        // Index of the collections.
        .route(&format!("{prefix}/"), get(handlers::api_root))
        // GET/POST {prefix}/blogposts/
        // List (filters, `q` search, pagination) is public; create needs a token.
        .route(
            &format!("{prefix}/blogposts/"),
            get(blogposts::list_blogposts).post(blogposts::create_blogpost),
        )
        // GET/PUT/PATCH/DELETE {prefix}/blogposts/{id}/
        // Writes are reserved to the author.
        .route(
            &format!("{prefix}/blogposts/{{id}}/"),
            get(blogposts::get_blogpost)
                .put(blogposts::update_blogpost)
                .patch(blogposts::partial_update_blogpost)
                .delete(blogposts::delete_blogpost),
        )
        .route(
            &format!("{prefix}/comments/"),
            get(comments::list_comments).post(comments::create_comment),
        )
        .route(
            &format!("{prefix}/comments/{{id}}/"),
            get(comments::get_comment)
                .put(comments::update_comment)
                .patch(comments::partial_update_comment)
                .delete(comments::delete_comment),
        )
        // Users are read-only over HTTP and addressed by username.
        .route(&format!("{prefix}/users/"), get(users::list_users))
        .route(&format!("{prefix}/users/{{username}}/"), get(users::get_user))
}
