/// Router Module Index
///
/// The resource viewsets are mounted under the configurable API prefix; the
/// token and health endpoints always live at the root.

/// `{prefix}/`, `{prefix}/blogposts/`, `{prefix}/comments/`, `{prefix}/users/`.
/// Access control happens per action inside the handlers.
pub mod resources;

/// Token issue/refresh/verify and the health check.
pub mod tokens;
