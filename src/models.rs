use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// A row of the `users` table. Users are referenced by blogposts and comments
/// but never owned by them. The password hash is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub date_joined: DateTime<Utc>,
}

/// Blogpost
///
/// A row of the `blogposts` table, joined with the author's username.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct Blogpost {
    pub id: i64,
    pub title: String,
    // Derived from the title at creation; never written by clients.
    pub slug: String,
    pub description: String,
    pub content: String,
    pub allow_comments: bool,
    pub author_id: i64,
    // Loaded via a JOIN on `users`.
    pub author_username: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// Comment
///
/// A row of the `comments` table, joined with the author's username.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub author_id: i64,
    pub author_username: String,
    // Fixed at creation.
    pub blogpost_id: i64,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

// --- Write Models (produced by the serializers, consumed by the repository) ---

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewBlogpost {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub content: String,
    pub allow_comments: bool,
    pub author_id: i64,
}

/// Partial update of a blogpost. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlogpostChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub allow_comments: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub content: String,
    pub author_id: i64,
    pub blogpost_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentChanges {
    pub content: Option<String>,
}

// --- Request Payloads (Input Schemas) ---

/// BlogpostInput
///
/// The writable fields of a blogpost. Read-only fields (`slug`, `author`, ...)
/// may be present in a payload but are never taken from it.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct BlogpostInput {
    pub title: String,
    pub description: String,
    pub content: String,
    #[serde(default = "default_allow_comments")]
    pub allow_comments: bool,
}

fn default_allow_comments() -> bool {
    true
}

/// CommentInput
///
/// `blogpost` is a hyperlink (or bare id) and can only be set at creation.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CommentInput {
    pub content: String,
    #[schema(example = "http://localhost:3000/api/blogposts/1/")]
    pub blogpost: String,
}

/// ObtainTokenRequest
///
/// Credentials exchanged for a token at `POST /api-token-auth/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ObtainTokenRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// TokenRequest
///
/// Body of the refresh and verify endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct TokenRequest {
    pub token: Option<String>,
}

// --- Representations (Output Schemas) ---

/// TokenResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct TokenResponse {
    pub token: String,
}

/// UserResponse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserResponse {
    pub url: String,
    pub username: String,
}

/// CommentResponse
///
/// `author` and `blogpost` are hyperlinks, not raw identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CommentResponse {
    pub url: String,
    pub id: i64,
    pub content: String,
    pub author: String,
    #[ts(type = "string")]
    pub created: DateTime<Utc>,
    #[ts(type = "string")]
    pub modified: DateTime<Utc>,
    pub blogpost: String,
}

/// BlogpostResponse
///
/// Carries the nested, ordered collection of its comments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct BlogpostResponse {
    pub url: String,
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub content: String,
    pub allow_comments: bool,
    pub author: String,
    #[ts(type = "string")]
    pub created: DateTime<Utc>,
    #[ts(type = "string")]
    pub modified: DateTime<Utc>,
    pub comments: Vec<CommentResponse>,
}

/// ApiRoot
///
/// Index of the resource collections served at `GET {prefix}/`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ApiRoot {
    pub users: String,
    pub blogposts: String,
    pub comments: String,
}
