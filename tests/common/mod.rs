#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use blogpost_api::{
    AppConfig, AppState, MemoryStore, create_router,
    models::{NewUser, User},
    password::hash_password,
    repository::{Repository, RepositoryState},
    search::SearchState,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const PASSWORD: &str = "correct horse battery staple";

pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
    pub config: AppConfig,
}

pub fn test_app() -> TestApp {
    test_app_with(AppConfig::default())
}

pub fn test_app_with(config: AppConfig) -> TestApp {
    let store = MemoryStore::new();
    let state = AppState {
        repo: Arc::new(store.clone()) as RepositoryState,
        search: Arc::new(store.clone()) as SearchState,
        config: config.clone(),
    };

    TestApp {
        router: create_router(state),
        store,
        config,
    }
}

/// Users seeded this way cannot log in; use `seed_user_with_password` for that.
pub async fn seed_user(store: &MemoryStore, username: &str) -> User {
    store
        .create_user(NewUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: String::new(),
        })
        .await
        .unwrap()
}

pub async fn seed_user_with_password(store: &MemoryStore, username: &str) -> User {
    store
        .create_user(NewUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: hash_password(PASSWORD).unwrap(),
        })
        .await
        .unwrap()
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Sends one request. `as_user` authenticates through the local `x-username` header.
pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    as_user: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(username) = as_user {
        builder = builder.header("x-username", username);
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    into_test_response(router.clone().oneshot(request).await.unwrap()).await
}

/// Sends a prebuilt request.
pub async fn oneshot(router: &Router, request: Request<Body>) -> TestResponse {
    into_test_response(router.clone().oneshot(request).await.unwrap()).await
}

/// Sends one request with an `Authorization` header.
pub async fn send_with_auth(
    router: &Router,
    method: Method,
    uri: &str,
    authorization: &str,
    body: Option<Value>,
) -> TestResponse {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, authorization);

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    into_test_response(router.clone().oneshot(request).await.unwrap()).await
}

async fn into_test_response(response: axum::response::Response) -> TestResponse {
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };

    TestResponse {
        status,
        headers,
        body,
    }
}

pub fn post_body(title: &str) -> Value {
    serde_json::json!({
        "title": title,
        "description": format!("About {title}"),
        "content": format!("The full text of {title}."),
    })
}

/// Creates a blogpost over HTTP and returns its representation.
pub async fn create_post(router: &Router, author: &str, title: &str) -> Value {
    let response = send(
        router,
        Method::POST,
        "/api/blogposts/",
        Some(author),
        Some(post_body(title)),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    response.body
}

pub async fn create_comment(router: &Router, author: &str, blogpost_url: &str, content: &str) -> Value {
    let response = send(
        router,
        Method::POST,
        "/api/comments/",
        Some(author),
        Some(serde_json::json!({ "content": content, "blogpost": blogpost_url })),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    response.body
}
