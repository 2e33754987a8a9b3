mod common;

use axum::http::{Method, StatusCode, header};
use blogpost_api::{ApiError, AppConfig, models::NewComment, repository::Repository};
use common::{create_comment, create_post, post_body, seed_user, send, test_app, test_app_with};
use serde_json::json;

const ORIGIN: &str = "http://localhost:3000";

/// Hyperlinks are absolute; requests only need the path.
fn path_of(url: &serde_json::Value) -> String {
    url.as_str().unwrap().trim_start_matches(ORIGIN).to_string()
}

// --- Reads ---

#[tokio::test]
async fn test_health_check() {
    let app = test_app();
    let response = send(&app.router, Method::GET, "/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!("ok"));
}

#[tokio::test]
async fn test_api_root_lists_collections() {
    let app = test_app();
    let response = send(&app.router, Method::GET, "/api/", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["blogposts"], json!("http://localhost:3000/api/blogposts/"));
    assert_eq!(response.body["comments"], json!("http://localhost:3000/api/comments/"));
    assert_eq!(response.body["users"], json!("http://localhost:3000/api/users/"));
}

#[tokio::test]
async fn test_anonymous_list_and_retrieve_succeed() {
    let app = test_app();
    seed_user(&app.store, "alice").await;
    let post = create_post(&app.router, "alice", "First post").await;

    let list = send(&app.router, Method::GET, "/api/blogposts/", None, None).await;
    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(list.body["count"], 1);
    assert_eq!(list.body["results"][0]["title"], "First post");

    let detail = send(&app.router, Method::GET, &path_of(&post["url"]), None, None).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.body["id"], post["id"]);
    assert_eq!(detail.body["author"], "http://localhost:3000/api/users/alice/");
}

#[tokio::test]
async fn test_unknown_or_non_numeric_id_is_not_found() {
    let app = test_app();

    let missing = send(&app.router, Method::GET, "/api/blogposts/999/", None, None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["detail"], "Not found.");

    let garbage = send(&app.router, Method::GET, "/api/comments/abc/", None, None).await;
    assert_eq!(garbage.status, StatusCode::NOT_FOUND);
}

// --- Authentication & authorization ---

#[tokio::test]
async fn test_anonymous_writes_require_authentication() {
    let app = test_app();
    seed_user(&app.store, "alice").await;
    let post = create_post(&app.router, "alice", "Guarded").await;
    let url = path_of(&post["url"]);

    let create = send(
        &app.router,
        Method::POST,
        "/api/blogposts/",
        None,
        Some(post_body("Sneaky")),
    )
    .await;
    assert_eq!(create.status, StatusCode::UNAUTHORIZED);
    assert!(create.headers.contains_key(header::WWW_AUTHENTICATE));
    assert_eq!(
        create.body["detail"],
        "Authentication credentials were not provided."
    );

    let update = send(&app.router, Method::PUT, &url, None, Some(post_body("Sneaky"))).await;
    assert_eq!(update.status, StatusCode::UNAUTHORIZED);

    let delete = send(&app.router, Method::DELETE, &url, None, None).await;
    assert_eq!(delete.status, StatusCode::UNAUTHORIZED);

    // Checked before the lookup: no existence leak.
    let delete_missing = send(&app.router, Method::DELETE, "/api/blogposts/999/", None, None).await;
    assert_eq!(delete_missing.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_author_cannot_update_or_delete_blogpost() {
    let app = test_app();
    seed_user(&app.store, "alice").await;
    seed_user(&app.store, "mallory").await;
    let post = create_post(&app.router, "alice", "Mine").await;
    let url = path_of(&post["url"]);

    let update = send(
        &app.router,
        Method::PATCH,
        &url,
        Some("mallory"),
        Some(json!({ "title": "Yours now" })),
    )
    .await;
    assert_eq!(update.status, StatusCode::FORBIDDEN);
    assert_eq!(
        update.body["detail"],
        "You do not have permission to perform this action."
    );

    let delete = send(&app.router, Method::DELETE, &url, Some("mallory"), None).await;
    assert_eq!(delete.status, StatusCode::FORBIDDEN);

    let still_there = send(&app.router, Method::GET, &url, None, None).await;
    assert_eq!(still_there.status, StatusCode::OK);
    assert_eq!(still_there.body["title"], "Mine");
}

#[tokio::test]
async fn test_author_delete_removes_post_and_comments() {
    let app = test_app();
    seed_user(&app.store, "alice").await;
    seed_user(&app.store, "bob").await;
    let post = create_post(&app.router, "alice", "Short lived").await;
    let comment = create_comment(&app.router, "bob", post["url"].as_str().unwrap(), "Nice").await;

    let delete = send(&app.router, Method::DELETE, &path_of(&post["url"]), Some("alice"), None).await;
    assert_eq!(delete.status, StatusCode::NO_CONTENT);

    let gone = send(&app.router, Method::GET, &path_of(&post["url"]), None, None).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);

    let orphan = send(&app.router, Method::GET, &path_of(&comment["url"]), None, None).await;
    assert_eq!(orphan.status, StatusCode::NOT_FOUND);
}

// --- Blogpost writes ---

#[tokio::test]
async fn test_create_blogpost_derives_slug_and_author() {
    let app = test_app();
    seed_user(&app.store, "alice").await;
    seed_user(&app.store, "bob").await;

    let response = send(
        &app.router,
        Method::POST,
        "/api/blogposts/",
        Some("alice"),
        Some(json!({
            "title": "Hello World",
            "description": "greeting",
            "content": "hi",
            "slug": "custom-slug",
            "author": "http://localhost:3000/api/users/bob/",
        })),
    )
    .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["slug"], "hello-world");
    assert_eq!(response.body["author"], "http://localhost:3000/api/users/alice/");
    assert_eq!(response.body["allow_comments"], true);
    assert_eq!(response.body["comments"], json!([]));
    assert_eq!(
        response.headers.get(header::LOCATION).unwrap(),
        response.body["url"].as_str().unwrap()
    );
}

#[tokio::test]
async fn test_create_blogpost_validation_errors() {
    let app = test_app();
    seed_user(&app.store, "alice").await;

    let response = send(
        &app.router,
        Method::POST,
        "/api/blogposts/",
        Some("alice"),
        Some(json!({ "title": "x".repeat(256), "content": "" })),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.body["title"],
        json!(["Ensure this field has no more than 255 characters."])
    );
    assert_eq!(response.body["description"], json!(["This field is required."]));
    assert_eq!(response.body["content"], json!(["This field may not be blank."]));
}

#[tokio::test]
async fn test_update_keeps_slug_and_rejects_read_only_changes() {
    let app = test_app();
    seed_user(&app.store, "alice").await;
    let post = create_post(&app.router, "alice", "Original Title").await;
    let url = path_of(&post["url"]);

    // A full echo of the representation with a new title is accepted.
    let mut body = post.clone();
    body["title"] = json!("Renamed");
    let put = send(&app.router, Method::PUT, &url, Some("alice"), Some(body)).await;
    assert_eq!(put.status, StatusCode::OK, "{:?}", put.body);
    assert_eq!(put.body["title"], "Renamed");
    assert_eq!(put.body["slug"], "original-title");

    let patch = send(
        &app.router,
        Method::PATCH,
        &url,
        Some("alice"),
        Some(json!({ "slug": "hijacked" })),
    )
    .await;
    assert_eq!(patch.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        patch.body["slug"],
        json!(["This field is read-only and cannot be changed."])
    );
}

#[tokio::test]
async fn test_put_requires_every_writable_field_but_patch_does_not() {
    let app = test_app();
    seed_user(&app.store, "alice").await;
    let post = create_post(&app.router, "alice", "Partial").await;
    let url = path_of(&post["url"]);

    let put = send(
        &app.router,
        Method::PUT,
        &url,
        Some("alice"),
        Some(json!({ "title": "Only title" })),
    )
    .await;
    assert_eq!(put.status, StatusCode::BAD_REQUEST);
    assert!(put.body.get("content").is_some());

    let patch = send(
        &app.router,
        Method::PATCH,
        &url,
        Some("alice"),
        Some(json!({ "allow_comments": false })),
    )
    .await;
    assert_eq!(patch.status, StatusCode::OK);
    assert_eq!(patch.body["allow_comments"], false);
    assert_eq!(patch.body["title"], "Partial");
}

// --- Comments ---

#[tokio::test]
async fn test_comment_author_is_the_requester() {
    let app = test_app();
    seed_user(&app.store, "alice").await;
    seed_user(&app.store, "bob").await;
    let post = create_post(&app.router, "alice", "Discuss").await;

    let response = send(
        &app.router,
        Method::POST,
        "/api/comments/",
        Some("bob"),
        Some(json!({
            "content": "First!",
            "blogpost": post["url"],
            "author": "http://localhost:3000/api/users/alice/",
        })),
    )
    .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["author"], "http://localhost:3000/api/users/bob/");
    assert_eq!(response.body["blogpost"], post["url"]);
}

#[tokio::test]
async fn test_comments_are_nested_in_creation_order() {
    let app = test_app();
    seed_user(&app.store, "alice").await;
    seed_user(&app.store, "bob").await;
    let post = create_post(&app.router, "alice", "Thread").await;
    let link = post["url"].as_str().unwrap();

    create_comment(&app.router, "bob", link, "one").await;
    create_comment(&app.router, "alice", link, "two").await;

    let detail = send(&app.router, Method::GET, &path_of(&post["url"]), None, None).await;
    let contents: Vec<&str> = detail.body["comments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["one", "two"]);
}

#[tokio::test]
async fn test_comment_blogpost_reference_errors() {
    let app = test_app();
    seed_user(&app.store, "bob").await;

    let bad_link = send(
        &app.router,
        Method::POST,
        "/api/comments/",
        Some("bob"),
        Some(json!({ "content": "hi", "blogpost": "http://localhost:3000/api/users/bob/" })),
    )
    .await;
    assert_eq!(bad_link.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_link.body["blogpost"], json!(["Invalid hyperlink - No URL match."]));

    let missing = send(
        &app.router,
        Method::POST,
        "/api/comments/",
        Some("bob"),
        Some(json!({ "content": "hi", "blogpost": "http://localhost:3000/api/blogposts/404/" })),
    )
    .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        missing.body["blogpost"],
        json!(["Invalid hyperlink - Object does not exist."])
    );
}

#[tokio::test]
async fn test_comment_cannot_move_to_another_blogpost() {
    let app = test_app();
    seed_user(&app.store, "alice").await;
    let first = create_post(&app.router, "alice", "First").await;
    let second = create_post(&app.router, "alice", "Second").await;
    let comment = create_comment(&app.router, "alice", first["url"].as_str().unwrap(), "here").await;

    let response = send(
        &app.router,
        Method::PATCH,
        &path_of(&comment["url"]),
        Some("alice"),
        Some(json!({ "blogpost": second["url"] })),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let edit = send(
        &app.router,
        Method::PATCH,
        &path_of(&comment["url"]),
        Some("alice"),
        Some(json!({ "content": "edited", "blogpost": first["url"] })),
    )
    .await;
    assert_eq!(edit.status, StatusCode::OK);
    assert_eq!(edit.body["content"], "edited");
}

#[tokio::test]
async fn test_only_comment_author_may_edit_or_delete() {
    let app = test_app();
    seed_user(&app.store, "alice").await;
    seed_user(&app.store, "bob").await;
    let post = create_post(&app.router, "alice", "Post").await;
    let comment = create_comment(&app.router, "bob", post["url"].as_str().unwrap(), "mine").await;
    let url = path_of(&comment["url"]);

    // Even the blogpost author cannot touch someone else's comment.
    let edit = send(
        &app.router,
        Method::PUT,
        &url,
        Some("alice"),
        Some(json!({ "content": "censored" })),
    )
    .await;
    assert_eq!(edit.status, StatusCode::FORBIDDEN);

    let delete = send(&app.router, Method::DELETE, &url, Some("bob"), None).await;
    assert_eq!(delete.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_comments_allowed_policy_is_opt_in() {
    // Off by default: closed posts still accept comments.
    let app = test_app();
    seed_user(&app.store, "alice").await;
    let response = send(
        &app.router,
        Method::POST,
        "/api/blogposts/",
        Some("alice"),
        Some(json!({ "title": "Closed", "description": "d", "content": "c", "allow_comments": false })),
    )
    .await;
    create_comment(&app.router, "alice", response.body["url"].as_str().unwrap(), "ok").await;

    let strict = test_app_with(AppConfig {
        enforce_comments_allowed: true,
        ..AppConfig::default()
    });
    seed_user(&strict.store, "alice").await;
    let closed = send(
        &strict.router,
        Method::POST,
        "/api/blogposts/",
        Some("alice"),
        Some(json!({ "title": "Closed", "description": "d", "content": "c", "allow_comments": false })),
    )
    .await;
    let rejected = send(
        &strict.router,
        Method::POST,
        "/api/comments/",
        Some("alice"),
        Some(json!({ "content": "no", "blogpost": closed.body["url"] })),
    )
    .await;
    assert_eq!(rejected.status, StatusCode::FORBIDDEN);
}

// --- Filtering, search and pagination ---

#[tokio::test]
async fn test_title_icontains_filter() {
    let app = test_app();
    seed_user(&app.store, "alice").await;
    create_post(&app.router, "alice", "Hello World").await;
    create_post(&app.router, "alice", "Say HELLO").await;
    create_post(&app.router, "alice", "Goodbye").await;

    let response = send(
        &app.router,
        Method::GET,
        "/api/blogposts/?title__icontains=hello",
        None,
        None,
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["count"], 2);
    let titles: Vec<&str> = response.body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Hello World", "Say HELLO"]);
}

#[tokio::test]
async fn test_author_and_blogpost_filters() {
    let app = test_app();
    seed_user(&app.store, "alice").await;
    seed_user(&app.store, "bob").await;
    let first = create_post(&app.router, "alice", "A").await;
    let second = create_post(&app.router, "bob", "B").await;
    create_comment(&app.router, "bob", first["url"].as_str().unwrap(), "on first").await;
    create_comment(&app.router, "bob", second["url"].as_str().unwrap(), "on second").await;

    let by_bob = send(&app.router, Method::GET, "/api/blogposts/?author=bob", None, None).await;
    assert_eq!(by_bob.body["count"], 1);
    assert_eq!(by_bob.body["results"][0]["title"], "B");

    let on_first = send(
        &app.router,
        Method::GET,
        &format!("/api/comments/?blogpost={}", first["id"]),
        None,
        None,
    )
    .await;
    assert_eq!(on_first.body["count"], 1);
    assert_eq!(on_first.body["results"][0]["content"], "on first");
}

#[tokio::test]
async fn test_search_never_yields_duplicates() {
    let app = test_app();
    seed_user(&app.store, "alice").await;
    let response = send(
        &app.router,
        Method::POST,
        "/api/blogposts/",
        Some("alice"),
        Some(json!({
            "title": "Rust tips",
            "description": "All about rust",
            "content": "rust rust rust",
        })),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED);
    create_post(&app.router, "alice", "Unrelated").await;

    let search = send(&app.router, Method::GET, "/api/blogposts/?q=rust", None, None).await;
    assert_eq!(search.status, StatusCode::OK);
    assert_eq!(search.body["count"], 1);
    assert_eq!(search.body["results"].as_array().unwrap().len(), 1);

    // Blank `q` is ignored.
    let blank = send(&app.router, Method::GET, "/api/blogposts/?q=", None, None).await;
    assert_eq!(blank.body["count"], 2);
}

#[tokio::test]
async fn test_malformed_filter_is_a_field_error() {
    let app = test_app();

    let response = send(
        &app.router,
        Method::GET,
        "/api/blogposts/?created__lt=yesterday&id=abc",
        None,
        None,
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["created__lt"], json!(["Enter a valid date/time."]));
    assert_eq!(response.body["id"], json!(["Enter a number."]));
}

#[tokio::test]
async fn test_pagination_links() {
    let app = test_app_with(AppConfig {
        page_size: 2,
        ..AppConfig::default()
    });
    seed_user(&app.store, "alice").await;
    for title in ["one", "two", "three"] {
        create_post(&app.router, "alice", title).await;
    }

    let first = send(&app.router, Method::GET, "/api/blogposts/?author=alice", None, None).await;
    assert_eq!(first.body["count"], 3);
    assert_eq!(first.body["results"].as_array().unwrap().len(), 2);
    assert_eq!(
        first.body["next"],
        "http://localhost:3000/api/blogposts/?author=alice&page=2"
    );
    assert!(first.body["previous"].is_null());

    let second = send(
        &app.router,
        Method::GET,
        "/api/blogposts/?author=alice&page=2",
        None,
        None,
    )
    .await;
    assert_eq!(second.body["results"].as_array().unwrap().len(), 1);
    assert!(second.body["next"].is_null());
    assert_eq!(
        second.body["previous"],
        "http://localhost:3000/api/blogposts/?author=alice"
    );

    let beyond = send(&app.router, Method::GET, "/api/blogposts/?page=3", None, None).await;
    assert_eq!(beyond.status, StatusCode::NOT_FOUND);
    assert_eq!(beyond.body["detail"], "Invalid page.");

    let junk = send(&app.router, Method::GET, "/api/blogposts/?page=zero", None, None).await;
    assert_eq!(junk.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_collection_first_page() {
    let app = test_app();
    let response = send(&app.router, Method::GET, "/api/comments/", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body,
        json!({ "count": 0, "next": null, "previous": null, "results": [] })
    );
}

// --- Users ---

#[tokio::test]
async fn test_users_are_read_only_and_addressed_by_username() {
    let app = test_app();
    seed_user(&app.store, "zoe").await;
    seed_user(&app.store, "adam").await;

    let list = send(&app.router, Method::GET, "/api/users/", None, None).await;
    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(list.body["results"][0]["username"], "adam");
    assert!(list.body["results"][0].get("password_hash").is_none());

    let detail = send(&app.router, Method::GET, "/api/users/zoe/", None, None).await;
    assert_eq!(
        detail.body,
        json!({ "url": "http://localhost:3000/api/users/zoe/", "username": "zoe" })
    );

    let missing = send(&app.router, Method::GET, "/api/users/nobody/", None, None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let post = send(&app.router, Method::POST, "/api/users/", Some("zoe"), Some(json!({}))).await;
    assert_eq!(post.status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_comment_search_matches_every_term_once() {
    let app = test_app();
    seed_user(&app.store, "alice").await;
    let post = create_post(&app.router, "alice", "Post").await;
    let url = post["url"].as_str().unwrap();
    create_comment(&app.router, "alice", url, "Borrow checker borrow checker borrow").await;
    create_comment(&app.router, "alice", url, "The borrow was fine").await;
    create_comment(&app.router, "alice", url, "Nothing relevant").await;

    let both = send(
        &app.router,
        Method::GET,
        "/api/comments/?q=borrow%20checker",
        None,
        None,
    )
    .await;
    assert_eq!(both.status, StatusCode::OK);
    assert_eq!(both.body["count"], 1);
    assert_eq!(both.body["results"].as_array().unwrap().len(), 1);
    assert_eq!(
        both.body["results"][0]["content"],
        "Borrow checker borrow checker borrow"
    );

    let one = send(&app.router, Method::GET, "/api/comments/?q=BORROW", None, None).await;
    assert_eq!(one.body["count"], 2);

    let blank = send(&app.router, Method::GET, "/api/comments/?q=%20", None, None).await;
    assert_eq!(blank.body["count"], 3);
}

#[tokio::test]
async fn test_page_number_too_large_is_invalid_page() {
    let app = test_app();
    seed_user(&app.store, "alice").await;
    create_post(&app.router, "alice", "Only").await;

    for uri in [
        "/api/blogposts/?page=9223372036854775807",
        "/api/comments/?page=9223372036854775807",
        "/api/users/?page=9223372036854775807",
        "/api/blogposts/?page=922337203685477580",
        "/api/blogposts/?page=99999999999999999999",
    ] {
        let response = send(&app.router, Method::GET, uri, None, None).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(response.body["detail"], "Invalid page.", "{uri}");
    }
}

#[tokio::test]
async fn test_unreadable_requests_get_json_errors() {
    let app = test_app();
    seed_user(&app.store, "alice").await;

    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/blogposts/")
        .header("x-username", "alice")
        .header(header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let response = common::oneshot(&app.router, request).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers[header::CONTENT_TYPE],
        "application/json"
    );
    assert_eq!(response.body["non_field_errors"].as_array().unwrap().len(), 1);

    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/blogposts/")
        .header("x-username", "alice")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(axum::body::Body::from(post_body("Plain").to_string()))
        .unwrap();
    let response = common::oneshot(&app.router, request).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["non_field_errors"].is_array());

    let duplicated = send(&app.router, Method::GET, "/api/blogposts/?id=1&id=2", None, None).await;
    assert_eq!(duplicated.status, StatusCode::BAD_REQUEST);
    assert!(duplicated.body["non_field_errors"].is_array());

    let token = send(&app.router, Method::POST, "/api-token-auth/", None, Some(json!({ "username": 5 }))).await;
    assert_eq!(token.status, StatusCode::BAD_REQUEST);
    assert!(token.body["non_field_errors"].is_array());
}

#[tokio::test]
async fn test_comment_on_vanished_blogpost_is_a_field_error() {
    let app = test_app();
    let alice = seed_user(&app.store, "alice").await;

    let err = app
        .store
        .create_comment(NewComment {
            content: "too late".to_string(),
            author_id: alice.id,
            blogpost_id: 404,
        })
        .await
        .unwrap_err();

    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    let ApiError::Validation(errors) = err else {
        panic!("expected a validation error");
    };
    assert_eq!(
        errors.get("blogpost").unwrap(),
        ["Invalid hyperlink - Object does not exist."]
    );
}

#[tokio::test]
async fn test_comment_echo_with_bare_blogpost_id_is_unchanged() {
    let app = test_app();
    seed_user(&app.store, "alice").await;
    let post = create_post(&app.router, "alice", "Post").await;
    let comment = create_comment(&app.router, "alice", post["url"].as_str().unwrap(), "first").await;

    let response = send(
        &app.router,
        Method::PUT,
        &path_of(&comment["url"]),
        Some("alice"),
        Some(json!({ "content": "second", "blogpost": post["id"] })),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["content"], "second");
    assert_eq!(response.body["blogpost"], post["url"]);
}
