//! Integration tests for movie-api endpoints
//!
//! Drives `build_router` with `oneshot` against the in-memory datastore, a
//! fixed token converter and a fixed external ID generator.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use movie_api::{build_router, AppState};
use movie_common::api::{EmailAllowListAuthorizer, FixedTokenConverter};
use movie_common::moviestore::InMemoryDatastore;
use movie_common::random::FixedStringGenerator;
use movie_common::User;
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot` method

const EXTL_ID: &str = "superRandomString";

fn test_user() -> User {
    User {
        email: "foo@bar.com".to_string(),
        last_name: "Bar".to_string(),
        first_name: "Foo".to_string(),
        full_name: "Foo Bar".to_string(),
        hosted_domain: "example.com".to_string(),
        picture_url: "example.com/profile.png".to_string(),
        profile_link: "example.com/FooBar".to_string(),
    }
}

/// Test helper: Create app over an in-memory store
fn setup_app(store: InMemoryDatastore) -> Router {
    setup_app_with_authorizer(store, EmailAllowListAuthorizer::default())
}

fn setup_app_with_authorizer(store: InMemoryDatastore, authorizer: EmailAllowListAuthorizer) -> Router {
    let state = AppState::new(
        Arc::new(store),
        Arc::new(FixedStringGenerator(EXTL_ID.to_string())),
        Arc::new(FixedTokenConverter { user: test_user() }),
        Arc::new(authorizer),
    );
    build_router(state)
}

/// Test helper: Create authenticated request
fn test_request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, "Bearer abc123def1");

    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

fn movie_body() -> Value {
    json!({
        "title": "Repo Man",
        "rated": "R",
        "release_date": "1984-03-02T00:00:00Z",
        "run_time": 92,
        "director": "Alex Cox",
        "writer": "Alex Cox"
    })
}

async fn create_movie(app: &Router) -> Value {
    let response = app
        .clone()
        .oneshot(test_request("POST", "/api/v1/movies", Some(movie_body())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    extract_json(response.into_body()).await
}

// =============================================================================
// Health Endpoint
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_no_auth_required() {
    let app = setup_app(InMemoryDatastore::new());

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "movie-api");
    assert!(body["version"].is_string());
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = setup_app(InMemoryDatastore::new());

    let request = Request::builder()
        .uri("/api/v1/movies")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["kind"], "unauthenticated");
}

#[tokio::test]
async fn test_wrong_scheme_is_unauthorized() {
    let app = setup_app(InMemoryDatastore::new());

    let request = Request::builder()
        .uri("/api/v1/movies")
        .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_user_not_on_allow_list_is_forbidden() {
    let app = setup_app_with_authorizer(
        InMemoryDatastore::new(),
        EmailAllowListAuthorizer::new(["someone@else.com"]),
    );

    let response = app
        .oneshot(test_request("GET", "/api/v1/movies", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["kind"], "unauthorized");
}

// =============================================================================
// Create
// =============================================================================

#[tokio::test]
async fn test_create_movie() {
    let store = InMemoryDatastore::new();
    let app = setup_app(store.clone());

    let body = create_movie(&app).await;

    assert_eq!(body["path"], "/api/v1/movies");
    assert!(!body["request_id"].as_str().unwrap().is_empty());
    let data = &body["data"];
    assert_eq!(data["external_id"], EXTL_ID);
    assert_eq!(data["title"], "Repo Man");
    assert_eq!(data["release_date"], "1984-03-02T00:00:00Z");
    assert_eq!(data["run_time"], 92);
    assert_eq!(data["create_username"], "foo@bar.com");
    assert_eq!(data["update_username"], "foo@bar.com");
    assert_eq!(data["create_timestamp"], data["update_timestamp"]);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_response_carries_request_id_header() {
    let app = setup_app(InMemoryDatastore::new());

    let response = app
        .oneshot(test_request("GET", "/api/v1/movies", None))
        .await
        .unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_create_duplicate_external_id_conflicts() {
    let app = setup_app(InMemoryDatastore::new());
    create_movie(&app).await;

    // The fixed generator hands out the same external ID again
    let response = app
        .oneshot(test_request("POST", "/api/v1/movies", Some(movie_body())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["kind"], "item_already_exists");
}

#[tokio::test]
async fn test_create_missing_title_is_bad_request() {
    let store = InMemoryDatastore::new();
    let app = setup_app(store.clone());
    let mut movie = movie_body();
    movie["title"] = json!("");

    let response = app
        .oneshot(test_request("POST", "/api/v1/movies", Some(movie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["kind"], "input_validation_error");
    assert_eq!(body["error"]["param"], "title");
    assert_eq!(body["error"]["message"], "Missing Required Field: title");
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_create_bad_release_date() {
    let app = setup_app(InMemoryDatastore::new());
    let mut movie = movie_body();
    movie["release_date"] = json!("wrong-time");

    let response = app
        .oneshot(test_request("POST", "/api/v1/movies", Some(movie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["param"], "release_date");
    assert_eq!(body["error"]["code"], "invalid_date_format");
}

#[tokio::test]
async fn test_create_zero_run_time() {
    let app = setup_app(InMemoryDatastore::new());
    let mut movie = movie_body();
    movie["run_time"] = json!(0);

    let response = app
        .oneshot(test_request("POST", "/api/v1/movies", Some(movie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["param"], "run_time");
}

#[tokio::test]
async fn test_create_malformed_json() {
    let app = setup_app(InMemoryDatastore::new());

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/movies")
        .header(header::AUTHORIZATION, "Bearer abc123def1")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"title\": "))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "invalid_request_body");
}

// =============================================================================
// Read
// =============================================================================

#[tokio::test]
async fn test_find_by_id() {
    let app = setup_app(InMemoryDatastore::new());
    create_movie(&app).await;

    let uri = format!("/api/v1/movies/{}", EXTL_ID);
    let response = app
        .oneshot(test_request("GET", &uri, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["path"], uri);
    assert_eq!(body["data"]["external_id"], EXTL_ID);
    assert_eq!(body["data"]["director"], "Alex Cox");
}

#[tokio::test]
async fn test_find_by_id_not_found() {
    let app = setup_app(InMemoryDatastore::new());

    let response = app
        .oneshot(test_request("GET", "/api/v1/movies/doesNotExist", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["kind"], "item_does_not_exist");
}

#[tokio::test]
async fn test_find_all_empty() {
    let app = setup_app(InMemoryDatastore::new());

    let response = app
        .oneshot(test_request("GET", "/api/v1/movies", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_find_all() {
    let app = setup_app(InMemoryDatastore::new());
    create_movie(&app).await;

    let response = app
        .oneshot(test_request("GET", "/api/v1/movies", None))
        .await
        .unwrap();

    let body = extract_json(response.into_body()).await;
    let movies = body["data"].as_array().unwrap();
    assert_eq!(movies.len(), 1);
    assert_eq!(movies[0]["external_id"], EXTL_ID);
}

// =============================================================================
// Update
// =============================================================================

#[tokio::test]
async fn test_update_movie() {
    let app = setup_app(InMemoryDatastore::new());
    let created = create_movie(&app).await;

    let mut movie = movie_body();
    movie["title"] = json!("Repo Man (Director's Cut)");
    movie["run_time"] = json!(95);

    let uri = format!("/api/v1/movies/{}", EXTL_ID);
    let response = app
        .clone()
        .oneshot(test_request("PUT", &uri, Some(movie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["data"]["title"], "Repo Man (Director's Cut)");
    assert_eq!(body["data"]["run_time"], 95);
    assert_eq!(
        body["data"]["create_timestamp"],
        created["data"]["create_timestamp"]
    );

    let response = app
        .oneshot(test_request("GET", &uri, None))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["data"]["title"], "Repo Man (Director's Cut)");
}

#[tokio::test]
async fn test_update_missing_movie_not_found() {
    let app = setup_app(InMemoryDatastore::new());

    let response = app
        .oneshot(test_request(
            "PUT",
            "/api/v1/movies/doesNotExist",
            Some(movie_body()),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_invalid_movie_is_bad_request() {
    let app = setup_app(InMemoryDatastore::new());
    create_movie(&app).await;
    let mut movie = movie_body();
    movie["writer"] = json!("");

    let response = app
        .oneshot(test_request(
            "PUT",
            &format!("/api/v1/movies/{}", EXTL_ID),
            Some(movie),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["param"], "writer");
}

// =============================================================================
// Delete
// =============================================================================

#[tokio::test]
async fn test_delete_movie() {
    let store = InMemoryDatastore::new();
    let app = setup_app(store.clone());
    create_movie(&app).await;

    let uri = format!("/api/v1/movies/{}", EXTL_ID);
    let response = app
        .clone()
        .oneshot(test_request("DELETE", &uri, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["data"]["extl_id"], EXTL_ID);
    assert_eq!(body["data"]["deleted"], true);
    assert!(store.is_empty());

    let response = app
        .oneshot(test_request("GET", &uri, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_missing_movie_not_found() {
    let app = setup_app(InMemoryDatastore::new());

    let response = app
        .oneshot(test_request("DELETE", "/api/v1/movies/doesNotExist", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Cancellation
// =============================================================================

#[tokio::test]
async fn test_shutdown_cancels_store_calls() {
    let shutdown = tokio_util::sync::CancellationToken::new();
    let state = AppState::new(
        Arc::new(InMemoryDatastore::new()),
        Arc::new(FixedStringGenerator(EXTL_ID.to_string())),
        Arc::new(FixedTokenConverter { user: test_user() }),
        Arc::new(EmailAllowListAuthorizer::default()),
    )
    .with_shutdown(shutdown.clone());
    let app = build_router(state);
    shutdown.cancel();

    let response = app
        .oneshot(test_request("GET", "/api/v1/movies", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["kind"], "cancelled");
}
