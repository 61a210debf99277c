//! End-to-end tests of the HTTP surface over an in-memory SQLite database.

use axum::http::StatusCode;
use axum_test::TestServer;
use sea_orm::{ConnectOptions, Database};
use stoopid_paste::{
    api::{self, MISSING_CONTENT, PASTE_NOT_FOUND},
    config::container_with_db_conn,
    orm,
    paste_id::PASTE_ID_LEN,
};

async fn setup_test_server() -> TestServer {
    // NOTE: every pooled connection would otherwise get its own empty database
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1);

    let db = Database::connect(options).await.unwrap();
    orm::ensure_schema(&db).await.unwrap();
    TestServer::new(api::router(container_with_db_conn(db))).unwrap()
}

async fn setup_server_without_schema() -> TestServer {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1);

    let db = Database::connect(options).await.unwrap();
    TestServer::new(api::router(container_with_db_conn(db))).unwrap()
}

async fn create_paste(server: &TestServer, content: &str) -> String {
    let response = server.post("/").form(&[("content", content)]).await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);

    let location = response.header("location");
    let location = location.to_str().unwrap();
    location.strip_prefix('/').unwrap().to_owned()
}

#[tokio::test]
async fn test_create_then_view_raw_returns_exact_content() {
    let server = setup_test_server().await;

    let id = create_paste(&server, "hello").await;
    assert_eq!(id.len(), PASTE_ID_LEN);
    assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));

    let response = server.get(&format!("/{id}/raw")).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "hello");
}

#[tokio::test]
async fn test_view_renders_escaped_content() {
    let server = setup_test_server().await;
    let id = create_paste(&server, "<b>bold</b> & more").await;

    let response = server.get(&format!("/{id}")).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.text();
    assert!(body.contains("&lt;b&gt;bold&lt;/b&gt; &amp; more"));
    assert!(body.contains(&format!("/{id}/raw")));
}

#[tokio::test]
async fn test_view_unknown_id_is_not_found() {
    let server = setup_test_server().await;

    let response = server.get("/zzzzzz").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(response.text(), PASTE_NOT_FOUND);

    let response = server.get("/zzzzzz/raw").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(response.text(), PASTE_NOT_FOUND);
}

#[tokio::test]
async fn test_create_without_content_is_bad_request() {
    let server = setup_test_server().await;

    let response = server.post("/").form(&[("other", "field")]).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.text(), MISSING_CONTENT);

    let listing = server.get("/").await.text();
    assert_eq!(listing.matches(r#"class="paste""#).count(), 0);
}

#[tokio::test]
async fn test_empty_content_is_accepted() {
    let server = setup_test_server().await;
    let id = create_paste(&server, "").await;

    let response = server.get(&format!("/{id}/raw")).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "");
}

#[tokio::test]
async fn test_identical_content_creates_distinct_pastes() {
    let server = setup_test_server().await;

    let first = create_paste(&server, "same").await;
    let second = create_paste(&server, "same").await;
    assert_ne!(first, second);
}

#[tokio::test]
async fn test_index_lists_at_most_ten_pastes() {
    let server = setup_test_server().await;

    let mut ids = Vec::new();
    for i in 0..12 {
        ids.push(create_paste(&server, &format!("paste number {i}")).await);
    }

    let response = server.get("/").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.text();
    assert_eq!(body.matches(r#"class="paste""#).count(), 10);
    let listed = ids
        .iter()
        .filter(|id| body.contains(&format!(r#"href="/{id}""#)))
        .count();
    assert_eq!(listed, 10);
}

#[tokio::test]
async fn test_search_with_empty_query_returns_nothing() {
    let server = setup_test_server().await;
    create_paste(&server, "anything at all").await;

    for response in [
        server.get("/search").await,
        server.get("/search").add_query_param("q", "").await,
    ] {
        assert_eq!(response.status_code(), StatusCode::OK);
        let body = response.text();
        assert_eq!(body.matches(r#"class="result""#).count(), 0);
        assert!(body.contains("No results."));
    }
}

#[tokio::test]
async fn test_search_finds_single_match_with_snippet() {
    let server = setup_test_server().await;
    create_paste(&server, "alpha").await;
    let id = create_paste(&server, "beta needle gamma").await;
    create_paste(&server, "delta").await;

    let response = server.get("/search").add_query_param("q", "needle").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.text();
    assert_eq!(body.matches(r#"class="result""#).count(), 1);
    assert!(body.contains(&format!(r#"href="/{id}""#)));
    assert!(body.contains("<pre>beta needle gamma</pre>"));
}

#[tokio::test]
async fn test_search_truncates_long_pastes() {
    let server = setup_test_server().await;
    let content = format!("{}needle{}", "a".repeat(120), "b".repeat(120));
    create_paste(&server, &content).await;

    let body = server
        .get("/search")
        .add_query_param("q", "needle")
        .await
        .text();
    let expected = format!("<pre>...{}needle{}...</pre>", "a".repeat(50), "b".repeat(50));
    assert!(body.contains(&expected));
}

#[tokio::test]
async fn test_search_query_is_literal() {
    let server = setup_test_server().await;
    create_paste(&server, "abc").await;
    let id = create_paste(&server, "the a.c literal").await;

    let body = server.get("/search").add_query_param("q", "a.c").await.text();
    assert_eq!(body.matches(r#"class="result""#).count(), 1);
    assert!(body.contains(&format!(r#"href="/{id}""#)));
}

#[tokio::test]
async fn test_store_failure_is_internal_server_error() {
    let server = setup_server_without_schema().await;

    for response in [
        server.get("/").await,
        server.post("/").form(&[("content", "hello")]).await,
        server.get("/abc123").await,
        server.get("/search").add_query_param("q", "hello").await,
    ] {
        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.text();
        let err_uuid = body
            .strip_prefix("Internal server error (error id: ")
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap();
        assert!(uuid::Uuid::parse_str(err_uuid).is_ok());
    }
}
