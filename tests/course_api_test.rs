use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use course_relay::adapters::server::router;
use course_relay::{CourseQueryHandler, CredentialDefaults, ReqwestUpstreamClient};
use httpmock::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

fn app(default_key: Option<&str>, default_url: &str, static_dir: &str) -> Router {
    let client = ReqwestUpstreamClient::new(None).unwrap();
    let defaults = CredentialDefaults {
        api_key: default_key.map(|k| k.to_string()),
        api_base_url: default_url.to_string(),
    };
    router(CourseQueryHandler::new(client, defaults), static_dir)
}

fn courses_uri(pairs: &[(&str, &str)]) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    format!("/api/courses?{}", query)
}

async fn send(app: Router, request: Request<Body>) -> Result<(StatusCode, Value)> {
    let response = app.oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok((status, serde_json::from_slice(&bytes)?))
}

/// GET 帶 api_key，上游回傳單一課程
#[tokio::test]
async fn test_get_with_query_key_returns_shaped_courses() -> Result<()> {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/courses")
            .header("Authorization", "Bearer abc123")
            .query_param("enrollment_state", "active")
            .query_param("include[]", "total_students");
        then.status(200).json_body(json!([
            {
                "id": 1,
                "name": "Intro",
                "course_code": "CS101",
                "access_restricted_by_date": false,
                "total_students": 30
            }
        ]));
    });

    let app = app(None, "http://127.0.0.1:9", "static");
    let base_url = server.base_url();
    let uri = courses_uri(&[("api_key", "abc123"), ("api_url", base_url.as_str())]);
    let (status, body) = send(app, Request::get(uri).body(Body::empty())?).await?;

    api_mock.assert();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {"id": "1", "name": "Intro", "code": "CS101", "description": "CS101", "students": 30}
        ])
    );
    Ok(())
}

#[tokio::test]
async fn test_post_with_body_key() -> Result<()> {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/courses")
            .header("Authorization", "Bearer body-key");
        then.status(200).json_body(json!([
            {"id": 10, "name": "Biology", "total_students": 5},
            {"id": 11, "name": ""},
            {"id": 12, "name": "Chemistry", "course_code": "CHEM"}
        ]));
    });

    let app = app(Some("env-key"), "http://127.0.0.1:9", "static");
    let body = json!({"api_key": "body-key", "api_url": server.base_url()}).to_string();
    let request = Request::post("/api/courses")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))?;
    let (status, body) = send(app, request).await?;

    api_mock.assert();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {"id": "10", "name": "Biology", "code": "", "description": "No description available", "students": 5},
            {"id": "12", "name": "Chemistry", "code": "CHEM", "description": "CHEM", "students": 0}
        ])
    );
    Ok(())
}

#[tokio::test]
async fn test_default_credentials_are_used() -> Result<()> {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/courses")
            .header("Authorization", "Bearer env-key");
        then.status(200).json_body(json!([]));
    });

    let app = app(Some("env-key"), &server.base_url(), "static");
    let (status, body) = send(app, Request::get("/api/courses").body(Body::empty())?).await?;

    api_mock.assert();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
    Ok(())
}

/// 沒有金鑰時不應呼叫上游
#[tokio::test]
async fn test_post_without_key_is_400_and_skips_upstream() -> Result<()> {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/api/v1/courses");
        then.status(200).json_body(json!([]));
    });

    let app = app(None, &server.base_url(), "static");
    let request = Request::post("/api/courses")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))?;
    let (status, body) = send(app, request).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("API key is required"));
    api_mock.assert_hits(0);
    Ok(())
}

#[tokio::test]
async fn test_malformed_json_body_is_400() -> Result<()> {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/api/v1/courses");
        then.status(200).json_body(json!([]));
    });

    let app = app(Some("env-key"), &server.base_url(), "static");
    let request = Request::post("/api/courses")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"api_key\": "))?;
    let (status, body) = send(app, request).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    api_mock.assert_hits(0);
    Ok(())
}

#[tokio::test]
async fn test_upstream_401_is_unauthorized() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/v1/courses");
        then.status(401)
            .json_body(json!({"errors": [{"message": "Invalid access token."}]}));
    });

    let app = app(None, "http://127.0.0.1:9", "static");
    let base_url = server.base_url();
    let uri = courses_uri(&[("api_key", "revoked"), ("api_url", base_url.as_str())]);
    let (status, body) = send(app, Request::get(uri).body(Body::empty())?).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let message = body["error"].as_str().unwrap().to_lowercase();
    assert!(message.contains("unauthorized"));
    assert!(message.contains("verify"));
    Ok(())
}

#[tokio::test]
async fn test_upstream_server_error_is_500() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/v1/courses");
        then.status(503);
    });

    let app = app(Some("env-key"), &server.base_url(), "static");
    let (status, body) = send(app, Request::get("/api/courses").body(Body::empty())?).await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("503"));
    Ok(())
}

#[tokio::test]
async fn test_unreachable_upstream_is_500() -> Result<()> {
    // 取得一個已關閉的本機埠
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let closed_url = format!("http://{}", listener.local_addr()?);
    drop(listener);

    let app = app(Some("env-key"), &closed_url, "static");
    let (status, body) = send(app, Request::get("/api/courses").body(Body::empty())?).await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to fetch courses"));
    Ok(())
}

#[tokio::test]
async fn test_non_array_payload_is_empty_list() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/v1/courses");
        then.status(200).json_body(json!({"status": "unexpected"}));
    });

    let app = app(Some("env-key"), &server.base_url(), "static");
    let (status, body) = send(app, Request::get("/api/courses").body(Body::empty())?).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
    Ok(())
}

#[tokio::test]
async fn test_repeated_request_yields_identical_body() -> Result<()> {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/api/v1/courses");
        then.status(200).json_body(json!([
            {"id": 7, "name": "History", "course_code": "HIST", "total_students": 9},
            {"id": 8, "name": "Locked", "access_restricted_by_date": true}
        ]));
    });

    let app = app(Some("env-key"), &server.base_url(), "static");
    let (_, first) = send(app.clone(), Request::get("/api/courses").body(Body::empty())?).await?;
    let (_, second) = send(app, Request::get("/api/courses").body(Body::empty())?).await?;

    api_mock.assert_hits(2);
    assert_eq!(first, second);
    assert_eq!(first.as_array().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_index_is_served_from_static_dir() -> Result<()> {
    let temp_dir = TempDir::new()?;
    std::fs::write(
        temp_dir.path().join("index.html"),
        "<h1>Course relay</h1>",
    )?;

    let app = app(None, "http://127.0.0.1:9", temp_dir.path().to_str().unwrap());
    let response = app
        .oneshot(Request::get("/").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    assert_eq!(&bytes[..], b"<h1>Course relay</h1>");
    Ok(())
}

#[tokio::test]
async fn test_cors_headers_present() -> Result<()> {
    let app = app(None, "http://127.0.0.1:9", "static");
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/courses")
        .header(header::ORIGIN, "chrome-extension://abcdefghijklmnop")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())?;
    let response = app.oneshot(request).await?;

    assert!(response.status().is_success());
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
    Ok(())
}

/// 重複的 api_key 只取第一個
#[tokio::test]
async fn test_get_with_duplicated_query_key_uses_first() -> Result<()> {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/courses")
            .header("Authorization", "Bearer first-key");
        then.status(200)
            .json_body(json!([{"id": 1, "name": "Intro", "course_code": "CS101"}]));
    });

    let app = app(None, &server.base_url(), "static");
    let request = Request::get("/api/courses?api_key=first-key&api_key=second-key")
        .body(Body::empty())?;
    let (status, body) = send(app, request).await?;

    api_mock.assert();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_post_ignores_duplicated_query_keys() -> Result<()> {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/courses")
            .header("Authorization", "Bearer env-key");
        then.status(200).json_body(json!([]));
    });

    let app = app(Some("env-key"), &server.base_url(), "static");
    let request = Request::post("/api/courses?api_key=a&api_key=b")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))?;
    let (status, body) = send(app, request).await?;

    api_mock.assert();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
    Ok(())
}
