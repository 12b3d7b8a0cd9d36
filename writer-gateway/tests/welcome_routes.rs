mod support;

use axum::http::StatusCode;
use httpmock::MockServer;
use serde_json::json;
use support::{get, send, test_app, test_config};

#[tokio::test]
async fn root_returns_welcome_and_version() {
    let (github, feishu) = (MockServer::start(), MockServer::start());
    let app = test_app(test_config(&github, &feishu, &[]));

    let (status, body) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Welcome to Technical Writer!", "version": "1.0.0" }));
}

#[tokio::test]
async fn healthz_is_ok() {
    let (github, feishu) = (MockServer::start(), MockServer::start());
    let app = test_app(test_config(&github, &feishu, &[]));

    let (status, body) = send(&app, get("/healthz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("ok"));
}

#[tokio::test]
async fn unknown_path_is_json_404() {
    let (github, feishu) = (MockServer::start(), MockServer::start());
    let app = test_app(test_config(&github, &feishu, &[]));

    let (status, body) = send(&app, get("/gitlab/projects")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Not found" }));
}

#[tokio::test]
async fn metrics_endpoint_exposes_upstream_counters() {
    let (github, feishu) = (MockServer::start(), MockServer::start());
    github.mock(|when, then| {
        when.path("/repos/octo/hello/pulls");
        then.status(200).json_body(json!([]));
    });
    let app = test_app(test_config(&github, &feishu, &[]));

    let (status, _) = send(&app, get("/github/repos/octo/hello/pulls")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, get("/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    let text = body.as_str().expect("prometheus text");
    assert!(text.contains("gateway_upstream_requests_total"), "{text}");
    assert!(text.contains(r#"upstream="github""#), "{text}");
}
