#![allow(dead_code)]

use std::collections::HashMap;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use httpmock::prelude::*;
use httpmock::Mock;
use serde_json::{json, Value};
use tower::ServiceExt;
use writer_gateway::{create_router, AppState, GatewayConfig};

pub const TOKEN_PATH: &str = "/auth/v3/tenant_access_token/internal";

/// Gateway config pointing both upstreams at mock servers; `extra` adds env-style overrides.
pub fn test_config(github: &MockServer, feishu: &MockServer, extra: &[(&str, &str)]) -> GatewayConfig {
    let mut vars: HashMap<String, String> = HashMap::new();
    vars.insert("GITHUB_API_URL".into(), github.base_url());
    vars.insert("FEISHU_API_URL".into(), feishu.base_url());
    for (key, value) in extra {
        vars.insert(key.to_string(), value.to_string());
    }
    let mut config = GatewayConfig::from_lookup(|key| vars.get(key).cloned()).expect("test config");
    config.upstream_timeout = Duration::from_millis(500);
    config
}

pub fn test_app(config: GatewayConfig) -> Router {
    create_router(AppState::new(config).expect("app state"))
}

pub fn mock_tenant_token<'a>(feishu: &'a MockServer, token: &str, expire: i64) -> Mock<'a> {
    let body = json!({ "code": 0, "msg": "ok", "tenant_access_token": token, "expire": expire });
    feishu.mock(|when, then| {
        when.method(POST)
            .path(TOKEN_PATH)
            .json_body(json!({ "app_id": "cli_test", "app_secret": "secret_test" }));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(body);
    })
}

/// True when the outbound request carried exactly the query parameter names in `expected`.
pub fn query_keys_are(req: &HttpMockRequest, expected: &[&str]) -> bool {
    let mut received: Vec<&str> = req.query_params.iter().flatten().map(|(key, _)| key.as_str()).collect();
    let mut expected = expected.to_vec();
    received.sort_unstable();
    expected.sort_unstable();
    received == expected
}

pub fn has_header(req: &HttpMockRequest, name: &str) -> bool {
    req.headers
        .iter()
        .flatten()
        .any(|(key, _)| key.eq_ignore_ascii_case(name))
}

pub const FEISHU_CREDENTIALS: &[(&str, &str)] = &[("APP_ID", "cli_test"), ("APP_SECRET", "secret_test")];

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("router response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body bytes");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).method("GET").body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
