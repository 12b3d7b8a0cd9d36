//! One inbound call in, one upstream call out.
//!
//! Handlers describe the outbound request (upstream, path segments, which query
//! pairs survive, headers, optional body) and hand it to [`forward`], which sends
//! it and relays whatever status and JSON the upstream answered with.

use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use common_http_errors::{ApiError, ApiResult};
use reqwest::Url;
use serde_json::Value;
use tracing::debug;

use crate::app_state::AppState;
use crate::metrics::status_class;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    GitHub,
    Feishu,
}

impl Upstream {
    pub fn label(self) -> &'static str {
        match self {
            Upstream::GitHub => "github",
            Upstream::Feishu => "feishu",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Upstream::GitHub => "GitHub",
            Upstream::Feishu => "Feishu",
        }
    }
}

/// Which inbound query parameters a route passes on to its upstream.
#[derive(Debug, Clone, Copy)]
pub enum QueryPolicy {
    /// Only the listed keys, and only when the value is non-empty.
    Allow(&'static [&'static str]),
    /// Everything, unfiltered.
    PassThrough,
    /// Nothing.
    Drop,
}

impl QueryPolicy {
    /// Keep the forwardable pairs in arrival order; repeated keys stay repeated.
    pub fn select<'a>(&self, pairs: &'a [(String, String)]) -> Vec<(&'a str, &'a str)> {
        let borrowed = pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()));
        match self {
            QueryPolicy::Allow(keys) => borrowed
                .filter(|(k, v)| !v.is_empty() && keys.iter().any(|allowed| allowed == k))
                .collect(),
            QueryPolicy::PassThrough => borrowed.collect(),
            QueryPolicy::Drop => Vec::new(),
        }
    }
}

/// Reject the request when any named path parameter is blank.
pub fn require_params(params: &[(&str, &str)]) -> ApiResult<()> {
    let missing: Vec<&str> = params
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ApiError::bad_request(format!(
            "Missing {} in URL",
            missing.join(" or ")
        )))
    }
}

/// Append `segments` (each percent-encoded) and `query` to `base`.
pub fn build_url(base: &str, segments: &[&str], query: &[(&str, &str)]) -> ApiResult<Url> {
    let mut url = Url::parse(base).map_err(|err| ApiError::internal(format!("invalid upstream base {base:?}: {err}")))?;
    url.path_segments_mut()
        .map_err(|_| ApiError::internal(format!("upstream base {base:?} cannot carry a path")))?
        .pop_if_empty()
        .extend(segments);
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url)
}

pub struct ForwardRequest {
    pub upstream: Upstream,
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl ForwardRequest {
    pub fn get(upstream: Upstream, url: Url, headers: HeaderMap) -> Self {
        Self { upstream, method: Method::GET, url, headers, body: None }
    }

    pub fn post_json(upstream: Upstream, url: Url, headers: HeaderMap, body: Value) -> Self {
        Self { upstream, method: Method::POST, url, headers, body: Some(body) }
    }
}

/// Upstream status and JSON body, relayed to the caller as-is.
#[derive(Debug)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub body: Value,
}

impl IntoResponse for UpstreamReply {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Parse an upstream body, treating empty or non-JSON payloads as `{}`.
pub fn relay_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap_or_else(|_| Value::Object(Default::default()))
}

pub async fn forward(state: &AppState, request: ForwardRequest) -> ApiResult<UpstreamReply> {
    let upstream = request.upstream;
    let mut builder = state
        .http_client
        .request(request.method.clone(), request.url.clone())
        .timeout(state.config.upstream_timeout)
        .headers(request.headers);
    if let Some(body) = &request.body {
        builder = builder.json(body);
    }

    let result = async {
        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        Ok::<_, reqwest::Error>((status, bytes))
    }
    .await;

    match result {
        Ok((status, bytes)) => {
            state.metrics.record_upstream(upstream.label(), status_class(status));
            debug!(
                upstream = upstream.label(),
                method = %request.method,
                path = request.url.path(),
                status = status.as_u16(),
                "Relayed upstream response"
            );
            Ok(UpstreamReply { status, body: relay_body(&bytes) })
        }
        Err(err) if err.is_timeout() => {
            state.metrics.record_upstream(upstream.label(), "timeout");
            Err(ApiError::gateway_timeout(format!(
                "{} request timed out",
                upstream.display_name()
            )))
        }
        Err(err) => {
            state.metrics.record_upstream(upstream.label(), "transport_error");
            Err(ApiError::bad_gateway(err.to_string()))
        }
    }
}
