use axum::extract::{Query, Request, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Extension;
use bytes::Bytes;
use common_http_errors::{ApiError, ApiResult};
use serde::Deserialize;
use serde_json::Value;
use tracing::error;

use crate::app_state::AppState;
use crate::extract::PathParams;
use crate::forward::{build_url, forward, require_params, ForwardRequest, QueryPolicy, Upstream, UpstreamReply};

pub const LIST_TABLES_QUERY: QueryPolicy = QueryPolicy::PassThrough;
pub const SEARCH_RECORDS_QUERY: QueryPolicy = QueryPolicy::Drop;

/// Tenant access token attached to every request under `/feishu`.
#[derive(Clone)]
pub struct TenantToken(pub String);

#[derive(Deserialize)]
pub struct AppPath {
    pub app_token: String,
}

#[derive(Deserialize)]
pub struct TablePath {
    pub app_token: String,
    pub table_id: String,
}

/// Resolve a tenant token before any Feishu route runs; answer 503 when none can be had.
pub async fn tenant_token_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match state.token_cache.get_credential().await {
        Ok(credential) => {
            state.metrics.record_token_lookup(true);
            request
                .extensions_mut()
                .insert(TenantToken(credential.token().to_owned()));
            next.run(request).await
        }
        Err(err) => {
            state.metrics.record_token_lookup(false);
            error!(error = %err, "Feishu tenant token error");
            err.into_response()
        }
    }
}

pub async fn list_tables(
    State(state): State<AppState>,
    Extension(token): Extension<TenantToken>,
    PathParams(path): PathParams<AppPath>,
    Query(query): Query<Vec<(String, String)>>,
) -> ApiResult<UpstreamReply> {
    require_params(&[("app_token", path.app_token.as_str())])?;
    let url = build_url(
        &state.config.feishu_api_url,
        &["bitable", "v1", "apps", path.app_token.as_str(), "tables"],
        &LIST_TABLES_QUERY.select(&query),
    )?;
    forward(&state, ForwardRequest::get(Upstream::Feishu, url, feishu_headers(&token)?)).await
}

pub async fn search_records(
    State(state): State<AppState>,
    Extension(token): Extension<TenantToken>,
    PathParams(path): PathParams<TablePath>,
    Query(query): Query<Vec<(String, String)>>,
    body: Bytes,
) -> ApiResult<UpstreamReply> {
    require_params(&[("app_token", path.app_token.as_str()), ("table_id", path.table_id.as_str())])?;
    let payload = search_payload(&body)?;
    let url = build_url(
        &state.config.feishu_api_url,
        &["bitable", "v1", "apps", path.app_token.as_str(), "tables", path.table_id.as_str(), "records", "search"],
        &SEARCH_RECORDS_QUERY.select(&query),
    )?;
    forward(
        &state,
        ForwardRequest::post_json(Upstream::Feishu, url, feishu_headers(&token)?, payload),
    )
    .await
}

/// An absent body searches with `{}`; anything else must be JSON.
fn search_payload(body: &[u8]) -> ApiResult<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_slice(body).map_err(|err| ApiError::bad_request(format!("Invalid JSON body: {err}")))
}

fn feishu_headers(token: &TenantToken) -> ApiResult<HeaderMap> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token.0))
        .map_err(|_| ApiError::internal("tenant access token is not a valid header value"))?;
    value.set_sensitive(true);
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, value);
    Ok(headers)
}
