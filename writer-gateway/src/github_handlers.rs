use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue};
use common_http_errors::{ApiError, ApiResult};
use serde::Deserialize;

use crate::app_state::AppState;
use crate::extract::PathParams;
use crate::forward::{build_url, forward, require_params, ForwardRequest, QueryPolicy, Upstream, UpstreamReply};

pub const GITHUB_API_VERSION: &str = "2022-11-28";

pub const LIST_PULLS_QUERY: QueryPolicy =
    QueryPolicy::Allow(&["state", "head", "sort", "direction", "per_page", "page"]);
pub const PULL_COMMITS_QUERY: QueryPolicy = QueryPolicy::Allow(&["per_page", "page"]);
pub const PULL_FILES_QUERY: QueryPolicy = QueryPolicy::Allow(&["per_page", "page"]);

#[derive(Deserialize)]
pub struct RepoPath {
    pub owner: String,
    pub repo: String,
}

#[derive(Deserialize)]
pub struct PullPath {
    pub owner: String,
    pub repo: String,
    pub pull_number: String,
}

pub async fn list_pulls(
    State(state): State<AppState>,
    PathParams(path): PathParams<RepoPath>,
    Query(query): Query<Vec<(String, String)>>,
) -> ApiResult<UpstreamReply> {
    require_params(&[("owner", path.owner.as_str()), ("repo", path.repo.as_str())])?;
    let url = build_url(
        &state.config.github_api_url,
        &["repos", path.owner.as_str(), path.repo.as_str(), "pulls"],
        &LIST_PULLS_QUERY.select(&query),
    )?;
    forward(&state, ForwardRequest::get(Upstream::GitHub, url, github_headers(&state)?)).await
}

pub async fn list_pull_commits(
    State(state): State<AppState>,
    PathParams(path): PathParams<PullPath>,
    Query(query): Query<Vec<(String, String)>>,
) -> ApiResult<UpstreamReply> {
    pull_subresource(state, path, "commits", PULL_COMMITS_QUERY, &query).await
}

pub async fn list_pull_files(
    State(state): State<AppState>,
    PathParams(path): PathParams<PullPath>,
    Query(query): Query<Vec<(String, String)>>,
) -> ApiResult<UpstreamReply> {
    pull_subresource(state, path, "files", PULL_FILES_QUERY, &query).await
}

async fn pull_subresource(
    state: AppState,
    path: PullPath,
    resource: &str,
    policy: QueryPolicy,
    query: &[(String, String)],
) -> ApiResult<UpstreamReply> {
    require_params(&[
        ("owner", path.owner.as_str()),
        ("repo", path.repo.as_str()),
        ("pull_number", path.pull_number.as_str()),
    ])?;
    let url = build_url(
        &state.config.github_api_url,
        &["repos", path.owner.as_str(), path.repo.as_str(), "pulls", path.pull_number.as_str(), resource],
        &policy.select(query),
    )?;
    forward(&state, ForwardRequest::get(Upstream::GitHub, url, github_headers(&state)?)).await
}

/// Static GitHub headers plus the personal access token when one is configured.
fn github_headers(state: &AppState) -> ApiResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
    headers.insert(
        HeaderName::from_static("x-github-api-version"),
        HeaderValue::from_static(GITHUB_API_VERSION),
    );
    if let Some(token) = &state.config.github_token {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ApiError::internal("PERSONAL_ACCESS_TOKEN is not a valid header value"))?;
        value.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, value);
    }
    Ok(headers)
}
