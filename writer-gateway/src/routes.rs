use std::any::Any;

use axum::extract::State;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use common_http_errors::{ApiError, ApiResult};
use serde::Serialize;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::feishu_handlers::{list_tables, search_records, tenant_token_middleware};
use crate::github_handlers::{list_pull_commits, list_pull_files, list_pulls};

pub const WELCOME_MESSAGE: &str = "Welcome to Technical Writer!";

#[derive(Serialize)]
pub struct Welcome {
    pub message: &'static str,
    pub version: &'static str,
}

async fn welcome() -> Json<Welcome> {
    Json(Welcome {
        message: WELCOME_MESSAGE,
        version: crate::VERSION,
    })
}

async fn health() -> &'static str {
    "ok"
}

async fn metrics(State(state): State<AppState>) -> ApiResult<Response> {
    state.metrics.render().map_err(ApiError::internal)
}

async fn not_found() -> ApiError {
    ApiError::not_found()
}

async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}

/// Turn a handler panic into the usual 500 envelope instead of dropping the connection.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unexpected error".to_string()
    };
    tracing::error!(%message, "handler panicked");
    ApiError::internal(message).into_response()
}

pub fn create_router(state: AppState) -> Router {
    let github = Router::new()
        .route("/repos/:owner/:repo/pulls", get(list_pulls))
        .route("/repos/:owner/:repo/pulls/:pull_number/commits", get(list_pull_commits))
        .route("/repos/:owner/:repo/pulls/:pull_number/files", get(list_pull_files));

    // route_layer: unmatched /feishu paths fall through to 404 without a token lookup.
    let feishu = Router::new()
        .route("/bitable/v1/apps/:app_token/tables", get(list_tables))
        .route(
            "/bitable/v1/apps/:app_token/tables/:table_id/records/search",
            post(search_records),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            tenant_token_middleware,
        ));

    Router::new()
        .route("/", get(welcome))
        .route("/healthz", get(health))
        .route("/metrics", get(metrics))
        .nest("/github", github)
        .nest("/feishu", feishu)
        .fallback(not_found)
        // After the nests: it is applied to every route registered so far.
        .method_not_allowed_fallback(method_not_allowed)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
