use anyhow::Result;
use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct GatewayMetrics {
    registry: Registry,
    upstream_requests: IntCounterVec,
    token_lookups: IntCounterVec,
}

impl GatewayMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let upstream_requests = IntCounterVec::new(
            Opts::new(
                "gateway_upstream_requests_total",
                "Forwarded upstream calls grouped by upstream and outcome",
            ),
            &["upstream", "outcome"],
        )?;
        let token_lookups = IntCounterVec::new(
            Opts::new(
                "gateway_tenant_token_lookups_total",
                "Tenant access token lookups grouped by result",
            ),
            &["result"],
        )?;
        registry.register(Box::new(upstream_requests.clone()))?;
        registry.register(Box::new(token_lookups.clone()))?;
        Ok(Self {
            registry,
            upstream_requests,
            token_lookups,
        })
    }

    /// `outcome` is a status class (`2xx`, `4xx`, ...) or `timeout` / `transport_error`.
    pub fn record_upstream(&self, upstream: &str, outcome: &str) {
        self.upstream_requests
            .with_label_values(&[upstream, outcome])
            .inc();
    }

    pub fn record_token_lookup(&self, ok: bool) {
        let result = if ok { "ok" } else { "error" };
        self.token_lookups.with_label_values(&[result]).inc();
    }

    pub fn gather_text(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    pub fn render(&self) -> Result<Response> {
        let body = self.gather_text()?;
        let response = Response::builder()
            .status(StatusCode::OK)
            .header(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            )
            .body(Body::from(body))?;
        Ok(response)
    }
}

/// Label for an upstream status: `2xx`, `3xx`, `4xx` or `5xx`.
pub fn status_class(status: StatusCode) -> &'static str {
    match status.as_u16() {
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}
