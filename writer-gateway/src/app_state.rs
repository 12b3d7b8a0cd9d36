use std::sync::Arc;

use anyhow::{Context, Result};
use common_auth::TenantTokenCache;
use reqwest::Client;

use crate::config::GatewayConfig;
use crate::metrics::GatewayMetrics;

/// GitHub rejects API calls that carry no User-Agent.
pub const USER_AGENT: &str = concat!("technical-writer-gateway/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub http_client: Client,
    pub token_cache: TenantTokenCache,
    pub metrics: Arc<GatewayMetrics>,
}

impl AppState {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.upstream_timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build upstream HTTP client")?;
        let token_cache = TenantTokenCache::new(config.tenant_auth(), http_client.clone());
        let metrics = GatewayMetrics::new().context("Failed to register gateway metrics")?;
        Ok(Self {
            config: Arc::new(config),
            http_client,
            token_cache,
            metrics: Arc::new(metrics),
        })
    }
}
