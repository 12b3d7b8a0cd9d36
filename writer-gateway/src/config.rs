use anyhow::{Context, Result};
use common_auth::{TenantAuthConfig, DEFAULT_FEISHU_API_URL};
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

#[derive(Clone)]
pub struct GatewayConfig {
    pub host: IpAddr,
    pub port: u16,
    pub feishu_app_id: Option<String>,
    pub feishu_app_secret: Option<String>,
    pub github_token: Option<String>,
    pub github_api_url: String,
    pub feishu_api_url: String,
    pub upstream_timeout: Duration,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build config from an arbitrary variable source; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let host = non_empty("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let host: IpAddr = host
            .parse()
            .with_context(|| format!("HOST must be an IP address, got {host:?}"))?;
        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3000);
        let upstream_timeout_secs = lookup("UPSTREAM_TIMEOUT_SECONDS")
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(5);
        let github_api_url = non_empty("GITHUB_API_URL")
            .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string());
        let feishu_api_url = non_empty("FEISHU_API_URL")
            .unwrap_or_else(|| DEFAULT_FEISHU_API_URL.to_string());

        Ok(Self {
            host,
            port,
            feishu_app_id: non_empty("APP_ID"),
            feishu_app_secret: non_empty("APP_SECRET"),
            github_token: non_empty("PERSONAL_ACCESS_TOKEN"),
            github_api_url: github_api_url.trim_end_matches('/').to_string(),
            feishu_api_url: feishu_api_url.trim_end_matches('/').to_string(),
            upstream_timeout: Duration::from_secs(upstream_timeout_secs.max(1)),
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }

    pub fn tenant_auth(&self) -> TenantAuthConfig {
        TenantAuthConfig::new(self.feishu_app_id.clone(), self.feishu_app_secret.clone())
            .with_base_url(self.feishu_api_url.clone())
            .with_timeout(self.upstream_timeout)
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("bind_addr", &self.bind_addr())
            .field("feishu_app_id", &self.feishu_app_id)
            .field("feishu_app_secret", &self.feishu_app_secret.as_ref().map(|_| "<redacted>"))
            .field("github_token", &self.github_token.as_ref().map(|_| "<redacted>"))
            .field("github_api_url", &self.github_api_url)
            .field("feishu_api_url", &self.feishu_api_url)
            .field("upstream_timeout", &self.upstream_timeout)
            .finish()
    }
}
