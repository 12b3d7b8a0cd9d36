use std::time::Duration;

pub const DEFAULT_FEISHU_API_URL: &str = "https://open.feishu.cn/open-apis";

/// Runtime configuration for tenant access token issuance.
#[derive(Clone)]
pub struct TenantAuthConfig {
    /// Application id issued by the Feishu developer console.
    pub app_id: Option<String>,
    /// Application secret paired with `app_id`.
    pub app_secret: Option<String>,
    /// Base of the Feishu open API, without a trailing slash.
    pub base_url: String,
    /// Upper bound for a single issuance call.
    pub timeout: Duration,
}

impl TenantAuthConfig {
    /// Construct config against the public Feishu endpoint with a 5 second timeout.
    pub fn new(app_id: Option<String>, app_secret: Option<String>) -> Self {
        Self {
            app_id,
            app_secret,
            base_url: DEFAULT_FEISHU_API_URL.to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the id/secret pair when both are present and non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let app_id = self.app_id.as_deref().filter(|v| !v.is_empty())?;
        let app_secret = self.app_secret.as_deref().filter(|v| !v.is_empty())?;
        Some((app_id, app_secret))
    }

    pub fn token_url(&self) -> String {
        format!("{}/auth/v3/tenant_access_token/internal", self.base_url)
    }
}

impl std::fmt::Debug for TenantAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantAuthConfig")
            .field("app_id", &self.app_id)
            .field("app_secret", &self.app_secret.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}
