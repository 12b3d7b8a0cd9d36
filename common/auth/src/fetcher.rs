use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::config::TenantAuthConfig;
use crate::error::{AuthError, AuthResult};

/// Validity assumed when the issuance response carries no lifetime.
pub const DEFAULT_EXPIRE_SECS: i64 = 3600;

/// Longest lifetime taken from an issuance response; larger values are clamped.
pub const MAX_EXPIRE_SECS: i64 = 30 * 24 * 3600;

/// Result of one successful issuance call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: i64,
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    app_id: &'a str,
    app_secret: &'a str,
}

#[derive(Clone)]
pub struct TenantTokenFetcher {
    client: Client,
    url: String,
    timeout: Duration,
}

impl TenantTokenFetcher {
    pub fn new(config: &TenantAuthConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: &TenantAuthConfig) -> Self {
        Self {
            client,
            url: config.token_url(),
            timeout: config.timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Exchange the app id and secret for a fresh tenant access token.
    pub async fn fetch(&self, app_id: &str, app_secret: &str) -> AuthResult<IssuedToken> {
        let response = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&TokenRequest { app_id, app_secret })
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        let body: Value = serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::Object(Default::default()));

        if !status.is_success() {
            let message = text_field(&body, "msg")
                .or_else(|| text_field(&body, "message"))
                .map(str::to_owned)
                .unwrap_or_else(|| status.to_string());
            return Err(AuthError::Rejected(message));
        }

        parse_issued_token(&body)
    }
}

/// Pull the token and its lifetime out of an issuance response. Feishu answers
/// with the fields at the top level; some gateways nest them under `data`.
pub fn parse_issued_token(body: &Value) -> AuthResult<IssuedToken> {
    let data = body.get("data");
    let token = text_field(body, "tenant_access_token")
        .or_else(|| data.and_then(|d| text_field(d, "tenant_access_token")));

    let Some(token) = token else {
        let message = text_field(body, "msg")
            .map(str::to_owned)
            .unwrap_or_else(|| body.to_string());
        return Err(AuthError::MissingToken(message));
    };

    let expires_in = lifetime_secs(body, "expire")
        .or_else(|| lifetime_secs(body, "expires_in"))
        .or_else(|| data.and_then(|d| lifetime_secs(d, "expire")))
        .unwrap_or(DEFAULT_EXPIRE_SECS);

    Ok(IssuedToken {
        token: token.to_owned(),
        expires_in,
    })
}

fn text_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Positive lifetime in whole seconds. Numbers and numeric strings are both
/// accepted; fractions round up and anything past `MAX_EXPIRE_SECS` is clamped.
fn lifetime_secs(value: &Value, key: &str) -> Option<i64> {
    let secs = match value.get(key)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !secs.is_finite() || secs <= 0.0 {
        return None;
    }
    Some(secs.ceil().min(MAX_EXPIRE_SECS as f64) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn fetcher_for(server: &MockServer) -> TenantTokenFetcher {
        let config = TenantAuthConfig::new(None, None)
            .with_base_url(server.base_url())
            .with_timeout(Duration::from_millis(300));
        TenantTokenFetcher::new(&config)
    }

    #[test]
    fn parses_top_level_fields() {
        let issued = parse_issued_token(&json!({
            "code": 0,
            "msg": "ok",
            "tenant_access_token": "t-abc",
            "expire": 7200
        }))
        .unwrap();
        assert_eq!(issued, IssuedToken { token: "t-abc".into(), expires_in: 7200 });
    }

    #[test]
    fn parses_nested_data_and_expires_in() {
        let issued = parse_issued_token(&json!({ "data": { "tenant_access_token": "t-nested", "expire": 900 } })).unwrap();
        assert_eq!(issued.token, "t-nested");
        assert_eq!(issued.expires_in, 900);

        let issued = parse_issued_token(&json!({ "tenant_access_token": "t-x", "expires_in": 120 })).unwrap();
        assert_eq!(issued.expires_in, 120);
    }

    #[test]
    fn missing_expire_defaults_to_an_hour() {
        let issued = parse_issued_token(&json!({ "tenant_access_token": "t-abc" })).unwrap();
        assert_eq!(issued.expires_in, DEFAULT_EXPIRE_SECS);
    }

    #[test]
    fn oversized_expire_is_clamped() {
        let issued = parse_issued_token(&json!({ "tenant_access_token": "t-abc", "expire": i64::MAX })).unwrap();
        assert_eq!(issued.expires_in, MAX_EXPIRE_SECS);

        let issued = parse_issued_token(&json!({ "tenant_access_token": "t-abc", "expire": 1e300 })).unwrap();
        assert_eq!(issued.expires_in, MAX_EXPIRE_SECS);
    }

    #[test]
    fn float_and_string_expire_are_accepted() {
        let issued = parse_issued_token(&json!({ "tenant_access_token": "t-abc", "expire": 7200.0 })).unwrap();
        assert_eq!(issued.expires_in, 7200);

        let issued = parse_issued_token(&json!({ "tenant_access_token": "t-abc", "expire": "900" })).unwrap();
        assert_eq!(issued.expires_in, 900);

        let issued = parse_issued_token(&json!({ "tenant_access_token": "t-abc", "expire": 0.5 })).unwrap();
        assert_eq!(issued.expires_in, 1);
    }

    #[test]
    fn unusable_expire_falls_back_to_default() {
        for expire in [json!(0), json!(-5), json!("soon"), json!(true), json!(null)] {
            let issued = parse_issued_token(&json!({ "tenant_access_token": "t-abc", "expire": expire })).unwrap();
            assert_eq!(issued.expires_in, DEFAULT_EXPIRE_SECS, "expire = {expire}");
        }
    }

    #[test]
    fn missing_token_reports_msg_or_body() {
        let err = parse_issued_token(&json!({ "code": 10003, "msg": "invalid param" })).unwrap_err();
        assert_eq!(err.to_string(), "Failed to obtain tenant_access_token: invalid param");

        let err = parse_issued_token(&json!({ "code": 1 })).unwrap_err();
        assert_eq!(err.to_string(), "Failed to obtain tenant_access_token: {\"code\":1}");
    }

    #[tokio::test]
    async fn fetch_posts_app_credentials() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/auth/v3/tenant_access_token/internal")
                .json_body(json!({ "app_id": "cli_a", "app_secret": "s3cret" }));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({ "code": 0, "tenant_access_token": "t-live", "expire": 7200 }));
        });

        let issued = fetcher_for(&server).fetch("cli_a", "s3cret").await.expect("token issued");
        mock.assert();
        assert_eq!(issued.token, "t-live");
        assert_eq!(issued.expires_in, 7200);
    }

    #[tokio::test]
    async fn non_success_status_uses_upstream_message() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/auth/v3/tenant_access_token/internal");
            then.status(400).json_body(json!({ "code": 10014, "msg": "app secret invalid" }));
        });

        let err = fetcher_for(&server).fetch("cli_a", "wrong").await.unwrap_err();
        assert_eq!(err.to_string(), "Feishu auth error: app secret invalid");
    }

    #[tokio::test]
    async fn non_success_status_without_body_uses_status_line() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/auth/v3/tenant_access_token/internal");
            then.status(502).body("bad gateway");
        });

        let err = fetcher_for(&server).fetch("cli_a", "s3cret").await.unwrap_err();
        assert_eq!(err.to_string(), "Feishu auth error: 502 Bad Gateway");
    }

    #[tokio::test]
    async fn slow_issuer_times_out() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/auth/v3/tenant_access_token/internal");
            then.status(200)
                .delay(Duration::from_secs(2))
                .json_body(json!({ "tenant_access_token": "t-late" }));
        });

        let err = fetcher_for(&server).fetch("cli_a", "s3cret").await.unwrap_err();
        assert!(matches!(err, AuthError::Timeout), "unexpected error: {err:?}");
        assert_eq!(err.to_string(), "Feishu auth request timed out");
    }
}
