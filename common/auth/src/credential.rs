use chrono::{DateTime, Duration, Utc};

/// Seconds before expiry at which a credential stops being handed out.
pub const SAFETY_MARGIN_SECS: i64 = 60;

/// A tenant access token together with the instant it stops being accepted upstream.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    expires_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// Build a credential valid for `seconds` counted from `issued_at`. Lifetimes
    /// past chrono's range saturate at the latest representable instant.
    pub fn issued_at(token: impl Into<String>, issued_at: DateTime<Utc>, seconds: i64) -> Self {
        let expires_at = Duration::try_seconds(seconds)
            .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self::new(token, expires_at)
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// True while `now` is still ahead of the expiry minus the safety margin.
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .checked_sub_signed(Duration::seconds(SAFETY_MARGIN_SECS))
            .is_some_and(|cutoff| now < cutoff)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
