use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use reqwest::Client;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::TenantAuthConfig;
use crate::credential::Credential;
use crate::error::{AuthError, AuthResult};
use crate::fetcher::TenantTokenFetcher;

/// Holds the single tenant access token for this process and refreshes it on demand.
///
/// The slot lock is held across a refresh, so concurrent callers arriving while
/// the token is stale wait for the in-flight issuance call instead of starting
/// their own. Callers that queued behind a failed attempt get its error rather
/// than retrying one after another.
#[derive(Clone)]
pub struct TenantTokenCache {
    config: Arc<TenantAuthConfig>,
    fetcher: TenantTokenFetcher,
    slot: Arc<Mutex<Slot>>,
    // Bumped under the slot lock each time an issuance attempt finishes.
    attempts: Arc<AtomicU64>,
}

#[derive(Default)]
struct Slot {
    credential: Option<Credential>,
    last_failure: Option<AuthError>,
}

impl TenantTokenCache {
    pub fn new(config: TenantAuthConfig, client: Client) -> Self {
        let fetcher = TenantTokenFetcher::with_client(client, &config);
        Self::with_fetcher(config, fetcher)
    }

    pub fn with_fetcher(config: TenantAuthConfig, fetcher: TenantTokenFetcher) -> Self {
        Self {
            config: Arc::new(config),
            fetcher,
            slot: Arc::new(Mutex::new(Slot::default())),
            attempts: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn config(&self) -> &TenantAuthConfig {
        &self.config
    }

    /// Current credential without triggering a refresh, fresh or not.
    pub async fn cached(&self) -> Option<Credential> {
        self.slot.lock().await.credential.clone()
    }

    /// Return a credential that stays valid past the safety margin, issuing a new one if needed.
    pub async fn get_credential(&self) -> AuthResult<Credential> {
        let (app_id, app_secret) = self
            .config
            .credentials()
            .ok_or(AuthError::MissingCredentials)?;

        let seen = self.attempts.load(Ordering::Acquire);
        let mut slot = self.slot.lock().await;
        if let Some(credential) = slot.credential.as_ref().filter(|c| c.is_fresh_at(Utc::now())) {
            return Ok(credential.clone());
        }
        if self.attempts.load(Ordering::Acquire) != seen {
            if let Some(err) = &slot.last_failure {
                return Err(err.clone());
            }
        }

        let outcome = self.fetcher.fetch(app_id, app_secret).await;
        self.attempts.fetch_add(1, Ordering::AcqRel);
        let issued = match outcome {
            Ok(issued) => issued,
            Err(err) => {
                slot.last_failure = Some(err.clone());
                return Err(err);
            }
        };
        let credential = Credential::issued_at(issued.token, Utc::now(), issued.expires_in);
        slot.credential = Some(credential.clone());
        slot.last_failure = None;
        debug!(
            expires_at = %credential.expires_at(),
            url = self.fetcher.url(),
            "Refreshed tenant access token"
        );
        Ok(credential)
    }
}
