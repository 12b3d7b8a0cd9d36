pub mod cache;
pub mod config;
pub mod credential;
pub mod error;
pub mod fetcher;

pub use cache::TenantTokenCache;
pub use config::{TenantAuthConfig, DEFAULT_FEISHU_API_URL};
pub use credential::{Credential, SAFETY_MARGIN_SECS};
pub use error::{AuthError, AuthResult, TOKEN_UNAVAILABLE_MESSAGE};
pub use fetcher::{IssuedToken, TenantTokenFetcher};
