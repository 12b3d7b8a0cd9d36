pub mod app_state;
pub mod config;
pub mod extract;
pub mod feishu_handlers;
pub mod forward;
pub mod github_handlers;
pub mod metrics;
pub mod routes;

pub use crate::app_state::AppState;
pub use crate::config::GatewayConfig;
pub use crate::forward::{QueryPolicy, Upstream, UpstreamReply};
pub use crate::metrics::GatewayMetrics;
pub use crate::routes::create_router;

// Reported by the welcome endpoint.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
