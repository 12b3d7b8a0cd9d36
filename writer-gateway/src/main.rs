use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;
use writer_gateway::{create_router, AppState, GatewayConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = GatewayConfig::from_env()?;
    if config.tenant_auth().credentials().is_none() {
        info!("APP_ID/APP_SECRET not set; Feishu routes will answer 503");
    }
    let addr = config.bind_addr();
    let state = AppState::new(config)?;
    let app = create_router(state);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Serving technical writer gateway");
    axum::serve(listener, app).await?;
    Ok(())
}
