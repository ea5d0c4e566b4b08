use anyhow::Context;
use dotenvy::dotenv;
use std::net::SocketAddr;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use dashboard::config::DashboardConfig;
use dashboard::services::participation_api::ParticipationClient;
use dashboard::web::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = DashboardConfig::from_env();
    let api = ParticipationClient::from_config(&config).context("building http client")?;
    info!(api = %api.base_url(), "participation api configured");

    let app = web::app(AppState { api });

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid HOST/PORT {}:{}", config.host, config.port))?;

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            let fallback_port = config.port.saturating_add(1);
            warn!(%addr, error = %e, fallback_port, "bind failed, trying fallback port");
            let fallback: SocketAddr = format!("{}:{}", config.host, fallback_port)
                .parse()
                .context("invalid fallback address")?;
            tokio::net::TcpListener::bind(fallback)
                .await
                .with_context(|| format!("binding {}", fallback))?
        }
    };

    let bound_addr = listener.local_addr()?;
    info!("dashboard listening on http://{}/dashboard", bound_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
