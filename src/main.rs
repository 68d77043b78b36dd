use std::sync::Arc;
use std::time::Duration;

use messenger_nlu_bridge::{config::Config, routes, state::AppState};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let state = Arc::new(AppState::from_config(&config));

    if let Some(ttl) = config.session_ttl {
        let sessions = state.router.sessions().clone();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(ttl.clamp(Duration::from_secs(1), Duration::from_secs(60)));
            loop {
                tick.tick().await;
                let removed = sessions.purge_expired().await;
                if removed > 0 {
                    let remaining = sessions.len().await;
                    info!(removed, remaining, "purged idle sessions");
                }
            }
        });
    }

    let platform = state.platform.clone();
    tokio::spawn(async move {
        if let Err(e) = platform.subscribe_app().await {
            error!(error = %e, "subscription failed");
        }
    });

    let app = routes::create_router().with_state(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!(port = config.port, "webhook service ready");
    axum::serve(listener, app).await?;
    Ok(())
}
