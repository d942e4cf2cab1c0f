use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let boot = keymux_core::bootstrap::bootstrap_from_env()?;
    let engine = Arc::new(keymux_core::ProxyEngine::new(boot.state.clone()));

    let app = axum::Router::new()
        .merge(keymux_router::proxy_router(engine))
        .nest(
            "/admin",
            keymux_router::admin_router(boot.state.clone(), boot.source.clone()),
        );

    let global = boot.state.snapshot.load().global.clone();
    let bind = format!("{}:{}", global.host, global.port);
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!(event = "listening", bind = %bind);
    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
