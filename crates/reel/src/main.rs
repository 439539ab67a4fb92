use std::sync::Arc;

use reel_core::config::Config;
use reel_http::{router, AppState, VIDEOS_ROUTE};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    reel_core::logging::init("reel")?;

    let cfg = Arc::new(Config::load()?);
    if let Err(e) = cfg.credentials() {
        tracing::warn!(error = %e, "requests will fail until credentials are configured");
    }

    let app = router(AppState::new(cfg.clone()));
    let listener = tokio::net::TcpListener::bind(cfg.bind_addr).await?;
    tracing::info!(addr = %cfg.bind_addr, route = VIDEOS_ROUTE, "reel listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("reel stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C"),
        _ = terminate => tracing::info!("received terminate signal"),
    }
}
