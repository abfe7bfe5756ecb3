use anyhow::Context;
use rosistat_server::{initialize, router, AppState, ServerConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from_env().context("invalid server configuration")?;

    // The listener only opens once the schema is in place.
    let store = initialize(&config).map_err(|e| {
        log::error!("[DB] Startup failed: {e}");
        e
    })?;
    let state = Arc::new(AppState::new(store, config.node_env.clone()));
    state.mark_ready();

    let app = router(state, &config);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    log::info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("axum server error")?;

    log::info!("[Shutdown] Database closed");
    Ok(())
}

async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("failed to listen for SIGINT: {e}");
            std::future::pending::<()>().await;
        }
        "SIGINT"
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                log::warn!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
        "SIGTERM"
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    let received = tokio::select! {
        name = interrupt => name,
        name = terminate => name,
    };
    log::info!("[Shutdown] Received {received}, closing database and exiting");
}
