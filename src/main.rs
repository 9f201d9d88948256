use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use podium::engine::Engine;
use podium::http;
use podium::ledger::LedgerStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let metrics_port: Option<u16> = std::env::var("PODIUM_METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok());
    podium::observability::init(metrics_port);

    let port = std::env::var("PODIUM_PORT").unwrap_or_else(|_| "8080".into());
    let bind = std::env::var("PODIUM_BIND").unwrap_or_else(|_| "0.0.0.0".into());
    let data_dir = std::env::var("PODIUM_DATA_DIR").unwrap_or_else(|_| "./data".into());

    // Corrupt or missing ledgers are fatal at startup, never at request time.
    let engine = Arc::new(Engine::new(LedgerStore::new(&data_dir))?);

    let addr = format!("{bind}:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!("podium listening on {addr}");
    info!("  data_dir: {data_dir}");
    info!(
        "  metrics: {}",
        metrics_port.map_or("disabled".to_string(), |p| format!(
            "http://0.0.0.0:{p}/metrics"
        ))
    );

    axum::serve(listener, http::router(engine))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("podium stopped");
    Ok(())
}

/// Resolves when ctrl-c or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to register SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
    }
}
