use std::sync::Arc;

use clap::Parser;
use explorer_server::{http, logging, state::AppState, Config};
use explorer_upstream::HttpUpstreamClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    let data_dir = config.resolved_data_dir();

    let _log_guard = logging::init(&data_dir.join("Logs"))?;

    let upstream = Arc::new(HttpUpstreamClient::new(config.upstream_url.clone()));
    let state = Arc::new(AppState::new(data_dir, upstream));

    let mut router = http::router(Arc::clone(&state));
    if let Some(static_dir) = &config.static_dir {
        router = router.fallback_service(tower_http::services::ServeDir::new(static_dir));
    }

    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            let fatal = explorer_core::CoreError::Fatal(err.to_string());
            tracing::error!(%fatal, %addr, "failed to bind listen address");
            std::process::exit(1);
        }
    };

    tracing::info!(%addr, "explorer-server listening");
    axum::serve(listener, router).await?;
    Ok(())
}
