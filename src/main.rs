use std::env;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use minirag::core::config::Settings;
use minirag::core::logging;
use minirag::core::paths::AppPaths;
use minirag::server::router;
use minirag::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let paths = AppPaths::new();
    logging::init(&paths);

    let settings = Settings::from_env();
    tracing::info!(
        "Starting chat API, pipeline V{}, answer model {}",
        settings.pipeline.version,
        settings.answer_model
    );

    let state = AppState::initialize(settings, paths).await?;

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT")
        .ok()
        .and_then(|val| val.parse::<u16>().ok())
        .unwrap_or(8000);
    let bind_addr = format!("{}:{}", host, port);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    let app: Router = router::router(state);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
