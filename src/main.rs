//! Profile API server: reads settings, builds the store once, serves the router.

use profile_api::{app, connect, AppState, Settings};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("profile_api=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let store = connect(&settings.store).await?;
    tracing::info!(backend = store.backend(), "profile store ready");
    let state = AppState::new(store);

    let listener = TcpListener::bind(settings.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
