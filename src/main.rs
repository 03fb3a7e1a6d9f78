use lensmatch::{api::create_router, init, AppState, ClipEncoder, Config, Result};

use std::{net::SocketAddr, sync::Arc};

#[tokio::main]
async fn main() -> Result<()> {
    // Credentials and overrides may come from a .env file
    dotenv::dotenv().ok();

    // Initialize the application
    init()?;

    // Fail fast on missing credentials or out-of-range parameters
    let config = Config::from_env()?;

    // Load the vision encoder once; it is shared across all requests
    let encoder = ClipEncoder::load(&config.model_path)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    // Initialize application state
    let state = AppState::new(config, Arc::new(encoder))?;

    // Build our application with routes
    let app = create_router(state);

    // Set up the server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
