use std::sync::Arc;

use mascot::auth::CredentialResolver;
use mascot::store::RestStore;
use tower_http::cors::{Any, CorsLayer};

mod configuration;
mod error;
mod routes;
mod state;

use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let settings = configuration::Settings::new()?;

    let resolver = CredentialResolver::new(settings.auth_config())?;
    let store = RestStore::new(settings.store_config())?;

    let state = AppState {
        resolver: Arc::new(resolver),
        store: Arc::new(store),
        providers: settings.provider_configs(),
    };

    // Create router with CORS support
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::configure(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(settings.server.socket_addr()).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
