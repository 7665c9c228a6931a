use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use portal::api::router;
use portal::auth::AuthContext;
use portal::backend::HttpBackendClient;
use portal::config::PortalConfig;
use portal::identity::RestIdentityProvider;
use portal::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "portal=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = PortalConfig::new_from_env()?;

    let identity = Arc::new(RestIdentityProvider::new(config.identity.clone())?);
    let backend = Arc::new(HttpBackendClient::new(config.backend.clone(), identity.clone())?);
    let auth = Arc::new(AuthContext::new(identity.clone(), backend.clone()));

    let shutdown = CancellationToken::new();
    let auth_task = auth.spawn(shutdown.clone());

    let state = AppState {
        backend,
        identity: identity.clone(),
        tokens: identity,
        auth,
        guard: config.guard.clone(),
    };

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("shutting down");
        })
        .await?;

    shutdown.cancel();
    auth_task.await?;

    Ok(())
}
