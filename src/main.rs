use anyhow::{Context, Result};
use locale_negotiator::{config, server};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("locale_negotiator=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    info!("Starting locale negotiator");

    // Load configuration from environment
    let config = config::Config::from_env()?;

    // Load locale files once; they are read-only while serving
    let catalog = Arc::new(server::load_catalog(&config)?);
    let resolver = Arc::new(server::build_resolver(&config, catalog));
    info!(
        "Default locale '{}', query parameter '{}', language key '{}'",
        resolver.default_locale(),
        resolver.url_parameter(),
        resolver.language_key()
    );

    let app = server::router(resolver);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("✓ Listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
