use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use health_journal::backend::{create_router, initialize_backend};
use health_journal::config::Config;

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load();
    init_tracing(&config);

    config
        .prepare_database_dir()
        .context("Failed to create the data directory")?;

    let app_state = initialize_backend(&config).await?;
    let router = create_router(app_state, &config.cors_origin)?;

    let listener = TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen))?;
    info!("Listening on {}", config.listen);

    axum::serve(listener, router).await?;
    Ok(())
}
