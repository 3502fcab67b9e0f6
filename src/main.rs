use fastdo::{
    application::{self, todo_store::TodoStore},
    config::AppConfig,
    domain::repository::BlobStore,
    http::routing::{self, AppState},
    infrastructure::sqlite_store::SqliteBlobStore,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env()?;
    let blobs = SqliteBlobStore::connect(&config.database_url).await?;
    blobs.init().await?;
    let store = application::shared(TodoStore::open(blobs).await);
    let router = routing::api(AppState { store });

    tracing::info!(addr = %config.addr, database = %config.database_url, "listening");
    axum::serve(tokio::net::TcpListener::bind(config.addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal::ctrl_c;
    let _ = ctrl_c().await;
    tracing::info!("shutdown");
}
