//! Storefront Catalog - catalog back end for a small electronics storefront

use anyhow::Result;
use storefront_catalog::catalog::{seed::seed_catalog, store};
use storefront_catalog::config::AppConfig;
use storefront_catalog::http::{router, AppState};
use storefront_catalog::CatalogStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();
    let config = AppConfig::from_env();

    let catalog = match &config.snapshot_path {
        Some(path) => match store::load_snapshot(path).await? {
            Some(catalog) => catalog,
            None => {
                tracing::info!(path = %path.display(), "no snapshot found, seeding default catalog");
                let catalog = seed_catalog();
                store::write_snapshot(path, &store::encode_snapshot(&catalog)?).await?;
                catalog
            }
        },
        None => seed_catalog(),
    };
    tracing::info!(products = catalog.products.len(), rate = config.exchange_rate.value(), "catalog ready");

    let state = AppState::new(CatalogStore::new(catalog, Some(config.exchange_rate)), config.snapshot_path.clone());
    let app = router(state);

    tracing::info!("🚀 Storefront Catalog listening on 0.0.0.0:{}", config.port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?, app).await?;
    Ok(())
}
