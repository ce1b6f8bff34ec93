mod config;
mod error;
mod routes;

use std::sync::{Arc, Mutex, PoisonError};

use bomsync_core::source::SupabaseSource;
use bomsync_core::EtlService;
use config::AppConfig;
use routes::{app_router, AppState, SharedService};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Only load .env in development; production uses platform-native env injection.
    #[cfg(debug_assertions)]
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bomsync_api=info".parse()?)
                .add_directive("bomsync_core=info".parse()?),
        )
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!("Starting bomsync-api with config: {:?}", config);

    // The blocking HTTP client owns its own runtime, so it is created and
    // dropped outside of the server's runtime.
    let source = SupabaseSource::new(
        &config.supabase_url,
        config.supabase_key.clone(),
        config.supabase_timeout,
    )?;
    let service = EtlService::open(source, &config.sage100_db_path)?;
    let state = AppState::new(service, config.allow_clear);
    let service = state.service();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let served = runtime.block_on(serve(config.bind_addr.clone(), state));
    drop(runtime);

    close_service(service);
    served
}

async fn serve(
    bind_addr: String,
    state: AppState<SupabaseSource>,
) -> Result<(), Box<dyn std::error::Error>> {
    let router = app_router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("bomsync-api listening on {}", bind_addr);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {error}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

fn close_service(service: SharedService<SupabaseSource>) {
    match Arc::try_unwrap(service) {
        Ok(service) => {
            let service = Mutex::into_inner(service).unwrap_or_else(PoisonError::into_inner);
            match service.close() {
                Ok(()) => tracing::info!("Article master closed"),
                Err(error) => tracing::warn!("Failed to close article master: {error}"),
            }
        }
        Err(_) => tracing::warn!("ETL service still shared at shutdown; leaving it to drop"),
    }
}
