mod cli;

use crate::cli::{KeySchemeArg, LogFormatArg, StorageBackendArg, CLI};
use anyhow::Context;
use clap::Parser;
use snip_gateway::{App, AppState, GatewaySettings, SHUTDOWN_GRACE};
use snip_shortener::ShortenerSettings;
use snip_storage::{InMemoryRepository, InMemorySequenceRepository, PgRepository, PgSequenceRepository};
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    init_tracing(config.log_format);

    info!(
        listen_addr = %config.listen_addr,
        base_url = %config.base_url,
        storage_backend = %config.storage,
        key_scheme = %config.key_scheme,
        "starting snip gateway"
    );

    let settings = GatewaySettings::builder()
        .base_url(config.base_url.clone())
        .store_timeout(Duration::from_secs(config.store_timeout_secs))
        .cache_capacity(config.cache_capacity)
        .shortener(
            ShortenerSettings::builder()
                .max_attempts(config.max_key_attempts)
                .build(),
        )
        .build();

    let state = build_state(&config, &settings).await?;

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!(listen_addr = %listener.local_addr()?, "listening");

    App::serve(listener, App::router(state), shutdown_signal(), SHUTDOWN_GRACE).await?;

    info!("server stopped");
    Ok(())
}

fn init_tracing(format: LogFormatArg) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormatArg::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormatArg::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

async fn build_state(config: &CLI, settings: &GatewaySettings) -> anyhow::Result<AppState> {
    let length = usize::from(config.key_length);

    let state = match (config.storage, config.key_scheme) {
        (StorageBackendArg::InMemory, KeySchemeArg::Random) => {
            AppState::with_random_keys(InMemoryRepository::new(), length, settings)
        }
        (StorageBackendArg::InMemory, KeySchemeArg::Sequential) => {
            AppState::with_sequential_keys(InMemorySequenceRepository::new(), settings)
        }
        (StorageBackendArg::Postgres, KeySchemeArg::Random) => {
            let repository = PgRepository::connect(database_url(config)?)
                .await
                .context("failed to connect to postgres")?;
            repository.migrate().await.context("failed to create schema")?;
            AppState::with_random_keys(repository, length, settings)
        }
        (StorageBackendArg::Postgres, KeySchemeArg::Sequential) => {
            let repository = PgSequenceRepository::connect(database_url(config)?)
                .await
                .context("failed to connect to postgres")?;
            repository.migrate().await.context("failed to create schema")?;
            AppState::with_sequential_keys(repository, settings)
        }
    };

    Ok(state)
}

fn database_url(config: &CLI) -> anyhow::Result<&str> {
    config
        .database_url
        .as_deref()
        .context("database url is required when storage backend is postgres")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
