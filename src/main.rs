//! Checker harness - HTTP Server Entry Point
//!
//! Serves the bundled key/value checker.

use std::sync::Arc;

use checker_harness::{api, config::Config, kvstore::KvStoreChecker};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async_main())
}

async fn async_main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "checker_harness=info,checker_task=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Loaded configuration: service={}, log_sink={:?}",
        config.service_name, config.log_sink
    );

    let checker = KvStoreChecker::new(
        config.service_name.clone(),
        config.service_port,
        config.http_timeout,
    )?;

    api::serve(config, Arc::new(checker)).await?;

    Ok(())
}
