#![warn(rust_2018_idioms)]

use std::env;

use tracing_appender::non_blocking::WorkerGuard;
use vault_session::{VaultError, VaultSessionBuilder};

const APP_NAME: &str = concat!(env!("CARGO_PKG_NAME"), "-", env!("CARGO_PKG_VERSION"));

#[tokio::main]
async fn main() -> Result<(), VaultError> {
    let _guard = init_logger();

    let session = VaultSessionBuilder::new()
        .application_name(APP_NAME)
        .build()?;

    let token = session.session_token().await?;
    tracing::info!(
        renewable = token.is_renewable(),
        lease_duration = token.lease_duration().as_secs(),
        "Vault session established"
    );

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for shutdown signal: {}", e);
    }

    session.destroy().await;
    Ok(())
}

fn init_logger() -> Option<WorkerGuard> {
    use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
    use tracing_log::LogTracer;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::{EnvFilter, Registry};

    if !env::var("JSON_LOG").is_ok_and(|s| s.parse().unwrap_or_default()) {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .init();
        return None;
    }

    // Redirect the logs from log library to tracing's subscribers.
    if LogTracer::init().is_err() {
        eprintln!("log tracer already initialized");
    }

    let (non_blocking_writer, guard) = tracing_appender::non_blocking(std::io::stdout());

    let formatting_layer = BunyanFormattingLayer::new(APP_NAME.to_string(), non_blocking_writer);
    let subscriber = Registry::default()
        .with(EnvFilter::from_default_env())
        .with(JsonStorageLayer)
        .with(formatting_layer);

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("global tracing subscriber already set");
    }
    Some(guard)
}
