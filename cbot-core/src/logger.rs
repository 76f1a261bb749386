//! Tracing initialization: console and log file share one fmt layer
//! (level, target, span events, all fields) via a Tee writer.

use std::fs::OpenOptions;
use std::io;
use std::sync::Arc;

use tracing_subscriber::{
    fmt::format::FmtSpan,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

/// Initializes the global tracing subscriber.
/// Log level comes from RUST_LOG (info when unset). Load .env before
/// calling this (e.g. dotenvy::dotenv()) or RUST_LOG from .env is ignored.
pub fn init_tracing(log_file_path: &str) -> anyhow::Result<()> {
    if let Some(parent) = std::path::Path::new(log_file_path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)?;
    let file = Arc::new(file);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    use tracing_subscriber::fmt::writer::MakeWriterExt;
    let writer = io::stdout.and(file);

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true)
        .with_thread_ids(true)
        .with_level(true)
        .with_file(false)
        .with_line_number(false);

    Registry::default()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set global subscriber: {}", e))?;

    Ok(())
}
