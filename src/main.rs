use std::sync::Arc;

use clap::Parser;
use color_eyre::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::App;
use crate::storage::FileStore;

mod api;
mod app;
mod cli;
mod commands;
mod config;
mod format;
mod screen;
mod storage;
mod theme;
mod tui;
mod ui;
mod view_state;

pub use theme::Theme;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let _guard = initialize_logging()?;
    info!("Starting eventspark");

    let args = cli::Args::parse();

    let mut config = config::load()?;
    args.apply(&mut config);

    let store = FileStore::new(config.session_path());
    info!(base_url = %config.api.base_url, session = ?store.path(), "Loaded configuration");

    let mut app = App::new(&config, Arc::new(store), args.screen)?;
    app.run().await?;

    Ok(())
}

fn initialize_logging() -> Result<WorkerGuard> {
    let directory = config::data_dir().map_or_else(
        || std::path::PathBuf::from("logs"),
        |path| path.join("logs"),
    );
    std::fs::create_dir_all(&directory)?;

    let file_appender = tracing_appender::rolling::daily(&directory, "eventspark.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true),
        )
        .init();

    Ok(guard)
}
