use std::{fs::OpenOptions, path::Path, sync::Mutex};

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

// Install the global subscriber, logging to the given file
// in append mode or to stdout when no file is given
pub fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let level = if cfg!(debug_assertions) { "trace" } else { "info" };

    let (filter, from_env) = match EnvFilter::try_from_default_env() {
        Ok(f) => (f, true),
        Err(_) => (EnvFilter::new(level), false),
    };

    let registry = tracing_subscriber::registry().with(filter);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {:?}", path))?;

            let fmt_layer = fmt::layer().with_ansi(false).with_writer(Mutex::new(file));

            registry.with(fmt_layer).init();
        }
        None => {
            registry.with(fmt::layer()).init();
        }
    }

    if !from_env {
        info!("\"RUST_LOG\" variable not set, defaulting to {level}");
    }

    Ok(())
}
