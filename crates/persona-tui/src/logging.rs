use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default directives; `RUST_LOG` overrides them.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "persona_tui=debug,persona_core=debug"
    } else {
        "persona_tui=info,persona_core=info"
    }
}

/// Send logs to a file, since the terminal belongs to the UI.
pub fn init(log_path: &Path, verbose: bool) -> Result<()> {
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(log_path)?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(verbose).into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .init();

    Ok(())
}
