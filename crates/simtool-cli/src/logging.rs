//! Tracing subscriber setup

use std::path::Path;
use std::sync::Mutex;

use eyre::WrapErr;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LogSettings;

/// Filter used when `RUST_LOG` is unset: `-v` and `-vv` override the settings
fn default_directive(settings: &LogSettings, verbose: u8) -> &str {
    match verbose {
        0 => settings.level.as_str(),
        1 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber: stderr always, plus a plain file when asked
///
/// # Errors
/// Returns error if the filter is invalid or the log file cannot be created
pub fn init(settings: &LogSettings, verbose: u8, log_file: Option<&Path>) -> eyre::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directive(settings, verbose))
            .wrap_err_with(|| format!("invalid log level '{}'", settings.level))?,
    };

    let file_layer = match log_file.or(settings.file.as_deref()) {
        Some(path) => {
            let file = std::fs::File::create(path)
                .wrap_err_with(|| format!("cannot create log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .try_init()?;

    Ok(())
}
