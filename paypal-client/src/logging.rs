//! Tracing subscriber setup driven by the `log.*` config options.

use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;

use paypal_types::LogConfig;
use tracing_subscriber::EnvFilter;

/// Installs a global fmt subscriber according to `config`.
///
/// Returns `Ok(true)` if a subscriber was installed, `Ok(false)` if logging
/// is disabled or a global subscriber already exists. `RUST_LOG` takes
/// precedence over `log.level` when set.
pub fn init(config: &LogConfig) -> io::Result<bool> {
    if !config.enabled {
        return Ok(false);
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_directive()));

    let installed = match &config.file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .is_ok()
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .try_init()
            .is_ok(),
    };

    Ok(installed)
}
