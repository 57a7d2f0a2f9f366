// src/log.rs
use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::{Mutex, Once};

use tracing_subscriber::EnvFilter;

use crate::config::consts::{DEFAULT_LOG_LEVEL, LOG_ENV};

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

/// Install the global subscriber. Filter comes from `NCAA_LOG` (default
/// `info`). With `log_file`, lines are appended there without colour;
/// otherwise they go to stderr. Later calls are no-ops, so tests can call it
/// freely.
pub fn init(log_file: Option<&Path>) {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        if let Some(path) = log_file {
            let _ = crate::file::ensure_parent(path);
            match OpenOptions::new().create(true).append(true).open(path) {
                Ok(file) => {
                    let _ = tracing_subscriber::fmt()
                        .with_env_filter(env_filter())
                        .with_ansi(false)
                        .with_writer(Mutex::new(file))
                        .try_init();
                    return;
                }
                Err(e) => eprintln!("Warning: could not open log file {}: {e}", path.display()),
            }
        }

        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_ansi(std::io::stderr().is_terminal())
            .with_writer(std::io::stderr)
            .try_init();
    });
}
