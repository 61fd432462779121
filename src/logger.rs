//! Logging setup
//!
//! Installs a `tracing` subscriber writing to stderr and, when
//! `SYSPROBE_LOG_FILE` is set, appending to that file as well. The filter
//! comes from `RUST_LOG`, defaulting to `info` (`debug` with
//! `SYSPROBE_LOG_VERBOSE=1`).

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::dispatcher;
use tracing_subscriber::{prelude::*, EnvFilter};

const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;

pub const ENV_LOG_VERBOSE: &str = "SYSPROBE_LOG_VERBOSE";
pub const ENV_LOG_FILE: &str = "SYSPROBE_LOG_FILE";

fn verbose() -> bool {
    std::env::var(ENV_LOG_VERBOSE)
        .map(|v| v == "1")
        .unwrap_or(false)
}

/// Move `path` to `*.log.bak` once it grows past the size limit
pub fn rotate_if_needed(path: &Path) {
    rotate_above(path, MAX_LOG_BYTES);
}

fn rotate_above(path: &Path, limit: u64) {
    if let Ok(meta) = fs::metadata(path) {
        if meta.len() > limit {
            let backup = path.with_extension("log.bak");
            let _ = fs::remove_file(&backup);
            let _ = fs::rename(path, &backup);
        }
    }
}

/// Install the global subscriber. Later calls do nothing.
pub fn init_logger() {
    if dispatcher::has_been_set() {
        return;
    }

    let default_level = if verbose() { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let file_layer = std::env::var(ENV_LOG_FILE)
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
        .and_then(|path| {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                let _ = fs::create_dir_all(dir);
            }
            rotate_if_needed(&path);
            OpenOptions::new().create(true).append(true).open(&path).ok()
        })
        .map(|file| {
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
        });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init();
}
