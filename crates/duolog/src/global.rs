//! Process-wide logger
//!
//! The first successful [`try_init_logger`] (or [`init_logger`]) call fixes
//! the global logger for the rest of the process. Later calls never replace
//! it.

use duolog_core::{Error, LoggerConfig, Result};
use once_cell::sync::{Lazy, OnceCell};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::layer::DuologLayer;
use crate::logger::{Logger, SugaredLogger};

static GLOBAL: OnceCell<Logger> = OnceCell::new();

static NOOP: Lazy<Logger> = Lazy::new(Logger::noop);

/// Build a logger from `config`, install it as the global logger and as the
/// `tracing` subscriber.
///
/// Returns [`Error::AlreadyInitialized`] if a global logger exists. If some
/// other `tracing` subscriber is already installed, the logger is still
/// installed and a warning is written through it.
pub fn try_init_logger(config: &LoggerConfig) -> Result<Logger> {
    if GLOBAL.get().is_some() {
        return Err(Error::AlreadyInitialized);
    }
    try_init_with(Logger::from_config(config)?)
}

/// Install a logger built by the caller, for example over a
/// [`SinkRouter`](crate::SinkRouter) with an `on_write_error` hook.
///
/// Same rules as [`try_init_logger`].
pub fn try_init_with(logger: Logger) -> Result<Logger> {
    GLOBAL
        .set(logger.clone())
        .map_err(|_| Error::AlreadyInitialized)?;

    if let Err(e) = tracing_subscriber::registry()
        .with(DuologLayer::new(logger.clone()))
        .try_init()
    {
        logger.warn(
            "tracing subscriber already installed, tracing events are not captured",
            &[crate::field("error", e.to_string())],
        );
    }

    Ok(logger)
}

/// Like [`try_init_logger`], but a logger that cannot be built is fatal:
/// the error goes to stderr and the process exits with status 1.
///
/// A second call keeps the first logger and returns it.
pub fn init_logger(config: &LoggerConfig) -> Logger {
    match try_init_logger(config) {
        Ok(logger) => logger,
        Err(Error::AlreadyInitialized) => {
            let existing = logger();
            existing.warn("logger already initialized, keeping the existing one", &[]);
            existing
        }
        Err(e) => {
            eprintln!("duolog: failed to initialize logger: {}", e);
            std::process::exit(1);
        }
    }
}

/// The global logger, or a no-op logger before initialization
pub fn logger() -> Logger {
    GLOBAL.get().unwrap_or(&*NOOP).clone()
}

/// Sugared view of the global logger
pub fn sugar() -> SugaredLogger {
    logger().sugar()
}

pub fn is_initialized() -> bool {
    GLOBAL.get().is_some()
}
