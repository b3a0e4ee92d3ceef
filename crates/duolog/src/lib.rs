//! duolog - Structured logging to a rotating main file, a rotating error
//! file and, optionally, stdout
//!
//! ```no_run
//! use duolog::{field, LoggerConfig};
//!
//! let log = duolog::init_logger(&LoggerConfig {
//!     level: "debug".to_string(),
//!     ..Default::default()
//! });
//! log.info("server started", &[field("port", 8080)]);
//! tracing::warn!(retries = 3, "upstream slow");
//! duolog::sugar().errorw("request failed", &[&"status", &502]);
//! ```

mod format;
mod global;
mod layer;
mod logger;
mod record;
mod router;
mod sink;

pub use format::{Formatter, TIMESTAMP_FORMAT};
pub use global::{init_logger, is_initialized, logger, sugar, try_init_logger, try_init_with};
pub use layer::DuologLayer;
pub use logger::{Logger, SugaredLogger, BAD_KEY};
pub use record::{field, Caller, Field, FieldValue, LogRecord};
pub use router::{Pipeline, Route, SinkRouter};
pub use sink::{file_sink, FileSink, MemorySink, Sink, StdoutSink};

pub use duolog_core::{Error, Level, LoggerConfig, Mode, ResolvedConfig, Result};
pub use duolog_rotate::{RotatingFile, RotationConfig};
