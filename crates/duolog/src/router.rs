//! Level-based fan-out of records to sinks
//!
//! The router holds an explicit list of routes. Each route pairs a minimum
//! level with one sink, and every record is checked against every route, so
//! a record may reach zero, one or several sinks. The default wiring built by
//! [`SinkRouter::with_sinks`] is:
//!
//! | pipeline | accepts           | sink                     |
//! |----------|-------------------|--------------------------|
//! | general  | `>= config.level` | main file                |
//! | general  | `>= config.level` | stdout, if console is on |
//! | error    | `>= Error`        | error file               |
//!
//! Only the general pipeline is duplicated to the console.

use duolog_core::{Error, Level, ResolvedConfig, Result};
use duolog_rotate::RotationConfig;
use std::cell::Cell;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::format::Formatter;
use crate::record::LogRecord;
use crate::sink::{file_sink, Sink, StdoutSink};

thread_local! {
    /// Set while this thread is inside a dispatch
    static DISPATCHING: Cell<bool> = const { Cell::new(false) };
}

struct DispatchGuard;

impl DispatchGuard {
    fn enter() -> Option<Self> {
        if DISPATCHING.with(|d| d.replace(true)) {
            None
        } else {
            Some(DispatchGuard)
        }
    }
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        DISPATCHING.with(|d| d.set(false));
    }
}

/// Which logical stream a route belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipeline {
    General,
    Error,
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pipeline::General => f.write_str("general"),
            Pipeline::Error => f.write_str("error"),
        }
    }
}

/// One (level predicate, destination) pair
#[derive(Clone)]
pub struct Route {
    pub pipeline: Pipeline,
    pub min_level: Level,
    pub sink: Arc<dyn Sink>,
}

impl Route {
    pub fn new(pipeline: Pipeline, min_level: Level, sink: Arc<dyn Sink>) -> Self {
        Self {
            pipeline,
            min_level,
            sink,
        }
    }

    pub fn accepts(&self, level: Level) -> bool {
        level >= self.min_level
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pipeline", &self.pipeline)
            .field("min_level", &self.min_level)
            .field("sink", &self.sink.name())
            .finish()
    }
}

type WriteErrorHook = Box<dyn Fn(&Route, &Error) + Send + Sync>;

/// Static fan-out from records to sinks
pub struct SinkRouter {
    routes: Vec<Route>,
    formatter: Formatter,
    write_errors: AtomicU64,
    on_write_error: Option<WriteErrorHook>,
}

impl SinkRouter {
    /// Router with no routes; every record is dropped
    pub fn new(formatter: Formatter) -> Self {
        Self {
            routes: Vec::new(),
            formatter,
            write_errors: AtomicU64::new(0),
            on_write_error: None,
        }
    }

    /// Open the main and error files named by `config` and wire the default
    /// routes. The log directory must already exist.
    pub fn from_config(config: &ResolvedConfig) -> Result<Self> {
        let rotation = RotationConfig::from_resolved(config);
        let main = file_sink(&config.main_path(), rotation.clone())?;
        let error = file_sink(&config.error_path(), rotation)?;
        let console: Option<Arc<dyn Sink>> = if config.emit_to_console {
            Some(Arc::new(StdoutSink))
        } else {
            None
        };
        Ok(Self::with_sinks(config, main, error, console))
    }

    /// Wire the default routes over caller-supplied sinks
    pub fn with_sinks(
        config: &ResolvedConfig,
        main: Arc<dyn Sink>,
        error: Arc<dyn Sink>,
        console: Option<Arc<dyn Sink>>,
    ) -> Self {
        let mut router = Self::new(Formatter::new(config.mode))
            .route(Route::new(Pipeline::General, config.level, main));
        if let Some(console) = console {
            router = router.route(Route::new(Pipeline::General, config.level, console));
        }
        router.route(Route::new(Pipeline::Error, Level::Error, error))
    }

    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    /// Observe write failures. They are never returned to the logging caller.
    pub fn on_write_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Route, &Error) + Send + Sync + 'static,
    {
        self.on_write_error = Some(Box::new(hook));
        self
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn formatter(&self) -> &Formatter {
        &self.formatter
    }

    /// Lowest level any route accepts
    pub fn min_level(&self) -> Option<Level> {
        self.routes.iter().map(|r| r.min_level).min()
    }

    pub fn enabled(&self, level: Level) -> bool {
        self.routes.iter().any(|r| r.accepts(level))
    }

    /// Number of failed sink writes so far
    pub fn write_errors(&self) -> u64 {
        self.write_errors.load(Ordering::Relaxed)
    }

    /// Failures inside the sinks that no write reported, such as backups
    /// that could not be pruned or compressed
    pub fn maintenance_errors(&self) -> u64 {
        self.routes.iter().map(|r| r.sink.maintenance_errors()).sum()
    }

    /// Render `record` once and write it to every accepting route.
    ///
    /// Records produced while this thread is already dispatching (for
    /// example diagnostics emitted during a rotation) are dropped.
    pub fn dispatch(&self, record: &LogRecord) {
        if !self.enabled(record.level) {
            return;
        }
        let Some(_guard) = DispatchGuard::enter() else {
            return;
        };

        let rendered = self.formatter.format(record);
        for route in self.routes.iter().filter(|r| r.accepts(record.level)) {
            if let Err(e) = route.sink.write_record(rendered.as_bytes()) {
                self.write_errors.fetch_add(1, Ordering::Relaxed);
                if let Some(hook) = &self.on_write_error {
                    hook(route, &e);
                }
            }
        }
    }

    /// Flush every sink, returning the first failure
    pub fn flush(&self) -> Result<()> {
        let mut first_err = None;
        for route in &self.routes {
            if let Err(e) = route.sink.flush() {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for SinkRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkRouter")
            .field("routes", &self.routes)
            .field("formatter", &self.formatter)
            .field("write_errors", &self.write_errors())
            .field("maintenance_errors", &self.maintenance_errors())
            .finish()
    }
}
