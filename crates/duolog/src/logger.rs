//! Leveled logging facade

use duolog_core::{Level, LoggerConfig, Result};
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use crate::format::Formatter;
use crate::record::{Caller, Field, FieldValue, LogRecord};
use crate::router::SinkRouter;

/// Key used for a sugared key with no value
pub const BAD_KEY: &str = "!BADKEY";

/// Cheap-to-clone logging handle.
///
/// Every record gets the call site of the logging call and, at error level,
/// a stack trace. Child loggers made with [`Logger::named`] and
/// [`Logger::with`] share the same sinks.
#[derive(Clone, Debug)]
pub struct Logger {
    router: Arc<SinkRouter>,
    name: Option<String>,
    context: Vec<Field>,
}

impl Logger {
    pub fn new(router: SinkRouter) -> Self {
        Self {
            router: Arc::new(router),
            name: None,
            context: Vec::new(),
        }
    }

    /// Logger that discards everything
    pub fn noop() -> Self {
        Self::new(SinkRouter::new(Formatter::default()))
    }

    /// Resolve `config`, create the log directory and open both files.
    /// Nothing global is touched.
    pub fn from_config(config: &LoggerConfig) -> Result<Self> {
        let mut resolved = config.resolve();
        resolved.ensure_log_dir()?;
        Ok(Self::new(SinkRouter::from_config(&resolved)?))
    }

    /// Child logger with a name shown in development output
    pub fn named(&self, name: impl Into<String>) -> Self {
        let name = name.into();
        let name = match &self.name {
            Some(parent) => format!("{}.{}", parent, name),
            None => name,
        };
        Self {
            name: Some(name),
            ..self.clone()
        }
    }

    /// Child logger that adds `fields` to every record
    pub fn with(&self, fields: impl IntoIterator<Item = Field>) -> Self {
        let mut child = self.clone();
        child.context.extend(fields);
        child
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn router(&self) -> &SinkRouter {
        &self.router
    }

    pub fn enabled(&self, level: Level) -> bool {
        self.router.enabled(level)
    }

    #[track_caller]
    pub fn log(&self, level: Level, msg: impl Into<String>, fields: &[Field]) {
        if !self.enabled(level) {
            return;
        }
        let caller = Caller::from_location(Location::caller());
        let mut all = self.context.clone();
        all.extend_from_slice(fields);

        let record = LogRecord::new(level, msg)
            .with_name(self.name.clone())
            .with_caller(caller)
            .with_fields(all)
            .capture_stacktrace();
        self.router.dispatch(&record);
    }

    #[track_caller]
    pub fn debug(&self, msg: impl Into<String>, fields: &[Field]) {
        self.log(Level::Debug, msg, fields);
    }

    #[track_caller]
    pub fn info(&self, msg: impl Into<String>, fields: &[Field]) {
        self.log(Level::Info, msg, fields);
    }

    #[track_caller]
    pub fn warn(&self, msg: impl Into<String>, fields: &[Field]) {
        self.log(Level::Warn, msg, fields);
    }

    #[track_caller]
    pub fn error(&self, msg: impl Into<String>, fields: &[Field]) {
        self.log(Level::Error, msg, fields);
    }

    /// Hand a prebuilt record to the sinks, adding this logger's context
    pub fn emit(&self, mut record: LogRecord) {
        if !self.context.is_empty() {
            let mut fields = self.context.clone();
            fields.append(&mut record.fields);
            record.fields = fields;
        }
        self.router.dispatch(&record);
    }

    /// Flush every sink
    pub fn flush(&self) -> Result<()> {
        self.router.flush()
    }

    pub fn sugar(&self) -> SugaredLogger {
        SugaredLogger {
            logger: self.clone(),
        }
    }
}

/// Loosely typed variant of [`Logger`].
///
/// The `*f` methods take `format_args!`; the `*w` methods take a message
/// followed by alternating keys and values.
#[derive(Clone, Debug)]
pub struct SugaredLogger {
    logger: Logger,
}

impl SugaredLogger {
    pub fn desugar(&self) -> Logger {
        self.logger.clone()
    }

    #[track_caller]
    pub fn logf(&self, level: Level, args: fmt::Arguments<'_>) {
        if self.logger.enabled(level) {
            self.logger.log(level, args.to_string(), &[]);
        }
    }

    #[track_caller]
    pub fn logw(&self, level: Level, msg: &str, keys_and_values: &[&dyn fmt::Display]) {
        if self.logger.enabled(level) {
            self.logger.log(level, msg, &sweeten(keys_and_values));
        }
    }

    #[track_caller]
    pub fn debugf(&self, args: fmt::Arguments<'_>) {
        self.logf(Level::Debug, args);
    }

    #[track_caller]
    pub fn infof(&self, args: fmt::Arguments<'_>) {
        self.logf(Level::Info, args);
    }

    #[track_caller]
    pub fn warnf(&self, args: fmt::Arguments<'_>) {
        self.logf(Level::Warn, args);
    }

    #[track_caller]
    pub fn errorf(&self, args: fmt::Arguments<'_>) {
        self.logf(Level::Error, args);
    }

    #[track_caller]
    pub fn debugw(&self, msg: &str, keys_and_values: &[&dyn fmt::Display]) {
        self.logw(Level::Debug, msg, keys_and_values);
    }

    #[track_caller]
    pub fn infow(&self, msg: &str, keys_and_values: &[&dyn fmt::Display]) {
        self.logw(Level::Info, msg, keys_and_values);
    }

    #[track_caller]
    pub fn warnw(&self, msg: &str, keys_and_values: &[&dyn fmt::Display]) {
        self.logw(Level::Warn, msg, keys_and_values);
    }

    #[track_caller]
    pub fn errorw(&self, msg: &str, keys_and_values: &[&dyn fmt::Display]) {
        self.logw(Level::Error, msg, keys_and_values);
    }
}

/// Pair up alternating keys and values; a trailing key becomes a `!BADKEY` value
fn sweeten(keys_and_values: &[&dyn fmt::Display]) -> Vec<Field> {
    let mut fields = Vec::with_capacity(keys_and_values.len() / 2 + 1);
    let mut iter = keys_and_values.iter();
    while let Some(key) = iter.next() {
        match iter.next() {
            Some(value) => fields.push(Field::new(
                key.to_string(),
                FieldValue::Str(value.to_string()),
            )),
            None => fields.push(Field::new(BAD_KEY, FieldValue::Str(key.to_string()))),
        }
    }
    fields
}
