//! Bridge from `tracing` events into a [`Logger`]

use duolog_core::Level;
use std::fmt;
use tracing::field::{Field as TracingField, Visit};
use tracing::metadata::LevelFilter;
use tracing::{Event, Metadata, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::logger::Logger;
use crate::record::{Caller, Field, FieldValue, LogRecord};

/// A `tracing_subscriber` layer that writes events through a [`Logger`].
///
/// The event target becomes the record name and the event's `file:line`
/// becomes its caller.
#[derive(Debug, Clone)]
pub struct DuologLayer {
    logger: Logger,
}

impl DuologLayer {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    fn accepts(&self, metadata: &Metadata<'_>) -> bool {
        Level::from_tracing(metadata.level()).is_some_and(|level| self.logger.enabled(level))
    }
}

impl<S: Subscriber> Layer<S> for DuologLayer {
    fn enabled(&self, metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        self.accepts(metadata)
    }

    fn max_level_hint(&self) -> Option<LevelFilter> {
        let filter = match self.logger.router().min_level() {
            Some(Level::Debug) => LevelFilter::DEBUG,
            Some(Level::Info) => LevelFilter::INFO,
            Some(Level::Warn) => LevelFilter::WARN,
            Some(Level::Error) => LevelFilter::ERROR,
            None => LevelFilter::OFF,
        };
        Some(filter)
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let Some(level) = Level::from_tracing(metadata.level()) else {
            return;
        };
        if !self.logger.enabled(level) {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let mut record = LogRecord::new(level, visitor.message)
            .with_name(Some(metadata.target().to_string()))
            .with_fields(visitor.fields);
        if let (Some(file), Some(line)) = (metadata.file(), metadata.line()) {
            record = record.with_caller(Caller { file, line });
        }
        self.logger.emit(record.capture_stacktrace());
    }
}

/// Splits an event into its message and typed fields
#[derive(Default)]
struct EventVisitor {
    message: String,
    fields: Vec<Field>,
}

impl EventVisitor {
    fn push(&mut self, field: &TracingField, value: FieldValue) {
        // Fields forwarded by the `log` compatibility shim
        if field.name().starts_with("log.") {
            return;
        }
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(Field::new(field.name(), value));
        }
    }
}

impl Visit for EventVisitor {
    fn record_f64(&mut self, field: &TracingField, value: f64) {
        self.push(field, FieldValue::F64(value));
    }

    fn record_i64(&mut self, field: &TracingField, value: i64) {
        self.push(field, FieldValue::I64(value));
    }

    fn record_u64(&mut self, field: &TracingField, value: u64) {
        self.push(field, FieldValue::U64(value));
    }

    fn record_bool(&mut self, field: &TracingField, value: bool) {
        self.push(field, FieldValue::Bool(value));
    }

    fn record_str(&mut self, field: &TracingField, value: &str) {
        self.push(field, FieldValue::Str(value.to_string()));
    }

    fn record_error(&mut self, field: &TracingField, value: &(dyn std::error::Error + 'static)) {
        self.push(field, FieldValue::Str(value.to_string()));
    }

    fn record_debug(&mut self, field: &TracingField, value: &dyn fmt::Debug) {
        self.push(field, FieldValue::Str(format!("{:?}", value)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::SinkRouter;
    use crate::sink::{MemorySink, Sink};
    use duolog_core::LoggerConfig;
    use std::sync::Arc;
    use tracing_subscriber::layer::SubscriberExt;

    fn layered(level: &str) -> (tracing::Dispatch, MemorySink, MemorySink) {
        let config = LoggerConfig {
            level: level.to_string(),
            ..Default::default()
        }
        .resolve();
        let main = MemorySink::new("main");
        let error = MemorySink::new("error");
        let router = SinkRouter::with_sinks(
            &config,
            Arc::new(main.clone()) as Arc<dyn Sink>,
            Arc::new(error.clone()),
            None,
        );
        let subscriber =
            tracing_subscriber::registry().with(DuologLayer::new(Logger::new(router)));
        (tracing::Dispatch::new(subscriber), main, error)
    }

    #[test]
    fn test_tracing_event_routed() {
        let (dispatch, main, error) = layered("info");
        tracing::dispatcher::with_default(&dispatch, || {
            tracing::info!(port = 8080, tls = false, "server started");
            tracing::debug!("filtered out");
            tracing::error!(reason = "disk", "write failed");
        });

        let lines = main.lines();
        assert!(lines[0].contains("\tINFO\t"));
        assert!(lines[0].contains("server started"));
        assert!(lines[0].contains(r#""port":8080"#));
        assert!(lines[0].contains(r#""tls":false"#));
        assert!(!main.contents().contains("filtered out"));

        let errors = error.contents();
        assert!(errors.contains("write failed"));
        assert!(errors.contains(r#""reason":"disk""#));
    }

    #[test]
    fn test_tracing_caller_is_event_site() {
        let (dispatch, main, _) = layered("info");
        tracing::dispatcher::with_default(&dispatch, || {
            tracing::warn!("from here");
        });
        assert!(main.contents().contains("layer.rs:"));
    }

    #[test]
    fn test_trace_level_never_emitted() {
        let (dispatch, main, _) = layered("debug");
        tracing::dispatcher::with_default(&dispatch, || {
            tracing::trace!("too fine");
        });
        assert!(main.is_empty());
    }

    #[test]
    fn test_debug_formatted_values() {
        let (dispatch, main, _) = layered("info");
        tracing::dispatcher::with_default(&dispatch, || {
            let items = vec![1, 2];
            tracing::info!(?items, "batch");
        });
        assert!(main.contents().contains(r#""items":"[1, 2]""#));
    }
}
