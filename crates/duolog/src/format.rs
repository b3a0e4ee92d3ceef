//! Human-readable record rendering
//!
//! Both presets produce tab-separated lines:
//!
//! ```text
//! 2024-05-01T10:00:00.000+0200  INFO  src/main.rs:12  server started  {"port":8080}
//! ```
//!
//! The development preset also prints the logger name and the full caller
//! path. Timestamps are ISO-8601 in local time, levels are uppercase.

use duolog_core::Mode;
use serde_json::{Map, Number, Value};

use crate::record::{FieldValue, LogRecord};

/// ISO-8601 with milliseconds and numeric offset
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// Renders records to text lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Formatter {
    mode: Mode,
}

impl Formatter {
    pub fn new(mode: Mode) -> Self {
        Self { mode }
    }

    pub fn development() -> Self {
        Self::new(Mode::Development)
    }

    pub fn production() -> Self {
        Self::new(Mode::Production)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Render one record, newline-terminated
    pub fn format(&self, record: &LogRecord) -> String {
        let mut columns = vec![
            record.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            record.level.as_upper().to_string(),
        ];

        if self.mode.is_development() {
            if let Some(name) = &record.name {
                columns.push(name.clone());
            }
        }

        if let Some(caller) = &record.caller {
            columns.push(if self.mode.is_development() {
                caller.full()
            } else {
                caller.short()
            });
        }

        columns.push(record.message.clone());

        if !record.fields.is_empty() {
            columns.push(fields_json(record));
        }

        let mut line = columns.join("\t");
        if let Some(stack) = &record.stacktrace {
            line.push('\n');
            line.push_str(stack.trim_end());
        }
        line.push('\n');
        line
    }
}

fn fields_json(record: &LogRecord) -> String {
    let mut map = Map::new();
    for field in &record.fields {
        let value = match &field.value {
            FieldValue::Str(s) => Value::String(s.clone()),
            FieldValue::I64(v) => Value::from(*v),
            FieldValue::U64(v) => Value::from(*v),
            FieldValue::F64(v) => Number::from_f64(*v)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(v.to_string())),
            FieldValue::Bool(v) => Value::Bool(*v),
        };
        map.insert(field.key.clone(), value);
    }
    Value::Object(map).to_string()
}
