//! Log records and structured fields

use chrono::{DateTime, Local};
use duolog_core::Level;
use std::fmt;
use std::panic::Location;
use std::path::{Component, Path};

/// A typed field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    I64(i64),
    U64(u64),
    F64(f64),
    Bool(bool),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Str(s) => f.write_str(s),
            FieldValue::I64(v) => write!(f, "{}", v),
            FieldValue::U64(v) => write!(f, "{}", v),
            FieldValue::F64(v) => write!(f, "{}", v),
            FieldValue::Bool(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Str(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Str(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::F64(v)
    }
}

macro_rules! signed_field_value {
    ($($t:ty),*) => {
        $(impl From<$t> for FieldValue {
            fn from(v: $t) -> Self {
                FieldValue::I64(v as i64)
            }
        })*
    };
}

macro_rules! unsigned_field_value {
    ($($t:ty),*) => {
        $(impl From<$t> for FieldValue {
            fn from(v: $t) -> Self {
                FieldValue::U64(v as u64)
            }
        })*
    };
}

signed_field_value!(i8, i16, i32, i64, isize);
unsigned_field_value!(u8, u16, u32, u64, usize);

/// A key-value pair attached to a record
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: String,
    pub value: FieldValue,
}

impl Field {
    pub fn new(key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Shorthand for [`Field::new`]
pub fn field(key: impl Into<String>, value: impl Into<FieldValue>) -> Field {
    Field::new(key, value)
}

/// Source location that emitted a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub file: &'static str,
    pub line: u32,
}

impl Caller {
    pub fn from_location(location: &'static Location<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
        }
    }

    /// `file:line` with the full path as compiled
    pub fn full(&self) -> String {
        format!("{}:{}", self.file, self.line)
    }

    /// `dir/file:line`, keeping only the last directory
    pub fn short(&self) -> String {
        let parts: Vec<&str> = Path::new(self.file)
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => part.to_str(),
                _ => None,
            })
            .collect();
        let start = parts.len().saturating_sub(2);
        format!("{}:{}", parts[start..].join("/"), self.line)
    }
}

/// One emitted log entry
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp: DateTime<Local>,
    pub level: Level,
    /// Logger name, or the `tracing` target for bridged events
    pub name: Option<String>,
    pub caller: Option<Caller>,
    pub message: String,
    pub fields: Vec<Field>,
    pub stacktrace: Option<String>,
}

impl LogRecord {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            level,
            name: None,
            caller: None,
            message: message.into(),
            fields: Vec::new(),
            stacktrace: None,
        }
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    pub fn with_caller(mut self, caller: Caller) -> Self {
        self.caller = Some(caller);
        self
    }

    pub fn with_fields(mut self, fields: Vec<Field>) -> Self {
        self.fields = fields;
        self
    }

    /// Attach a stack trace when the level calls for one
    pub fn capture_stacktrace(mut self) -> Self {
        if self.level >= Level::Error {
            self.stacktrace = Some(std::backtrace::Backtrace::force_capture().to_string());
        }
        self
    }

    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().rev().find(|f| f.key == key).map(|f| &f.value)
    }
}
