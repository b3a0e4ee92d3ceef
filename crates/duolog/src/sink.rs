//! Output destinations
//!
//! Every sink serializes its own writes, so a rendered record always lands
//! in one piece even with many threads logging at once.

use duolog_core::Result;
use duolog_rotate::{RotatingFile, RotationConfig};
use parking_lot::Mutex;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A destination for rendered records
pub trait Sink: Send + Sync {
    /// Short name used in diagnostics
    fn name(&self) -> &str;

    /// Write one complete rendered record
    fn write_record(&self, record: &[u8]) -> Result<()>;

    fn flush(&self) -> Result<()>;

    /// Background failures that never reached a caller, such as a backup
    /// that could not be removed during rotation
    fn maintenance_errors(&self) -> u64 {
        0
    }
}

/// Rotating log file
pub struct FileSink {
    name: String,
    file: Mutex<RotatingFile>,
}

impl FileSink {
    pub fn open(path: PathBuf, config: RotationConfig) -> Result<Self> {
        let name = path.display().to_string();
        Ok(Self {
            name,
            file: Mutex::new(RotatingFile::open(path, config)?),
        })
    }

    pub fn path(&self) -> PathBuf {
        self.file.lock().path().to_path_buf()
    }
}

impl Sink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write_record(&self, record: &[u8]) -> Result<()> {
        self.file.lock().write_record(record)
    }

    fn flush(&self) -> Result<()> {
        self.file.lock().flush()
    }

    fn maintenance_errors(&self) -> u64 {
        self.file.lock().maintenance_errors()
    }
}

/// Process standard output
#[derive(Debug, Default)]
pub struct StdoutSink;

impl Sink for StdoutSink {
    fn name(&self) -> &str {
        "stdout"
    }

    fn write_record(&self, record: &[u8]) -> Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(record)?;
        out.flush()?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        io::stdout().lock().flush()?;
        Ok(())
    }
}

/// In-memory sink; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    name: String,
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            buffer: Arc::default(),
        }
    }

    /// Everything written so far
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.lock().is_empty()
    }

    pub fn clear(&self) {
        self.buffer.lock().clear();
    }
}

impl Sink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write_record(&self, record: &[u8]) -> Result<()> {
        self.buffer.lock().extend_from_slice(record);
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Open a rotating file sink as a shared handle
pub fn file_sink(path: &Path, config: RotationConfig) -> Result<Arc<dyn Sink>> {
    Ok(Arc::new(FileSink::open(path.to_path_buf(), config)?))
}
