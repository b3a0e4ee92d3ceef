//! Log rotation configuration

use duolog_core::{constants, ResolvedConfig};
use std::time::Duration;

/// Log rotation configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationConfig {
    /// Maximum active file size in bytes
    pub max_size_bytes: u64,
    /// Maximum number of rotated files to keep
    pub max_backups: usize,
    /// Rotated files older than this are removed regardless of count
    pub max_age: Option<Duration>,
    /// Gzip rotated files
    pub compress: bool,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: constants::DEFAULT_MAX_SIZE_MB as u64 * constants::MEGABYTE,
            max_backups: constants::DEFAULT_MAX_BACKUPS as usize,
            max_age: Some(Duration::from_secs(
                constants::DEFAULT_MAX_AGE_DAYS as u64 * constants::SECS_PER_DAY,
            )),
            compress: false,
        }
    }
}

impl RotationConfig {
    pub fn new(max_size_bytes: u64, max_backups: usize) -> Self {
        Self {
            max_size_bytes,
            max_backups,
            max_age: None,
            compress: false,
        }
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Limits shared by the main and error streams
    pub fn from_resolved(config: &ResolvedConfig) -> Self {
        Self {
            max_size_bytes: config.max_size_bytes(),
            max_backups: config.max_backups,
            max_age: Some(config.max_age()),
            compress: config.compress,
        }
    }
}
