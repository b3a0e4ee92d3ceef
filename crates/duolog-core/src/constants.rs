//! Constants and default values for duolog

/// Default log directory
pub const DEFAULT_LOG_DIR: &str = "./logs";

/// Directory marker that never overrides the default directory
pub const CURRENT_DIR_MARKER: &str = "./";

/// Default main log file name
pub const DEFAULT_MAIN_FILENAME: &str = "info.log";

/// Default error log file name
pub const DEFAULT_ERROR_FILENAME: &str = "err.log";

/// Default level name
pub const DEFAULT_LEVEL: &str = "info";

/// Default max size of the active file in megabytes
pub const DEFAULT_MAX_SIZE_MB: i64 = 10;

/// Default number of backups to keep
pub const DEFAULT_MAX_BACKUPS: i64 = 5;

/// Default backup retention in days
pub const DEFAULT_MAX_AGE_DAYS: i64 = 30;

/// Exclusive upper bound for `max_size_mb`
pub const MAX_SIZE_MB_BOUND: i64 = 500;

/// Exclusive upper bound for `max_backups`
pub const MAX_BACKUPS_BOUND: i64 = 10;

/// Exclusive upper bound for `max_age_days`
pub const MAX_AGE_DAYS_BOUND: i64 = 60;

/// Bytes in a megabyte
pub const MEGABYTE: u64 = 1024 * 1024;

/// Seconds in a day
pub const SECS_PER_DAY: u64 = 24 * 60 * 60;
