//! Logger configuration and resolution
//!
//! A [`LoggerConfig`] is what the hosting application supplies, either built
//! in code or loaded from a file:
//! - TOML (.toml)
//! - YAML (.yaml, .yml)
//! - JSON (.json)
//!
//! [`LoggerConfig::resolve`] merges it with the defaults into a
//! [`ResolvedConfig`], which is frozen for the rest of the process.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::*;
use crate::error::{Error, Result};
use crate::level::{Level, Mode};

/// Paths matching this are treated as absolute on any platform
static ABSOLUTE_PATH_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(/|([a-zA-Z]:\\)).*").expect("Invalid absolute path regex"));

/// Returns true for `/var/log` style and `C:\logs` style paths
pub fn is_absolute_path(path: &str) -> bool {
    ABSOLUTE_PATH_REGEX.is_match(path)
}

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(ConfigFormat::Toml),
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            "json" => Some(ConfigFormat::Json),
            _ => None,
        }
    }

    /// Detect format from file path
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// User-supplied logger settings. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Duplicate the general stream to stdout
    pub emit_to_console: bool,
    /// Development (true) or production (false) preset
    #[serde(alias = "development")]
    pub dev: bool,
    /// One of "debug", "info", "warn", "error"
    pub level: String,
    /// Directory holding both log files
    pub directory: String,
    pub main_filename: String,
    pub error_filename: String,
    /// Size limit of the active file, in megabytes
    pub max_size_mb: i64,
    /// Number of rotated backups to keep
    pub max_backups: i64,
    /// Days a rotated backup is kept
    pub max_age_days: i64,
    /// Gzip rotated backups
    pub compress: bool,
    /// Directory a relative `directory` is resolved against when it does not
    /// exist yet. Defaults to the working directory.
    pub anchor_dir: Option<PathBuf>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            emit_to_console: true,
            dev: false,
            level: DEFAULT_LEVEL.to_string(),
            directory: DEFAULT_LOG_DIR.to_string(),
            main_filename: DEFAULT_MAIN_FILENAME.to_string(),
            error_filename: DEFAULT_ERROR_FILENAME.to_string(),
            max_size_mb: DEFAULT_MAX_SIZE_MB,
            max_backups: DEFAULT_MAX_BACKUPS,
            max_age_days: DEFAULT_MAX_AGE_DAYS,
            compress: false,
            anchor_dir: None,
        }
    }
}

/// Keep `value` only when `0 < value < bound`
fn within_bound(value: i64, bound: i64, default: i64) -> i64 {
    if value > 0 && value < bound {
        value
    } else {
        default
    }
}

fn non_empty_or(value: &str, default: &str) -> String {
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

impl LoggerConfig {
    /// Load config from file, automatically detecting format from extension
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }

        let format = ConfigFormat::from_path(path).ok_or_else(|| {
            Error::ConfigError(format!(
                "Unsupported config file extension: {}. Expected .toml, .yaml, .yml, or .json",
                path.display()
            ))
        })?;

        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, format)
    }

    /// Parse config content with specified format
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        let config = match format {
            ConfigFormat::Toml => toml::from_str(content)?,
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Json => serde_json::from_str(content)?,
        };
        Ok(config)
    }

    /// Resolve against the built-in defaults
    pub fn resolve(&self) -> ResolvedConfig {
        self.resolve_against(&LoggerConfig::default())
    }

    /// Merge these settings over `defaults`.
    ///
    /// Flags and the level always come from `self`. Numeric limits are taken
    /// only when strictly inside `(0, bound)`, otherwise the default stays.
    /// The directory is taken unless it is empty or `"./"`.
    pub fn resolve_against(&self, defaults: &LoggerConfig) -> ResolvedConfig {
        let directory = if self.directory.is_empty() || self.directory == CURRENT_DIR_MARKER {
            defaults.directory.clone()
        } else {
            self.directory.clone()
        };

        let max_size_mb = within_bound(self.max_size_mb, MAX_SIZE_MB_BOUND, defaults.max_size_mb);
        let max_backups = within_bound(self.max_backups, MAX_BACKUPS_BOUND, defaults.max_backups);
        let max_age_days =
            within_bound(self.max_age_days, MAX_AGE_DAYS_BOUND, defaults.max_age_days);

        ResolvedConfig {
            emit_to_console: self.emit_to_console,
            mode: Mode::from_dev_flag(self.dev),
            level: Level::parse_or_info(&self.level),
            directory: PathBuf::from(directory),
            main_filename: non_empty_or(&self.main_filename, &defaults.main_filename),
            error_filename: non_empty_or(&self.error_filename, &defaults.error_filename),
            max_size_mb: max_size_mb.max(1) as u64,
            max_backups: max_backups.max(1) as usize,
            max_age_days: max_age_days.max(1) as u64,
            compress: self.compress,
            anchor_dir: self.anchor_dir.clone().or_else(|| defaults.anchor_dir.clone()),
        }
    }
}

/// Effective configuration, fixed once the logger is built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub emit_to_console: bool,
    pub mode: Mode,
    pub level: Level,
    pub directory: PathBuf,
    pub main_filename: String,
    pub error_filename: String,
    pub max_size_mb: u64,
    pub max_backups: usize,
    pub max_age_days: u64,
    pub compress: bool,
    pub anchor_dir: Option<PathBuf>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        LoggerConfig::default().resolve()
    }
}

impl ResolvedConfig {
    /// Path of the general log file
    pub fn main_path(&self) -> PathBuf {
        self.directory.join(&self.main_filename)
    }

    /// Path of the error-only log file
    pub fn error_path(&self) -> PathBuf {
        self.directory.join(&self.error_filename)
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_mb * MEGABYTE
    }

    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_days * SECS_PER_DAY)
    }

    /// Make sure the log directory exists, rewriting `directory` to the path
    /// actually created
    pub fn ensure_log_dir(&mut self) -> Result<()> {
        let anchor = match &self.anchor_dir {
            Some(anchor) => anchor.clone(),
            None => std::env::current_dir()?,
        };
        self.directory = create_log_dir(&self.directory, &anchor)?;
        Ok(())
    }
}

/// Create the log directory recursively.
///
/// A directory that does not exist yet and is not absolute is placed under
/// `anchor`. Returns the directory that was used.
pub fn create_log_dir(dir: &Path, anchor: &Path) -> Result<PathBuf> {
    let mut target = dir.to_path_buf();
    if !target.exists() && !is_absolute_path(&dir.to_string_lossy()) {
        target = anchor.join(dir);
    }

    std::fs::create_dir_all(&target).map_err(|source| Error::CreateLogDir {
        path: target.clone(),
        source,
    })?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn user(max_size_mb: i64, max_backups: i64, max_age_days: i64) -> LoggerConfig {
        LoggerConfig {
            max_size_mb,
            max_backups,
            max_age_days,
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let resolved = LoggerConfig::default().resolve();
        assert!(resolved.emit_to_console);
        assert_eq!(resolved.mode, Mode::Production);
        assert_eq!(resolved.level, Level::Info);
        assert_eq!(resolved.directory, PathBuf::from("./logs"));
        assert_eq!(resolved.main_filename, "info.log");
        assert_eq!(resolved.error_filename, "err.log");
        assert_eq!(resolved.max_size_mb, 10);
        assert_eq!(resolved.max_backups, 5);
        assert_eq!(resolved.max_age_days, 30);
        assert!(!resolved.compress);
    }

    #[test]
    fn test_numeric_overrides_inside_bounds() {
        let resolved = user(1, 9, 59).resolve();
        assert_eq!(resolved.max_size_mb, 1);
        assert_eq!(resolved.max_backups, 9);
        assert_eq!(resolved.max_age_days, 59);
    }

    #[test]
    fn test_numeric_overrides_outside_bounds_keep_default() {
        for (size, backups, age) in [(0, 0, 0), (-3, -1, -7), (500, 10, 60), (9000, 11, 365)] {
            let resolved = user(size, backups, age).resolve();
            assert_eq!(resolved.max_size_mb, 10);
            assert_eq!(resolved.max_backups, 5);
            assert_eq!(resolved.max_age_days, 30);
        }
    }

    #[test]
    fn test_numeric_bound_is_exclusive() {
        for v in -2..=12 {
            let resolved = user(5, v, 5).resolve();
            let expected = if v > 0 && v < 10 { v as usize } else { 5 };
            assert_eq!(resolved.max_backups, expected, "max_backups={v}");
        }
    }

    #[test]
    fn test_flags_and_level_always_overridden() {
        let config = LoggerConfig {
            emit_to_console: false,
            dev: true,
            level: "debug".to_string(),
            ..Default::default()
        };
        let resolved = config.resolve();
        assert!(!resolved.emit_to_console);
        assert_eq!(resolved.mode, Mode::Development);
        assert_eq!(resolved.level, Level::Debug);
    }

    #[test]
    fn test_unknown_level_resolves_to_info() {
        let config = LoggerConfig {
            level: "loud".to_string(),
            ..Default::default()
        };
        assert_eq!(config.resolve().level, Level::Info);
    }

    #[test]
    fn test_directory_override_rules() {
        for dir in ["", "./"] {
            let config = LoggerConfig {
                directory: dir.to_string(),
                ..Default::default()
            };
            assert_eq!(config.resolve().directory, PathBuf::from("./logs"));
        }

        let config = LoggerConfig {
            directory: "/var/log/app".to_string(),
            ..Default::default()
        };
        assert_eq!(config.resolve().directory, PathBuf::from("/var/log/app"));
    }

    #[test]
    fn test_empty_filenames_keep_default() {
        let config = LoggerConfig {
            main_filename: String::new(),
            error_filename: "errors.log".to_string(),
            ..Default::default()
        };
        let resolved = config.resolve();
        assert_eq!(resolved.main_filename, "info.log");
        assert_eq!(resolved.error_filename, "errors.log");
    }

    #[test]
    fn test_is_absolute_path() {
        assert!(is_absolute_path("/var/log"));
        assert!(is_absolute_path("C:\\logs"));
        assert!(is_absolute_path("d:\\"));
        assert!(!is_absolute_path("logs"));
        assert!(!is_absolute_path("./logs"));
        assert!(!is_absolute_path("relative/path"));
    }

    #[test]
    fn test_create_relative_dir_under_anchor() {
        let anchor = TempDir::new().unwrap();
        let created = create_log_dir(Path::new("relative/path"), anchor.path()).unwrap();
        assert_eq!(created, anchor.path().join("relative/path"));
        assert!(created.is_dir());
    }

    #[test]
    fn test_create_absolute_dir_ignores_anchor() {
        let root = TempDir::new().unwrap();
        let anchor = TempDir::new().unwrap();
        let target = root.path().join("a/b/c");
        let created = create_log_dir(&target, anchor.path()).unwrap();
        assert_eq!(created, target);
        assert!(target.is_dir());
    }

    #[test]
    fn test_create_dir_failure() {
        let root = TempDir::new().unwrap();
        let blocker = root.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();

        let err = create_log_dir(&blocker.join("sub"), root.path()).unwrap_err();
        assert!(matches!(err, Error::CreateLogDir { .. }));
    }

    #[test]
    fn test_ensure_log_dir_rewrites_directory() {
        let anchor = TempDir::new().unwrap();
        let mut resolved = LoggerConfig {
            directory: "nested/logs".to_string(),
            anchor_dir: Some(anchor.path().to_path_buf()),
            ..Default::default()
        }
        .resolve();

        resolved.ensure_log_dir().unwrap();
        assert_eq!(resolved.directory, anchor.path().join("nested/logs"));
        assert_eq!(resolved.main_path(), anchor.path().join("nested/logs/info.log"));
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml = r#"
level = "warn"
max_size_mb = 1
emit_to_console = false
"#;
        let config = LoggerConfig::parse(toml, ConfigFormat::Toml).unwrap();
        assert_eq!(config.level, "warn");
        assert_eq!(config.max_size_mb, 1);
        assert!(!config.emit_to_console);
        assert_eq!(config.main_filename, "info.log");
    }

    #[test]
    fn test_parse_yaml_and_json() {
        let yaml = "dev: true\ncompress: true\nmax_backups: 3\n";
        let config = LoggerConfig::parse(yaml, ConfigFormat::Yaml).unwrap();
        assert!(config.dev);
        assert!(config.compress);
        assert_eq!(config.max_backups, 3);

        let json = r#"{"directory": "/tmp/app-logs", "development": true}"#;
        let config = LoggerConfig::parse(json, ConfigFormat::Json).unwrap();
        assert_eq!(config.directory, "/tmp/app-logs");
        assert!(config.dev);
    }

    #[test]
    fn test_load_detects_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logging.toml");
        std::fs::write(&path, "level = \"error\"\n").unwrap();
        assert_eq!(LoggerConfig::load(&path).unwrap().level, "error");

        let bad = dir.path().join("logging.ini");
        std::fs::write(&bad, "level=error").unwrap();
        assert!(matches!(
            LoggerConfig::load(&bad).unwrap_err(),
            Error::ConfigError(_)
        ));

        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            LoggerConfig::load(&missing).unwrap_err(),
            Error::ConfigNotFound(_)
        ));
    }

    #[test]
    fn test_config_format_detection() {
        assert_eq!(ConfigFormat::from_extension("TOML"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("yml"), Some(ConfigFormat::Yaml));
        assert_eq!(
            ConfigFormat::from_path(Path::new("a/b.json")),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_size_and_age_units() {
        let resolved = user(2, 3, 4).resolve();
        assert_eq!(resolved.max_size_bytes(), 2 * 1024 * 1024);
        assert_eq!(resolved.max_age(), Duration::from_secs(4 * 86_400));
    }
}
