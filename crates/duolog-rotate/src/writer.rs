//! Rotating file writer

use chrono::{DateTime, Duration, DurationRound, Utc};
use duolog_core::{Error, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::backup::{backup_path, list_backups, prune_backups};
use crate::rotation::RotationConfig;

/// Append-only log file that rotates itself by size
pub struct RotatingFile {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    config: RotationConfig,
    current_size: u64,
    /// Timestamp of the newest backup, keeps backup names unique
    last_backup: Option<DateTime<Utc>>,
    /// Failed removals and compressions during retention
    maintenance_errors: u64,
}

impl RotatingFile {
    /// Open `path` for appending, creating parent directories as needed
    pub fn open(path: PathBuf, config: RotationConfig) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = open_append(&path)?;
        let current_size = file.metadata()?.len();
        let last_backup = list_backups(&path)?.first().map(|b| b.timestamp);

        let mut rotating = Self {
            path,
            writer: Some(BufWriter::new(file)),
            config,
            current_size,
            last_backup,
            maintenance_errors: 0,
        };
        rotating.apply_retention();
        Ok(rotating)
    }

    /// Write one complete record, rotating first if it would overflow the
    /// size limit. A record larger than the limit is written to a fresh file.
    pub fn write_record(&mut self, record: &[u8]) -> Result<()> {
        let len = record.len() as u64;
        if self.current_size > 0 && self.current_size + len > self.config.max_size_bytes {
            self.rotate()?;
        }

        if self.writer.is_none() {
            self.reopen()?;
        }
        if let Some(writer) = self.writer.as_mut() {
            writer.write_all(record)?;
            writer.flush()?;
        }
        self.current_size += len;

        Ok(())
    }

    /// Move the active file to a backup and start a fresh one
    pub fn rotate(&mut self) -> Result<()> {
        debug!("Rotating log file: {}", self.path.display());

        // Flush and close current file
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }

        let timestamp = self.next_backup_timestamp();
        if self.path.exists() {
            fs::rename(&self.path, backup_path(&self.path, timestamp))?;
            self.last_backup = Some(timestamp);
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|source| Error::OpenLogFile {
                path: self.path.clone(),
                source,
            })?;
        self.writer = Some(BufWriter::new(file));
        self.current_size = 0;

        self.apply_retention();
        Ok(())
    }

    /// Flush buffered bytes to the OS
    pub fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    /// Get the log file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get current file size
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    pub fn config(&self) -> &RotationConfig {
        &self.config
    }

    /// Number of backups that could not be removed or compressed so far
    pub fn maintenance_errors(&self) -> u64 {
        self.maintenance_errors
    }

    /// Recover after a failed rotation left no active file
    fn reopen(&mut self) -> Result<()> {
        let file = open_append(&self.path)?;
        self.current_size = file.metadata()?.len();
        self.writer = Some(BufWriter::new(file));
        Ok(())
    }

    /// Strictly increasing at the millisecond precision of backup names, so
    /// two rotations in one millisecond get distinct names
    fn next_backup_timestamp(&self) -> DateTime<Utc> {
        let now = Utc::now();
        let now = now.duration_trunc(Duration::milliseconds(1)).unwrap_or(now);
        match self.last_backup {
            Some(last) if now <= last => last + Duration::milliseconds(1),
            _ => now,
        }
    }

    fn apply_retention(&mut self) {
        match prune_backups(&self.path, &self.config, Utc::now()) {
            Ok(pruned) => self.maintenance_errors += pruned.failures as u64,
            Err(e) => {
                self.maintenance_errors += 1;
                warn!("Failed to prune backups of {}: {}", self.path.display(), e);
            }
        }
    }
}

fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| Error::OpenLogFile {
            path: path.to_path_buf(),
            source,
        })
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_record(buf).map_err(io::Error::other)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        RotatingFile::flush(self).map_err(io::Error::other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::BackupFile;
    use std::time::Duration as StdDuration;
    use tempfile::TempDir;

    fn line(i: usize) -> Vec<u8> {
        format!("Line {:03} with some content\n", i).into_bytes()
    }

    #[test]
    fn test_open_creates_file_and_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/dir/test.log");

        let file = RotatingFile::open(path.clone(), RotationConfig::default()).unwrap();
        assert!(path.exists());
        assert_eq!(file.current_size(), 0);
    }

    #[test]
    fn test_write_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.log");

        let mut file = RotatingFile::open(path.clone(), RotationConfig::default()).unwrap();
        file.write_record(b"Hello, world!\n").unwrap();
        file.write_record(b"Again\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "Hello, world!\nAgain\n");
        assert_eq!(file.current_size(), 20);
    }

    #[test]
    fn test_reopen_counts_existing_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.log");
        fs::write(&path, b"0123456789").unwrap();

        let mut file = RotatingFile::open(path.clone(), RotationConfig::new(15, 3)).unwrap();
        assert_eq!(file.current_size(), 10);

        file.write_record(b"abcdefgh\n").unwrap();
        assert_eq!(list_backups(&path).unwrap().len(), 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), "abcdefgh\n");
    }

    #[test]
    fn test_rotation_preserves_previous_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.log");
        let size = line(0).len() as u64;

        // Room for exactly two lines
        let mut file = RotatingFile::open(path.clone(), RotationConfig::new(size * 2, 3)).unwrap();
        for i in 0..3 {
            file.write_record(&line(i)).unwrap();
        }

        let backups = list_backups(&path).unwrap();
        assert_eq!(backups.len(), 1);
        let backup = fs::read_to_string(&backups[0].path).unwrap();
        assert_eq!(backup.as_bytes(), [line(0), line(1)].concat().as_slice());
        assert_eq!(fs::read(&path).unwrap(), line(2));
    }

    #[test]
    fn test_backup_count_never_exceeds_limit() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.log");

        let mut file = RotatingFile::open(path.clone(), RotationConfig::new(100, 3)).unwrap();
        for i in 0..40 {
            file.write_record(&line(i)).unwrap();
            assert!(list_backups(&path).unwrap().len() <= 3);
        }

        let backups = list_backups(&path).unwrap();
        assert_eq!(backups.len(), 3);
        // Newest backups survive
        let newest = fs::read_to_string(&backups[0].path).unwrap();
        assert!(newest.contains("Line 03"));
    }

    #[test]
    fn test_backup_names_are_unique() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.log");

        let mut file = RotatingFile::open(path.clone(), RotationConfig::new(1, 9)).unwrap();
        for i in 0..6 {
            file.write_record(&line(i)).unwrap();
        }

        let backups: Vec<BackupFile> = list_backups(&path).unwrap();
        assert_eq!(backups.len(), 5);
        for pair in backups.windows(2) {
            assert!(pair[0].timestamp > pair[1].timestamp);
        }
    }

    #[test]
    fn test_rapid_rotations_keep_every_backup() {
        let dir = TempDir::new().unwrap();

        for round in 0..50 {
            let path = dir.path().join(format!("rapid-{}.log", round));
            let mut file = RotatingFile::open(path.clone(), RotationConfig::new(1, 9)).unwrap();
            for i in 0..4 {
                file.write_record(&line(i)).unwrap();
            }

            let backups = list_backups(&path).unwrap();
            assert_eq!(backups.len(), 3, "round {}", round);
            let mut contents: Vec<String> = backups
                .iter()
                .map(|b| fs::read_to_string(&b.path).unwrap())
                .collect();
            contents.reverse();
            let expected: Vec<String> = (0..3)
                .map(|i| String::from_utf8(line(i)).unwrap())
                .collect();
            assert_eq!(contents, expected, "round {}", round);
        }
    }

    #[test]
    fn test_failed_compression_is_counted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.log");
        let stale = backup_path(&path, Utc::now() - Duration::hours(1));
        fs::write(&stale, b"old\n").unwrap();
        // A directory where the .gz should go makes compression fail
        fs::create_dir(format!("{}.gz", stale.display())).unwrap();

        let config = RotationConfig::new(1024, 5).with_compress(true);
        let file = RotatingFile::open(path, config).unwrap();

        assert_eq!(file.maintenance_errors(), 1);
        assert!(stale.exists());
    }

    #[test]
    fn test_oversized_record_is_written() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.log");

        let mut file = RotatingFile::open(path.clone(), RotationConfig::new(8, 3)).unwrap();
        file.write_record(b"this record is far too large\n").unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "this record is far too large\n"
        );
        assert!(list_backups(&path).unwrap().is_empty());
    }

    #[test]
    fn test_expired_backups_removed_on_rotation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.log");
        let stale = backup_path(&path, Utc::now() - Duration::days(45));

        let config = RotationConfig::new(10, 5).with_max_age(StdDuration::from_secs(30 * 86_400));
        let mut file = RotatingFile::open(path.clone(), config).unwrap();

        // Retention already ran at open; recreate the stale backup
        fs::write(&stale, b"ancient\n").unwrap();
        file.write_record(b"first line\n").unwrap();
        file.write_record(b"second line\n").unwrap();

        assert!(!stale.exists());
        assert_eq!(list_backups(&path).unwrap().len(), 1);
    }

    #[test]
    fn test_compressed_rotation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.log");

        let config = RotationConfig::new(10, 5).with_compress(true);
        let mut file = RotatingFile::open(path.clone(), config).unwrap();
        file.write_record(b"first line\n").unwrap();
        file.write_record(b"second line\n").unwrap();

        let backups = list_backups(&path).unwrap();
        assert_eq!(backups.len(), 1);
        assert!(backups[0].compressed);
        assert!(backups[0].path.to_string_lossy().ends_with(".log.gz"));
    }

    #[test]
    fn test_io_write_impl() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.log");

        let mut file = RotatingFile::open(path.clone(), RotationConfig::default()).unwrap();
        writeln!(file, "formatted {}", 42).unwrap();
        Write::flush(&mut file).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "formatted 42\n");
    }
}
