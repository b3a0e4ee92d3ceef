//! Backup naming, listing, compression and retention

use chrono::{DateTime, NaiveDateTime, Utc};
use duolog_core::Result;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::rotation::RotationConfig;

/// Timestamp embedded in backup names (UTC)
pub const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3f";

const GZ_SUFFIX: &str = ".gz";

/// A rotated file found next to the active file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupFile {
    pub path: PathBuf,
    pub timestamp: DateTime<Utc>,
    pub compressed: bool,
}

/// Split `info.log` into (`info`, `.log`)
fn split_name(base: &Path) -> (String, String) {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = base
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    (stem, ext)
}

/// Backup path for `base` rotated at `timestamp`:
/// `logs/info.log` becomes `logs/info-2024-01-02T03-04-05.678.log`
pub fn backup_path(base: &Path, timestamp: DateTime<Utc>) -> PathBuf {
    let (stem, ext) = split_name(base);
    base.with_file_name(format!(
        "{}-{}{}",
        stem,
        timestamp.format(BACKUP_TIME_FORMAT),
        ext
    ))
}

/// Recover the rotation time from a backup file name
fn parse_backup_name(stem: &str, ext: &str, file_name: &str) -> Option<(DateTime<Utc>, bool)> {
    let (name, compressed) = match file_name.strip_suffix(GZ_SUFFIX) {
        Some(name) => (name, true),
        None => (file_name, false),
    };

    let rest = name.strip_prefix(stem)?.strip_prefix('-')?;
    let stamp = rest.strip_suffix(ext)?;
    let naive = NaiveDateTime::parse_from_str(stamp, BACKUP_TIME_FORMAT).ok()?;
    Some((naive.and_utc(), compressed))
}

/// List the backups of `base`, newest first
pub fn list_backups(base: &Path) -> Result<Vec<BackupFile>> {
    let dir = match base.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if !dir.exists() {
        return Ok(vec![]);
    }

    let (stem, ext) = split_name(base);
    let mut backups = Vec::new();

    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let file_name = entry.file_name();
        let file_name = file_name.to_string_lossy();
        if let Some((timestamp, compressed)) = parse_backup_name(&stem, &ext, &file_name) {
            backups.push(BackupFile {
                path: entry.path(),
                timestamp,
                compressed,
            });
        }
    }

    backups.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(backups)
}

/// Gzip `path` into `path.gz` and remove the original
pub(crate) fn compress_file(path: &Path) -> Result<PathBuf> {
    let mut target = path.as_os_str().to_owned();
    target.push(GZ_SUFFIX);
    let target = PathBuf::from(target);

    let result = (|| -> io::Result<()> {
        let mut reader = BufReader::new(File::open(path)?);
        let mut encoder = GzEncoder::new(File::create(&target)?, Compression::default());
        io::copy(&mut reader, &mut encoder)?;
        encoder.finish()?.sync_all()?;
        Ok(())
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&target);
        return Err(e.into());
    }

    fs::remove_file(path)?;
    Ok(target)
}

/// Outcome of one retention pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pruned {
    /// Backups that remain, newest first
    pub kept: Vec<BackupFile>,
    /// Backups that could not be removed or compressed
    pub failures: usize,
}

/// Apply retention to the backups of `base`.
///
/// Backups past the newest `max_backups`, and backups older than `max_age`,
/// are removed. Survivors are gzipped when compression is on. A backup that
/// cannot be removed or compressed is counted in [`Pruned::failures`] and
/// left in place.
pub fn prune_backups(base: &Path, config: &RotationConfig, now: DateTime<Utc>) -> Result<Pruned> {
    let cutoff = config
        .max_age
        .and_then(|age| chrono::Duration::from_std(age).ok())
        .map(|age| now - age);

    let mut kept = Vec::new();
    let mut failures = 0;
    for (index, backup) in list_backups(base)?.into_iter().enumerate() {
        let too_many = index >= config.max_backups;
        let too_old = cutoff.is_some_and(|cutoff| backup.timestamp < cutoff);

        if too_many || too_old {
            debug!("Removing log backup: {}", backup.path.display());
            if let Err(e) = fs::remove_file(&backup.path) {
                failures += 1;
                warn!("Failed to remove log backup {}: {}", backup.path.display(), e);
            }
            continue;
        }
        kept.push(backup);
    }

    if config.compress {
        for backup in kept.iter_mut().filter(|b| !b.compressed) {
            match compress_file(&backup.path) {
                Ok(path) => {
                    backup.path = path;
                    backup.compressed = true;
                }
                Err(e) => {
                    failures += 1;
                    warn!("Failed to compress {}: {}", backup.path.display(), e);
                }
            }
        }
    }

    Ok(Pruned { kept, failures })
}
