//! duolog Rotate - Size-triggered log rotation with backup retention
//!
//! A [`RotatingFile`] appends records to an active file. When the next record
//! would push the file past its size limit, the file is renamed to a
//! timestamped backup, a fresh file is opened, and the retention step prunes
//! backups by count and age (compressing survivors when configured).

mod backup;
mod rotation;
mod writer;

pub use backup::{backup_path, list_backups, prune_backups, BackupFile, Pruned, BACKUP_TIME_FORMAT};
pub use rotation::RotationConfig;
pub use writer::RotatingFile;
