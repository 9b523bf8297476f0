//! Shared log sink
//!
//! One logger per run, created before any pipeline stage and threaded through
//! the execution context. Every entry is appended to the log file as
//! `TIMESTAMP - LEVEL: MESSAGE` and echoed to the terminal (errors go to
//! stderr). When the file grows past the size threshold it is renamed to a
//! `.old` sibling and a fresh file is started before the entry is appended.
//!
//! Write failures after init are swallowed: a full disk must not turn a
//! deploy log line into a pipeline abort.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;

use crate::error::DeployResult;

/// Log severity. The on-disk format knows exactly these three levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Info => write!(f, "INFO"),
            Level::Warn => write!(f, "WARN"),
            Level::Error => write!(f, "ERROR"),
        }
    }
}

/// Append-only, terminal-echoing log sink.
pub struct Logger {
    path: PathBuf,
    max_size: u64,
    file: Mutex<File>,
}

impl Logger {
    /// Create the log directory and file if absent and open for appending.
    ///
    /// On unix the directory is created 0755 and the file 0644.
    pub fn init(path: &Path, max_size: u64) -> DeployResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
                set_permissions(parent, 0o755);
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        set_permissions(path, 0o644);

        Ok(Self {
            path: path.to_path_buf(),
            max_size,
            file: Mutex::new(file),
        })
    }

    pub fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(Level::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }

    /// Append one entry and echo it to the terminal.
    pub fn log(&self, level: Level, message: &str) {
        let line = format!(
            "{} - {}: {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            level,
            message
        );

        match level {
            Level::Error => eprintln!("{line}"),
            _ => println!("{line}"),
        }

        let mut file = match self.file.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(rotated) = self.rotate_if_needed(&file) {
            *file = rotated;
        }

        let _ = writeln!(file, "{line}");
    }

    /// Rename the current file to `<name>.old` and start fresh once the size
    /// threshold is crossed. Returns the replacement handle on rotation.
    fn rotate_if_needed(&self, file: &File) -> Option<File> {
        let len = file.metadata().ok()?.len();
        if len < self.max_size {
            return None;
        }

        let mut old = self.path.clone().into_os_string();
        old.push(".old");
        fs::rename(&self.path, PathBuf::from(old)).ok()?;

        let fresh = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .ok()?;
        set_permissions(&self.path, 0o644);
        Some(fresh)
    }
}

#[cfg(unix)]
fn set_permissions(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    let _ = fs::set_permissions(path, fs::Permissions::from_mode(mode));
}

#[cfg(not(unix))]
fn set_permissions(_path: &Path, _mode: u32) {}
