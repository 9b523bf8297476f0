//! Error types for Deckhand
//!
//! Uses `thiserror` for library errors. Every variant is fatal to the
//! pipeline; there is no retry policy and no partial-failure continuation.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Deckhand operations
pub type DeployResult<T> = Result<T, DeployError>;

/// Main error type for Deckhand operations
#[derive(Error, Debug)]
pub enum DeployError {
    /// Configuration file does not exist
    #[error("configuration file not found: {path}")]
    ConfigMissing { path: PathBuf },

    /// Configuration file is not well-formed TOML
    #[error("invalid configuration in {file}: {message}")]
    ConfigInvalid { file: PathBuf, message: String },

    /// A required configuration field is absent or empty
    #[error("missing required field '{field}' in {file}")]
    ConfigIncomplete { field: String, file: PathBuf },

    /// None of the supported package managers is present on the host
    #[error("no supported package manager found (tried apt-get, dnf, yum, pacman)")]
    NoPackageManager,

    /// Installing a required tool through the package manager failed
    #[error("failed to install '{tool}' via {manager}: {message}")]
    InstallFailed {
        tool: String,
        manager: String,
        message: String,
    },

    /// git clone exited non-zero
    #[error("clone of {url} (branch '{branch}') failed: {message}")]
    CloneFailed {
        url: String,
        branch: String,
        message: String,
    },

    /// npm dependency installation exited non-zero
    #[error("dependency install failed in {dir}: {message}")]
    DependencyInstallFailed { dir: PathBuf, message: String },

    /// npm run build exited non-zero
    #[error("build failed in {dir}: {message}")]
    BuildFailed { dir: PathBuf, message: String },

    /// Previous deployment could not be relocated to the backup root
    #[error("backup of {src} to {destination} failed: {message}")]
    BackupFailed {
        src: PathBuf,
        destination: PathBuf,
        message: String,
    },

    /// pm2 refused to start the new instance
    #[error("supervisor failed to start '{name}': {message}")]
    SupervisorStartFailed { name: String, message: String },

    /// pm2 could not report status for the freshly started instance
    #[error("status check failed for '{name}': {message}")]
    StatusCheckFailed { name: String, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeployError {
    /// Pipeline stage the error belongs to, for log context.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::ConfigMissing { .. }
            | Self::ConfigInvalid { .. }
            | Self::ConfigIncomplete { .. } => "config",
            Self::NoPackageManager | Self::InstallFailed { .. } => "provision",
            Self::BackupFailed { .. } => "backup",
            Self::CloneFailed { .. } => "fetch",
            Self::DependencyInstallFailed { .. } | Self::BuildFailed { .. } => "build",
            Self::SupervisorStartFailed { .. } | Self::StatusCheckFailed { .. } => "supervise",
            Self::Io(_) => "io",
        }
    }
}
