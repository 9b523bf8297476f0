//! Deckhand - idempotent provision-and-deploy tool
//!
//! Deckhand reads a TOML description of a service (source repository, branch,
//! pinned Node version, pm2 process name, target directory), provisions the
//! host, backs up and replaces the deployed tree, builds it, and hands the
//! result to pm2. Every external tool is an opaque collaborator driven by
//! exit codes.

pub mod backup;
pub mod command;
pub mod config;
pub mod context;
pub mod error;
pub mod git;
pub mod logger;
pub mod npm;
pub mod pipeline;
pub mod pm2;
pub mod provision;

// Re-exports for convenience
pub use backup::{backup_if_exists, BackupRecord};
pub use config::{DeployConfig, DEFAULT_LOG_FILE, DEFAULT_LOG_MAX_SIZE};
pub use context::DeployContext;
pub use error::{DeployError, DeployResult};
pub use logger::{Level, Logger};
pub use provision::{detect_package_manager, version_matches, PackageManager};
