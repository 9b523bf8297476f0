//! Configuration module for Deckhand
//!
//! Two documents are read once at startup and are immutable afterwards:
//! - the primary config (repository, branch, runtime version, process name,
//!   project directory, plus optional backup/log tuning)
//! - the secrets document (opaque key-value material; validated for
//!   well-formedness only and never logged)
//!
//! Required keys live under `[github]`, `[node]`, `[pm2]` and `[project]`.
//! A missing or empty required key is a fatal `ConfigIncomplete` error.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DeployError, DeployResult};

/// Default log file location when `[log] file` is not set.
pub const DEFAULT_LOG_FILE: &str = "/var/log/deckhand/deckhand.log";

/// Default log rotation threshold (5 MiB).
pub const DEFAULT_LOG_MAX_SIZE: u64 = 5 * 1024 * 1024;

/// `[github]` section
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GithubConfig {
    #[serde(default)]
    pub repository_url: String,

    #[serde(default)]
    pub branch: String,
}

/// `[node]` section
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NodeConfig {
    /// Semver prefix, e.g. "18" (matches "18.17.0"). Not full semver.
    #[serde(default)]
    pub required_version: String,
}

/// `[pm2]` section
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Pm2Config {
    #[serde(default)]
    pub app_name: String,
}

/// `[project]` section
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProjectConfig {
    #[serde(default)]
    pub directory: String,
}

/// `[backup]` section (optional)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BackupConfig {
    /// Backup root; defaults to a `backups` directory next to the project.
    #[serde(default)]
    pub root: Option<String>,

    /// Number of backups to retain; 0 means unbounded.
    #[serde(default)]
    pub keep: usize,
}

/// `[log]` section (optional)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_file")]
    pub file: String,

    #[serde(default = "default_log_max_size")]
    pub max_size_bytes: u64,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            max_size_bytes: default_log_max_size(),
        }
    }
}

fn default_log_file() -> String {
    DEFAULT_LOG_FILE.to_string()
}

fn default_log_max_size() -> u64 {
    DEFAULT_LOG_MAX_SIZE
}

/// Non-fatal configuration warning surfaced to CLI users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub key: String,
    pub file: PathBuf,
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DeployConfig {
    #[serde(default)]
    pub github: GithubConfig,

    #[serde(default)]
    pub node: NodeConfig,

    #[serde(default)]
    pub pm2: Pm2Config,

    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub backup: BackupConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl DeployConfig {
    /// Load and validate the primary config, then check the secrets document
    /// exists and parses. Secrets contents are discarded here on purpose.
    pub fn load(config_path: &Path, secrets_path: &Path) -> DeployResult<Self> {
        let (config, _warnings) = Self::load_with_warnings(config_path)?;
        load_secrets(secrets_path)?;
        Ok(config)
    }

    /// Load the primary config, collecting non-fatal unknown-key warnings.
    pub fn load_with_warnings(path: &Path) -> DeployResult<(Self, Vec<ConfigWarning>)> {
        if !path.exists() {
            return Err(DeployError::ConfigMissing {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path)?;

        let mut unknown_paths: Vec<String> = Vec::new();
        let deserializer = toml::de::Deserializer::new(&content);

        let config: Self = serde_ignored::deserialize(deserializer, |path| {
            unknown_paths.push(path.to_string());
        })
        .map_err(|e| DeployError::ConfigInvalid {
            file: path.to_path_buf(),
            message: e.to_string(),
        })?;

        config.validate(path)?;

        let warnings = unknown_paths
            .into_iter()
            .map(|key| ConfigWarning {
                key,
                file: path.to_path_buf(),
            })
            .collect();

        Ok((config, warnings))
    }

    /// Every required field must be present and non-empty.
    fn validate(&self, file: &Path) -> DeployResult<()> {
        let required: [(&str, &str); 5] = [
            ("github.repository_url", &self.github.repository_url),
            ("github.branch", &self.github.branch),
            ("node.required_version", &self.node.required_version),
            ("pm2.app_name", &self.pm2.app_name),
            ("project.directory", &self.project.directory),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(DeployError::ConfigIncomplete {
                    field: field.to_string(),
                    file: file.to_path_buf(),
                });
            }
        }

        Ok(())
    }

    /// Project directory with `~` expanded.
    pub fn project_dir(&self) -> PathBuf {
        expand_home(Path::new(&self.project.directory))
    }

    /// Backup root: configured value, or a `backups` directory sitting next
    /// to the project directory.
    pub fn backup_root(&self) -> PathBuf {
        match &self.backup.root {
            Some(root) if !root.trim().is_empty() => expand_home(Path::new(root)),
            _ => {
                let dir = self.project_dir();
                match dir.parent() {
                    Some(parent) => parent.join("backups"),
                    None => PathBuf::from("backups"),
                }
            }
        }
    }

    /// Log file with `~` expanded.
    pub fn log_file(&self) -> PathBuf {
        expand_home(Path::new(&self.log.file))
    }
}

/// Parse the secrets document. Only existence and well-formedness matter;
/// the key-value material itself is opaque to the pipeline.
pub fn load_secrets(path: &Path) -> DeployResult<()> {
    if !path.exists() {
        return Err(DeployError::ConfigMissing {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path)?;
    content
        .parse::<toml::Table>()
        .map_err(|e| DeployError::ConfigInvalid {
            file: path.to_path_buf(),
            message: e.to_string(),
        })?;

    Ok(())
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    let p = path.to_string_lossy();
    if let Some(rest) = p.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if p == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    path.to_path_buf()
}
