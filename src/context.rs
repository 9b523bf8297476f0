//! Execution context
//!
//! One context per run, built after configuration load, carrying the resolved
//! config, the shared log sink, and the output flags. Components receive it
//! by reference; nothing in the pipeline changes the process working
//! directory or relies on other ambient state.

use std::path::PathBuf;

use crate::config::DeployConfig;
use crate::logger::Logger;

/// Everything a pipeline stage needs to do its work.
pub struct DeployContext {
    pub config: DeployConfig,
    pub logger: Logger,
    /// Echo collaborator stdout into the log.
    pub verbose: bool,
    /// Emit machine-readable stage events on stdout.
    pub json: bool,
}

impl DeployContext {
    pub fn new(config: DeployConfig, logger: Logger, verbose: bool, json: bool) -> Self {
        Self {
            config,
            logger,
            verbose,
            json,
        }
    }

    pub fn project_dir(&self) -> PathBuf {
        self.config.project_dir()
    }

    pub fn backup_root(&self) -> PathBuf {
        self.config.backup_root()
    }

    pub fn app_name(&self) -> &str {
        &self.config.pm2.app_name
    }

    /// One JSON line per stage transition, for CI consumers.
    pub fn emit_event(&self, stage: &str, status: &str) {
        if !self.json {
            return;
        }
        let event = serde_json::json!({
            "event": "stage",
            "stage": stage,
            "status": status,
        });
        println!("{event}");
    }
}
