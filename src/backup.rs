//! Backup of the previous deployment
//!
//! Before the fetch stage overwrites the project directory, any existing
//! deployment is relocated to `backup_root/{app_name}_{timestamp}`. Move
//! semantics are preferred; when the rename fails (typically a cross-device
//! backup root) the directory is copied recursively and then removed. A
//! failed relocation is fatal: the pipeline must never overwrite a directory
//! it could not preserve.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::context::DeployContext;
use crate::error::{DeployError, DeployResult};

/// Record of one relocated deployment.
#[derive(Debug, Clone)]
pub struct BackupRecord {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub created_at: DateTime<Local>,
}

/// Relocate the existing project directory into the backup root, if there is
/// one. Returns `None` when there is nothing to back up.
pub fn backup_if_exists(ctx: &DeployContext) -> DeployResult<Option<BackupRecord>> {
    let source = ctx.project_dir();
    if !source.exists() {
        ctx.logger
            .info(&format!("no previous deployment at {}", source.display()));
        return Ok(None);
    }

    let root = ctx.backup_root();
    fs::create_dir_all(&root).map_err(|e| DeployError::BackupFailed {
        src: source.clone(),
        destination: root.clone(),
        message: e.to_string(),
    })?;

    let created_at = Local::now();
    let destination = free_destination(&root, ctx.app_name(), &created_at);

    relocate(&source, &destination).map_err(|e| DeployError::BackupFailed {
        src: source.clone(),
        destination: destination.clone(),
        message: e.to_string(),
    })?;

    ctx.logger.info(&format!(
        "backed up {} to {}",
        source.display(),
        destination.display()
    ));

    prune(ctx, &root);

    Ok(Some(BackupRecord {
        source,
        destination,
        created_at,
    }))
}

/// `{app}_{YYYYmmddHHMMSS}`, with a numeric suffix in the unlikely case the
/// second-resolution name is already taken.
fn free_destination(root: &Path, app_name: &str, created_at: &DateTime<Local>) -> PathBuf {
    let stamp = created_at.format("%Y%m%d%H%M%S");
    let base = root.join(format!("{app_name}_{stamp}"));
    if !base.exists() {
        return base;
    }

    let mut n = 1;
    loop {
        let candidate = root.join(format!("{app_name}_{stamp}_{n}"));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// Rename, falling back to copy-and-remove across filesystems.
fn relocate(source: &Path, destination: &Path) -> io::Result<()> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(_) => {
            copy_dir_all(source, destination)?;
            fs::remove_dir_all(source)
        }
    }
}

fn copy_dir_all(source: &Path, destination: &Path) -> io::Result<()> {
    fs::create_dir_all(destination)?;
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let target = destination.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_all(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Drop the oldest backups beyond the configured cap. The timestamp format
/// sorts lexicographically, so name order is age order. Housekeeping only;
/// failures are logged and ignored.
fn prune(ctx: &DeployContext, root: &Path) {
    let keep = ctx.config.backup.keep;
    if keep == 0 {
        return;
    }

    let prefix = format!("{}_", ctx.app_name());
    let mut backups: Vec<PathBuf> = match fs::read_dir(root) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(&prefix))
            })
            .collect(),
        Err(_) => return,
    };

    if backups.len() <= keep {
        return;
    }

    backups.sort();
    let excess = backups.len() - keep;
    for old in &backups[..excess] {
        match fs::remove_dir_all(old) {
            Ok(()) => ctx
                .logger
                .info(&format!("pruned old backup {}", old.display())),
            Err(e) => ctx
                .logger
                .warn(&format!("could not prune {}: {e}", old.display())),
        }
    }
}
