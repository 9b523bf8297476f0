//! Source fetching
//!
//! Shallow single-branch clone into the project directory. The caller is
//! responsible for having backed up or cleared the destination first.

use crate::command;
use crate::context::DeployContext;
use crate::error::{DeployError, DeployResult};

/// Clone the configured branch into the project directory.
///
/// Authentication failures, unreachable remotes, and nonexistent branches
/// are not distinguished: any non-zero exit from git is one fatal
/// `CloneFailed` carrying git's own message.
pub fn clone(ctx: &DeployContext) -> DeployResult<()> {
    let url = &ctx.config.github.repository_url;
    let branch = &ctx.config.github.branch;
    let dest = ctx.project_dir();
    let dest_str = dest.to_string_lossy();

    ctx.logger
        .info(&format!("cloning {url} (branch '{branch}') into {dest_str}"));

    let out = command::run(
        "git",
        &[
            "clone",
            "--depth",
            "1",
            "--branch",
            branch,
            "--single-branch",
            url,
            &dest_str,
        ],
        None,
    )?;

    if !out.success {
        return Err(DeployError::CloneFailed {
            url: url.clone(),
            branch: branch.clone(),
            message: out.failure_message(),
        });
    }

    if ctx.verbose && !out.stderr.trim().is_empty() {
        // git reports clone progress on stderr even on success
        ctx.logger.info(out.stderr.trim());
    }

    ctx.logger.info("clone complete");
    Ok(())
}
