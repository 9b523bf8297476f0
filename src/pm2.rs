//! Process supervisor client
//!
//! Replaces the running instance under the configured name: delete the old
//! one (absence tolerated), start the new build, persist the process table,
//! register boot startup, and verify the instance came up.
//!
//! Policy: `pm2 save` and `pm2 startup` failures are warnings, not fatal.
//! The deployment itself succeeded at that point; losing reboot persistence
//! is an operator-fixable condition. A failed status query stays fatal
//! because it means the new instance did not come up cleanly.

use crate::command;
use crate::context::DeployContext;
use crate::error::{DeployError, DeployResult};

/// Stop and replace the supervised instance for this app.
pub fn redeploy(ctx: &DeployContext) -> DeployResult<()> {
    delete_previous(ctx)?;
    start(ctx)?;
    persist(ctx)?;
    verify(ctx)
}

/// `pm2 delete <name>`. A non-zero exit means there was no prior instance,
/// which is informational, not an error.
fn delete_previous(ctx: &DeployContext) -> DeployResult<()> {
    let name = ctx.app_name();
    let out = command::run("pm2", &["delete", name], None)?;

    if out.success {
        ctx.logger.info(&format!("stopped previous instance '{name}'"));
    } else {
        ctx.logger.info(&format!("no previous instance '{name}' to stop"));
    }

    Ok(())
}

/// `pm2 start npm --name <name> -- start`, run from the project directory.
fn start(ctx: &DeployContext) -> DeployResult<()> {
    let name = ctx.app_name();
    let dir = ctx.project_dir();

    ctx.logger.info(&format!("starting '{name}' under pm2"));

    let out = command::run(
        "pm2",
        &["start", "npm", "--name", name, "--", "start"],
        Some(&dir),
    )?;

    if !out.success {
        return Err(DeployError::SupervisorStartFailed {
            name: name.to_string(),
            message: out.failure_message(),
        });
    }

    Ok(())
}

/// Persist the process table and register boot startup. Non-fatal.
fn persist(ctx: &DeployContext) -> DeployResult<()> {
    match command::run("pm2", &["save"], None) {
        Ok(out) if out.success => ctx.logger.info("pm2 process table saved"),
        Ok(out) => ctx
            .logger
            .warn(&format!("pm2 save failed: {}", out.failure_message())),
        Err(e) => ctx.logger.warn(&format!("pm2 save failed: {e}")),
    }

    match command::run("pm2", &["startup"], None) {
        Ok(out) if out.success => ctx.logger.info("pm2 registered for boot startup"),
        Ok(out) => ctx
            .logger
            .warn(&format!("pm2 startup failed: {}", out.failure_message())),
        Err(e) => ctx.logger.warn(&format!("pm2 startup failed: {e}")),
    }

    Ok(())
}

/// `pm2 describe <name>`. A failed query signals the instance did not come
/// up cleanly and is fatal.
fn verify(ctx: &DeployContext) -> DeployResult<()> {
    let name = ctx.app_name();
    let out = command::run("pm2", &["describe", name], None)?;

    if !out.success {
        return Err(DeployError::StatusCheckFailed {
            name: name.to_string(),
            message: out.failure_message(),
        });
    }

    ctx.logger
        .info(&format!("supervisor reports '{name}' running"));

    if ctx.verbose && !out.stdout.trim().is_empty() {
        ctx.logger.info(out.stdout.trim());
    }

    Ok(())
}
