//! The deployment pipeline
//!
//! Stages run strictly top to bottom, once per invocation; the first failure
//! aborts everything after it. There is no rollback: a re-run is the
//! recovery mechanism, relying on each stage's idempotence.

use crate::backup;
use crate::context::DeployContext;
use crate::error::DeployResult;
use crate::git;
use crate::npm;
use crate::pm2;
use crate::provision;

/// Run the full provision-and-deploy sequence.
pub fn run(ctx: &DeployContext) -> DeployResult<()> {
    ctx.logger.info(&format!(
        "deploying '{}' from {} (branch '{}')",
        ctx.app_name(),
        ctx.config.github.repository_url,
        ctx.config.github.branch
    ));

    stage(ctx, "provision", provision::ensure)?;
    stage(ctx, "backup", |ctx| {
        backup::backup_if_exists(ctx).map(|_| ())
    })?;
    stage(ctx, "fetch", git::clone)?;
    stage(ctx, "install", npm::install)?;
    stage(ctx, "build", npm::build)?;
    stage(ctx, "supervise", pm2::redeploy)?;

    ctx.logger
        .info(&format!("deployment of '{}' complete", ctx.app_name()));
    ctx.emit_event("pipeline", "success");
    Ok(())
}

fn stage<F>(ctx: &DeployContext, name: &str, f: F) -> DeployResult<()>
where
    F: FnOnce(&DeployContext) -> DeployResult<()>,
{
    ctx.emit_event(name, "start");
    f(ctx)?;
    ctx.emit_event(name, "ok");
    Ok(())
}
