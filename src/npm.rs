//! Build runner
//!
//! Installs the application's declared dependencies and runs its build
//! command, both from the project directory. When `package-lock.json` is
//! present the lockfile-exact mode (`npm ci`) is used so resolution drift
//! cannot creep in; otherwise `npm install` resolves fresh.

use std::path::Path;

use crate::command;
use crate::context::DeployContext;
use crate::error::{DeployError, DeployResult};

/// Pick the install mode for a project directory.
pub fn install_args(project_dir: &Path) -> &'static [&'static str] {
    if project_dir.join("package-lock.json").exists() {
        &["ci"]
    } else {
        &["install"]
    }
}

/// Install the project's dependencies.
pub fn install(ctx: &DeployContext) -> DeployResult<()> {
    let dir = ctx.project_dir();
    let args = install_args(&dir);

    ctx.logger.info(&format!("installing dependencies (npm {})", args[0]));

    let out = command::run("npm", args, Some(&dir))?;
    if !out.success {
        return Err(DeployError::DependencyInstallFailed {
            dir,
            message: out.failure_message(),
        });
    }

    if ctx.verbose && !out.stdout.trim().is_empty() {
        ctx.logger.info(out.stdout.trim());
    }

    Ok(())
}

/// Run the declared build command.
///
/// A failed build aborts the pipeline; the previously backed-up deployment
/// is not restored automatically.
pub fn build(ctx: &DeployContext) -> DeployResult<()> {
    let dir = ctx.project_dir();

    ctx.logger.info("running build");

    let out = command::run("npm", &["run", "build"], Some(&dir))?;
    if !out.success {
        return Err(DeployError::BuildFailed {
            dir,
            message: out.failure_message(),
        });
    }

    if ctx.verbose && !out.stdout.trim().is_empty() {
        ctx.logger.info(out.stdout.trim());
    }

    ctx.logger.info("build complete");
    Ok(())
}
