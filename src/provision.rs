//! Host provisioning
//!
//! Detects the system package manager, makes sure the fixed set of required
//! commands is present, and handles the version-pinned Node.js install path.
//! Idempotent: on an already-provisioned host this performs existence checks
//! only and never shells out to an installer.

use std::io;

use crate::command::{self, CmdOutput};
use crate::context::DeployContext;
use crate::error::{DeployError, DeployResult};

/// Commands the pipeline needs before fetching and building.
pub const REQUIRED_TOOLS: &[&str] = &["git", "curl"];

/// One implementation per supported system package manager, selected once at
/// startup by [`detect_package_manager`].
pub trait PackageManager {
    /// Name of the manager binary (for logs and error messages).
    fn name(&self) -> &'static str;

    /// Check if this manager is present on the host.
    fn is_available(&self) -> bool;

    /// Refresh the package index. Invoked once, before the first install.
    fn update_index(&self) -> io::Result<CmdOutput>;

    /// Install a single package non-interactively.
    fn install(&self, package: &str) -> io::Result<CmdOutput>;

    /// Run the vendor setup-and-install sequence for a pinned Node.js
    /// version. NodeSource publishes per-family setup scripts; pacman has no
    /// NodeSource channel and installs the distribution package instead.
    fn install_node(&self, version: &str) -> io::Result<CmdOutput>;
}

/// Debian/Ubuntu
pub struct Apt;

/// Fedora and friends
pub struct Dnf;

/// Older RHEL/CentOS
pub struct Yum;

/// Arch
pub struct Pacman;

impl PackageManager for Apt {
    fn name(&self) -> &'static str {
        "apt-get"
    }

    fn is_available(&self) -> bool {
        command::command_exists("apt-get")
    }

    fn update_index(&self) -> io::Result<CmdOutput> {
        command::run("apt-get", &["update"], None)
    }

    fn install(&self, package: &str) -> io::Result<CmdOutput> {
        command::run("apt-get", &["install", "-y", package], None)
    }

    fn install_node(&self, version: &str) -> io::Result<CmdOutput> {
        let setup = format!("curl -fsSL https://deb.nodesource.com/setup_{version}.x | sh -");
        let out = command::run_shell(&setup, None)?;
        if !out.success {
            return Ok(out);
        }
        self.install("nodejs")
    }
}

impl PackageManager for Dnf {
    fn name(&self) -> &'static str {
        "dnf"
    }

    fn is_available(&self) -> bool {
        command::command_exists("dnf")
    }

    fn update_index(&self) -> io::Result<CmdOutput> {
        command::run("dnf", &["makecache"], None)
    }

    fn install(&self, package: &str) -> io::Result<CmdOutput> {
        command::run("dnf", &["install", "-y", package], None)
    }

    fn install_node(&self, version: &str) -> io::Result<CmdOutput> {
        let setup = format!("curl -fsSL https://rpm.nodesource.com/setup_{version}.x | sh -");
        let out = command::run_shell(&setup, None)?;
        if !out.success {
            return Ok(out);
        }
        self.install("nodejs")
    }
}

impl PackageManager for Yum {
    fn name(&self) -> &'static str {
        "yum"
    }

    fn is_available(&self) -> bool {
        command::command_exists("yum")
    }

    fn update_index(&self) -> io::Result<CmdOutput> {
        command::run("yum", &["makecache"], None)
    }

    fn install(&self, package: &str) -> io::Result<CmdOutput> {
        command::run("yum", &["install", "-y", package], None)
    }

    fn install_node(&self, version: &str) -> io::Result<CmdOutput> {
        let setup = format!("curl -fsSL https://rpm.nodesource.com/setup_{version}.x | sh -");
        let out = command::run_shell(&setup, None)?;
        if !out.success {
            return Ok(out);
        }
        self.install("nodejs")
    }
}

impl PackageManager for Pacman {
    fn name(&self) -> &'static str {
        "pacman"
    }

    fn is_available(&self) -> bool {
        command::command_exists("pacman")
    }

    fn update_index(&self) -> io::Result<CmdOutput> {
        command::run("pacman", &["-Sy", "--noconfirm"], None)
    }

    fn install(&self, package: &str) -> io::Result<CmdOutput> {
        command::run("pacman", &["-S", "--noconfirm", package], None)
    }

    fn install_node(&self, _version: &str) -> io::Result<CmdOutput> {
        // No NodeSource channel for Arch; the repo package is whatever
        // version the distribution currently ships.
        let out = self.install("nodejs")?;
        if !out.success {
            return Ok(out);
        }
        self.install("npm")
    }
}

/// Pick the host's package manager from a fixed priority list.
pub fn detect_package_manager() -> Option<Box<dyn PackageManager>> {
    let managers: [Box<dyn PackageManager>; 4] =
        [Box::new(Apt), Box::new(Dnf), Box::new(Yum), Box::new(Pacman)];

    managers.into_iter().find(|m| m.is_available())
}

/// Best-effort version match: "18" matches "18.17.0" and "18", but not
/// "181.0.0". This is a documented prefix/major policy, not semver
/// comparison; the pinned value is a version family, not an exact release.
pub fn version_matches(installed: &str, required: &str) -> bool {
    let installed = installed.trim().trim_start_matches('v');
    let required = required.trim().trim_start_matches('v');

    if required.is_empty() {
        return false;
    }

    installed == required || installed.starts_with(&format!("{required}."))
}

/// Check the fixed tool set and the pinned runtime, installing what is
/// missing through the detected package manager.
pub fn ensure(ctx: &DeployContext) -> DeployResult<()> {
    let manager = detect_package_manager().ok_or(DeployError::NoPackageManager)?;
    ensure_with(ctx, manager.as_ref())
}

/// Same as [`ensure`], with the manager supplied by the caller.
pub fn ensure_with(ctx: &DeployContext, manager: &dyn PackageManager) -> DeployResult<()> {
    ctx.logger
        .info(&format!("using package manager: {}", manager.name()));

    let mut index_fresh = false;

    for &tool in REQUIRED_TOOLS {
        if command::command_exists(tool) {
            ctx.logger.info(&format!("{tool} already installed"));
            continue;
        }

        if !index_fresh {
            let out = manager.update_index()?;
            if !out.success {
                ctx.logger.warn(&format!(
                    "{} index update failed: {}",
                    manager.name(),
                    out.failure_message()
                ));
            }
            index_fresh = true;
        }

        ctx.logger.info(&format!("installing {tool}"));
        let out = manager.install(tool)?;
        if !out.success {
            return Err(DeployError::InstallFailed {
                tool: tool.to_string(),
                manager: manager.name().to_string(),
                message: out.failure_message(),
            });
        }
    }

    ensure_node(ctx, manager)?;
    ensure_pm2(ctx)?;

    Ok(())
}

/// Node must report a version in the required family; otherwise run the
/// vendor setup-and-install sequence for that family.
fn ensure_node(ctx: &DeployContext, manager: &dyn PackageManager) -> DeployResult<()> {
    let required = &ctx.config.node.required_version;

    if command::command_exists("node") {
        let out = command::run("node", &["--version"], None)?;
        let installed = out.stdout.trim().to_string();
        if out.success && version_matches(&installed, required) {
            ctx.logger
                .info(&format!("node {installed} satisfies required version {required}"));
            return Ok(());
        }
        ctx.logger.warn(&format!(
            "node version '{installed}' does not match required '{required}', reinstalling"
        ));
    } else {
        ctx.logger.info(&format!("node not found, installing version {required}"));
    }

    let out = manager.install_node(required)?;
    if !out.success {
        return Err(DeployError::InstallFailed {
            tool: "nodejs".to_string(),
            manager: manager.name().to_string(),
            message: out.failure_message(),
        });
    }

    ctx.logger.info("node installed");
    Ok(())
}

/// pm2 is an npm package, not a system one.
fn ensure_pm2(ctx: &DeployContext) -> DeployResult<()> {
    if command::command_exists("pm2") {
        ctx.logger.info("pm2 already installed");
        return Ok(());
    }

    ctx.logger.info("installing pm2");
    let out = command::run("npm", &["install", "-g", "pm2"], None)?;
    if !out.success {
        return Err(DeployError::InstallFailed {
            tool: "pm2".to_string(),
            manager: "npm".to_string(),
            message: out.failure_message(),
        });
    }

    Ok(())
}
