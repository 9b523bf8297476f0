//! Common test utilities for Deckhand CLI tests.
//!
//! `TestEnv` builds an isolated world in a temp directory: stub executables
//! for every external collaborator (git, curl, node, npm, pm2, apt-get) on a
//! prepended PATH, a valid config and secrets pair, and helpers to run the
//! compiled binary against it. Stubs append each invocation to a shared call
//! log so tests can assert on the exact command contract.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

pub struct TestEnv {
    pub root: TempDir,
    pub bin: PathBuf,
    pub call_log: PathBuf,
    pub config: PathBuf,
    pub secrets: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let root = TempDir::new().expect("create temp dir");
        let bin = root.path().join("bin");
        fs::create_dir_all(&bin).expect("create stub bin dir");

        let call_log = root.path().join("calls.log");
        fs::write(&call_log, "").expect("create call log");

        let env = Self {
            config: root.path().join("deckhand.toml"),
            secrets: root.path().join("secrets.toml"),
            root,
            bin,
            call_log,
        };

        env.write_default_stubs();
        env.write_default_config();
        env
    }

    pub fn project_dir(&self) -> PathBuf {
        self.root.path().join("srv/demo")
    }

    pub fn backup_root(&self) -> PathBuf {
        self.root.path().join("srv/backups")
    }

    pub fn log_file(&self) -> PathBuf {
        self.root.path().join("log/deckhand.log")
    }

    fn write_default_config(&self) {
        let config = format!(
            r#"[github]
repository_url = "https://example.test/app.git"
branch = "main"

[node]
required_version = "18"

[pm2]
app_name = "demo"

[project]
directory = "{project}"

[log]
file = "{log}"
"#,
            project = self.project_dir().display(),
            log = self.log_file().display(),
        );
        fs::write(&self.config, config).expect("write config");
        fs::write(&self.secrets, "token = \"sekrit\"\n").expect("write secrets");
    }

    /// Append extra TOML to the config (e.g. a `[backup]` section).
    pub fn append_config(&self, extra: &str) {
        let mut content = fs::read_to_string(&self.config).expect("read config");
        content.push_str(extra);
        fs::write(&self.config, content).expect("write config");
    }

    fn write_default_stubs(&self) {
        self.write_stub(
            "git",
            r#"#!/bin/sh
echo "git $*" >> "$DECKHAND_CALL_LOG"
case "$1" in
  --version) echo "git version 2.40.0"; exit 0;;
  clone)
    for last in "$@"; do :; done
    mkdir -p "$last"
    printf '%s\n' "console.log('hi')" > "$last/index.js"
    printf '%s\n' '{"name":"demo"}' > "$last/package.json"
    if [ -n "$GIT_STUB_LOCKFILE" ]; then printf '%s\n' '{}' > "$last/package-lock.json"; fi
    exit 0;;
esac
exit 0
"#,
        );

        self.write_stub(
            "curl",
            r#"#!/bin/sh
echo "curl $*" >> "$DECKHAND_CALL_LOG"
exit 0
"#,
        );

        self.write_stub(
            "node",
            r#"#!/bin/sh
echo "node $*" >> "$DECKHAND_CALL_LOG"
if [ "$1" = "--version" ]; then echo "${NODE_STUB_VERSION:-v18.17.0}"; fi
exit 0
"#,
        );

        self.write_stub(
            "npm",
            r#"#!/bin/sh
echo "npm $*" >> "$DECKHAND_CALL_LOG"
case "$1" in
  --version) echo "9.8.1"; exit 0;;
  run) exit "${NPM_BUILD_EXIT:-0}";;
esac
exit 0
"#,
        );

        self.write_stub(
            "pm2",
            r#"#!/bin/sh
echo "pm2 $*" >> "$DECKHAND_CALL_LOG"
case "$1" in
  --version) echo "5.3.0"; exit 0;;
  delete) exit "${PM2_DELETE_EXIT:-1}";;
  start) exit "${PM2_START_EXIT:-0}";;
  save) exit "${PM2_SAVE_EXIT:-0}";;
  describe) echo "status: online"; exit "${PM2_DESCRIBE_EXIT:-0}";;
esac
exit 0
"#,
        );

        self.write_stub(
            "apt-get",
            r#"#!/bin/sh
echo "apt-get $*" >> "$DECKHAND_CALL_LOG"
exit 0
"#,
        );
    }

    pub fn write_stub(&self, name: &str, body: &str) {
        let path = self.bin.join(name);
        fs::write(&path, body).expect("write stub");
        make_executable(&path);
    }

    /// Run the deckhand binary against this environment.
    pub fn run(&self) -> Output {
        self.run_with_env(&[])
    }

    pub fn run_with_env(&self, envs: &[(&str, &str)]) -> Output {
        self.run_full(&[], envs)
    }

    pub fn run_full(&self, args: &[&str], envs: &[(&str, &str)]) -> Output {
        let path = format!(
            "{}:{}",
            self.bin.display(),
            std::env::var("PATH").unwrap_or_default()
        );

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_deckhand"));
        cmd.arg("--config")
            .arg(&self.config)
            .arg("--secrets")
            .arg(&self.secrets)
            .args(args)
            .current_dir(self.root.path())
            .env("PATH", path)
            .env("DECKHAND_CALL_LOG", &self.call_log);

        for (key, value) in envs {
            cmd.env(key, value);
        }

        cmd.output().expect("run deckhand")
    }

    /// Everything the stubs were invoked with, one call per line.
    pub fn calls(&self) -> String {
        fs::read_to_string(&self.call_log).unwrap_or_default()
    }

    pub fn log_contents(&self) -> String {
        fs::read_to_string(self.log_file()).unwrap_or_default()
    }

    pub fn backups(&self) -> Vec<String> {
        match fs::read_dir(self.backup_root()) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).expect("chmod stub");
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) {}

pub fn stdout_str(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr_str(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
