// SPDX-FileCopyrightText: 2025 Docket contributors
// SPDX-License-Identifier: MIT

//! Shared execution context for one dispatch.
//!
//! A [`Session`] is the single piece of mutable state handed to every task in
//! a dispatch: the project layout, the CI flag, the record of packages
//! installed so far, and a log suppression depth. Tasks run strictly one
//! after another, so a later task may rely on the side effects of an earlier
//! one; no locking is involved because nothing runs concurrently.
//!
//! The session also owns the collaborator primitives every task shells out
//! through: interactive subprocess execution, captured execution for querying
//! tools, best-effort dependency probing, and package installation. External
//! tool failures surface as [`SessionError::ToolFailure`] carrying the tool's
//! own output, with no reinterpretation.

use crate::config::ProjectLayout;

use std::{
    cell::Cell,
    collections::HashMap,
    process::{Command, Stdio},
};
use tracing::{debug, info};

/// Shared execution context for one dispatch invocation.
pub struct Session {
    /// Layout of the project being driven.
    pub layout: ProjectLayout,

    ci: bool,
    quiet: Cell<usize>,
    installed: Vec<String>,
}

impl Session {
    /// Construct a new session around a project layout.
    ///
    /// CI detection follows the convention of a `CI` environment variable
    /// being present, regardless of value.
    pub fn new(layout: ProjectLayout) -> Self {
        Self {
            layout,
            ci: std::env::var_os("CI").is_some(),
            quiet: Cell::new(0),
            installed: Vec::new(),
        }
    }

    /// Whether this session runs under a CI environment.
    pub fn ci(&self) -> bool {
        self.ci
    }

    /// Package specs installed so far in this session, in install order.
    pub fn installed(&self) -> &[String] {
        &self.installed
    }

    /// Suppress informational logging until the returned guard drops.
    ///
    /// Suppression nests; the previous depth is restored on every exit path,
    /// including unwinding.
    pub fn suppressed(&self) -> QuietGuard<'_> {
        self.quiet.set(self.quiet.get() + 1);
        QuietGuard { quiet: &self.quiet }
    }

    /// Run a command interactively, streaming its output to the user.
    ///
    /// # Errors
    ///
    /// - Return [`SessionError::MissingInvocation`] if `argv` is empty.
    /// - Return [`SessionError::Spawn`] if the command cannot be spawned.
    /// - Return [`SessionError::ToolFailure`] if the command exits non-zero.
    pub fn run(&self, argv: &[String]) -> Result<()> {
        self.run_env(argv, &HashMap::new())
    }

    /// Run a command interactively with extra environment variables.
    ///
    /// Same contract as [`Session::run`]; the overlay is applied on top of
    /// the inherited environment.
    pub fn run_env(&self, argv: &[String], env: &HashMap<String, String>) -> Result<()> {
        let (cmd, args) = split_argv(argv)?;

        if self.quiet.get() > 0 {
            debug!("run: {}", argv.join(" "));
            let output = Command::new(cmd)
                .args(args)
                .envs(env)
                .output()
                .map_err(|err| spawn_error(cmd, err))?;
            if !output.status.success() {
                return Err(tool_failure(cmd, &capture_message(&output)));
            }
            return Ok(());
        }

        info!("run: {}", argv.join(" "));
        let status = Command::new(cmd)
            .args(args)
            .envs(env)
            .spawn()
            .map_err(|err| spawn_error(cmd, err))?
            .wait()
            .map_err(|err| spawn_error(cmd, err))?;
        if !status.success() {
            return Err(tool_failure(cmd, ""));
        }

        Ok(())
    }

    /// Run a command and capture its standard output for parsing.
    ///
    /// Trailing newlines are chomped from the captured output.
    ///
    /// # Errors
    ///
    /// Same as [`Session::run`]; a failing command's error carries both of
    /// its output streams.
    pub fn run_captured(&self, argv: &[String]) -> Result<String> {
        let (cmd, args) = split_argv(argv)?;

        debug!("run: {}", argv.join(" "));
        let output = Command::new(cmd)
            .args(args)
            .output()
            .map_err(|err| spawn_error(cmd, err))?;

        if !output.status.success() {
            return Err(tool_failure(cmd, &capture_message(&output)));
        }

        Ok(chomp(String::from_utf8_lossy(&output.stdout).into_owned()))
    }

    /// Probe whether a dependency group is already satisfied.
    ///
    /// Best effort: any failure, including an unspawnable or missing probe
    /// binary, reads as "not installed". The probe runs against a cleared
    /// environment holding only `PATH` plus the given overlay, so ambient
    /// state cannot mask a missing dependency.
    pub fn probe(&self, argv: &[String], env: &HashMap<String, String>) -> bool {
        let Some((cmd, args)) = argv.split_first() else {
            return false;
        };

        debug!("probe: {}", argv.join(" "));
        let mut command = Command::new(cmd);
        command
            .args(args)
            .env_clear()
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if let Some(path) = std::env::var_os("PATH") {
            command.env("PATH", path);
        }
        command.envs(env);

        command
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    /// Install packages through the configured installer invocation.
    ///
    /// With `isolated` set the installer resolves dependencies without
    /// inheriting from the ambient package environment. Installed specs are
    /// recorded on the session for later tasks to inspect.
    ///
    /// # Errors
    ///
    /// Same as [`Session::run`].
    pub fn install(&mut self, args: &[String], isolated: bool) -> Result<()> {
        self.install_env(args, isolated, &HashMap::new())
    }

    /// Install packages with extra environment variables set.
    ///
    /// Same contract as [`Session::install`].
    pub fn install_env(
        &mut self,
        args: &[String],
        isolated: bool,
        env: &HashMap<String, String>,
    ) -> Result<()> {
        let mut argv = self.layout.installer.clone();
        if isolated {
            argv.push("--isolated".into());
        }
        argv.extend(args.iter().cloned());

        self.run_env(&argv, env)?;
        self.installed.extend(args.iter().cloned());

        Ok(())
    }
}

/// Guard restoring the previous log suppression depth when dropped.
pub struct QuietGuard<'a> {
    quiet: &'a Cell<usize>,
}

impl Drop for QuietGuard<'_> {
    fn drop(&mut self) {
        self.quiet.set(self.quiet.get().saturating_sub(1));
    }
}

fn split_argv(argv: &[String]) -> Result<(&String, &[String])> {
    argv.split_first().ok_or(SessionError::MissingInvocation)
}

fn spawn_error(cmd: &str, source: std::io::Error) -> SessionError {
    SessionError::Spawn {
        command: cmd.into(),
        source,
    }
}

fn tool_failure(cmd: &str, message: &str) -> SessionError {
    SessionError::ToolFailure {
        command: cmd.into(),
        output: if message.is_empty() {
            String::new()
        } else {
            format!(":\n{message}")
        },
    }
}

fn capture_message(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let mut message = String::new();

    if !stdout.is_empty() {
        message.push_str(stdout.as_ref());
    }

    if !stderr.is_empty() {
        message.push_str(stderr.as_ref());
    }

    chomp(message)
}

// Chomp trailing newlines.
fn chomp(message: String) -> String {
    message
        .strip_suffix("\r\n")
        .or(message.strip_suffix('\n'))
        .map(ToString::to_string)
        .unwrap_or(message)
}

/// All possible error types for session collaborator calls.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A run was requested with no command tokens at all.
    #[error("must pass a command invocation to run")]
    MissingInvocation,

    /// The command could not be spawned in the first place.
    #[error("cannot spawn command {command:?}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    /// The command ran and exited non-zero.
    #[error("command {command:?} failed{output}")]
    ToolFailure { command: String, output: String },
}

/// Friendly result alias.
pub type Result<T, E = SessionError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    fn argv(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    fn session() -> Session {
        Session::new(ProjectLayout::default())
    }

    #[test]
    fn run_rejects_empty_invocation() {
        let result = session().run(&[]);
        assert!(matches!(result, Err(SessionError::MissingInvocation)));
    }

    #[test]
    fn run_captured_chomps_trailing_newline() -> anyhow::Result<()> {
        let output = session().run_captured(&argv(&["echo", "hello"]))?;
        assert_eq!(output, "hello");
        Ok(())
    }

    #[test]
    fn run_surfaces_tool_failure() {
        let result = session().run_captured(&argv(&["false"]));
        assert!(matches!(
            result,
            Err(SessionError::ToolFailure { command, .. }) if command == "false"
        ));
    }

    #[test]
    fn probe_fails_for_absent_command() {
        let absent = argv(&["docket-test-tool-that-does-not-exist"]);
        assert!(!session().probe(&absent, &HashMap::new()));
    }

    #[test]
    fn probe_succeeds_for_present_command() {
        assert!(session().probe(&argv(&["true"]), &HashMap::new()));
    }

    #[test]
    fn probe_fails_for_empty_invocation() {
        assert!(!session().probe(&[], &HashMap::new()));
    }

    #[test]
    fn suppression_depth_restores_on_drop() {
        let session = session();
        {
            let _outer = session.suppressed();
            let _inner = session.suppressed();
            assert_eq!(session.quiet.get(), 2);
        }
        assert_eq!(session.quiet.get(), 0);
    }

    #[sealed_test(env = [("CI", "1")])]
    fn ci_detection_reads_environment() {
        assert!(session().ci());
    }

    #[test]
    fn install_records_installed_specs() -> anyhow::Result<()> {
        let layout = ProjectLayout {
            // Discard install arguments; only the record matters here.
            installer: argv(&["true"]),
            ..Default::default()
        };
        let mut session = Session::new(layout);

        session.install(&argv(&["sphinx-autobuild"]), false)?;
        assert_eq!(session.installed(), argv(&["sphinx-autobuild"]));

        Ok(())
    }
}
