// SPDX-FileCopyrightText: 2025 Docket contributors
// SPDX-License-Identifier: MIT

//! Checking and linting tasks.
//!
//! Linting runs through the commit-hook manager so the exact same checks run
//! locally, in the hooks, and in CI. Link checking is just another builder
//! run with a dedicated builder name.

use crate::{
    args::Invocation,
    dispatch::{Task, TaskRole},
    session::Session,
    tasks::Result,
};

/// Builder that validates external links instead of producing output.
const LINKCHECK_BUILDER: &str = "linkcheck";

/// Lint the whole project through the hook manager.
pub const LINT: Task = Task {
    name: "lint",
    role: TaskRole::Standard,
    run: lint,
};

/// Check that external links in the documentation resolve.
pub const LINKCHECK: Task = Task {
    name: "linkcheck",
    role: TaskRole::Standard,
    run: linkcheck,
};

/// Install the project's commit hooks.
pub const INSTALL_HOOKS: Task = Task {
    name: "install-hooks",
    role: TaskRole::Standard,
    run: install_hooks,
};

/// Uninstall the project's commit hooks.
pub const UNINSTALL_HOOKS: Task = Task {
    name: "uninstall-hooks",
    role: TaskRole::Standard,
    run: uninstall_hooks,
};

fn lint(session: &mut Session, posargs: &[String]) -> Result<()> {
    let mut argv = vec![
        session.layout.hook_manager.clone(),
        "run".into(),
        "--all-files".into(),
    ];
    if session.ci() {
        argv.push("--show-diff-on-failure".into());
    }
    argv.extend(posargs.iter().cloned());
    session.run(&argv)?;

    Ok(())
}

fn linkcheck(session: &mut Session, posargs: &[String]) -> Result<()> {
    let layout = &session.layout;
    let invocation = Invocation {
        base: &layout.build_invocation,
        builder: LINKCHECK_BUILDER,
        build_options: &layout.build_options,
        extra_options: &[],
        source_dir: &layout.source_dir,
        build_root: &layout.build_root,
        build_dir: None,
        color: session.ci(),
    };
    session.run(&invocation.construct(posargs))?;

    Ok(())
}

fn install_hooks(session: &mut Session, _posargs: &[String]) -> Result<()> {
    run_hook_manager(session, "install")
}

fn uninstall_hooks(session: &mut Session, _posargs: &[String]) -> Result<()> {
    run_hook_manager(session, "uninstall")
}

fn run_hook_manager(session: &Session, action: &str) -> Result<()> {
    session.run(&[
        session.layout.hook_manager.clone(),
        action.into(),
        "--hook-type".into(),
        "pre-commit".into(),
        "--hook-type".into(),
        "commit-msg".into(),
    ])?;

    Ok(())
}
