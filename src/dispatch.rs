// SPDX-FileCopyrightText: 2025 Docket contributors
// SPDX-License-Identifier: MIT

//! Task registry and dispatch.
//!
//! A __task__ is a named, parameterless unit of work running against the
//! shared [`Session`] and producing side effects only. The CLI maps each of
//! its subcommands to an ordered list of tasks and hands that list to
//! [`dispatch`], which makes sure the execution context is usable before any
//! task runs: it probes each relevant dependency group with a cheap canary
//! command and installs the groups whose probe fails.
//!
//! # Probing
//!
//! Probing is best effort by design. A probe command exiting non-zero, or
//! failing to spawn at all, means nothing more than "not installed yet" and
//! schedules the group for installation; it is never surfaced as an error.
//! The cost of this simplicity is that a probe failing for an unrelated
//! reason (a broken probe command, permissions) is indistinguishable from a
//! missing dependency and triggers a redundant reinstall, which is harmless.
//!
//! A group needed by several tasks in the same dispatch is probed and
//! installed at most once, because inclusion is resolved up front over the
//! whole dispatch rather than per task.
//!
//! # Registry
//!
//! The registry is an explicit value constructed at startup and passed into
//! the dispatcher by reference. Fabricating a registry with stub groups and
//! install routines is all a test needs to exercise dispatch behavior.

use crate::{session::Session, tasks::TaskError};

use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

/// Work function of a task, run against the shared session with the raw
/// trailing posargs of the CLI invocation.
pub type TaskFn = fn(&mut Session, &[String]) -> Result<(), TaskError>;

/// Role a task plays during dispatch.
///
/// The installer is tagged explicitly instead of being recognized by
/// function identity, so the special case survives refactors and fabricated
/// test registries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TaskRole {
    /// Ordinary task; dependency groups are probed before it runs.
    #[default]
    Standard,

    /// The task is itself the installer; probing would be pointless.
    Installer,
}

/// A named task.
#[derive(Clone, Copy, Debug)]
pub struct Task {
    /// Name the task is known by in logs and posargs.
    pub name: &'static str,

    /// Role the task plays during dispatch.
    pub role: TaskRole,

    /// Work function.
    pub run: TaskFn,
}

/// A named bundle of installable packages gated behind one probe command.
#[derive(Clone, Debug, Default)]
pub struct DependencyGroup {
    /// Group name, also the posarg token that requests the group.
    pub name: String,

    /// Canary command probing whether the group is already satisfied.
    pub probe: Vec<String>,

    /// Whether the group is included in every dispatch by default.
    pub default: bool,

    /// Environment overlay applied only while probing.
    pub env: HashMap<String, String>,
}

/// Routine installing one dependency group.
pub type InstallFn = fn(&mut Session, &[String]) -> Result<(), TaskError>;

/// Registry of dependency groups and their install routines.
#[derive(Default)]
pub struct Registry {
    groups: Vec<DependencyGroup>,
    installers: HashMap<String, InstallFn>,
}

impl Registry {
    /// Construct an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dependency group along with its install routine.
    pub fn add_group(&mut self, group: DependencyGroup, install: InstallFn) {
        self.installers.insert(group.name.clone(), install);
        self.groups.push(group);
    }

    /// All registered dependency groups, in registration order.
    pub fn groups(&self) -> &[DependencyGroup] {
        &self.groups
    }

    /// Install routine registered for the named group.
    pub fn installer(&self, name: &str) -> Option<InstallFn> {
        self.installers.get(name).copied()
    }
}

/// Dispatch an ordered list of tasks against a shared session.
///
/// Dependency groups marked default, or named explicitly in `posargs`, are
/// probed first (skipped entirely when the leading task is the installer
/// itself); unsatisfied groups are installed with isolated resolution before
/// any task runs. Tasks then run strictly in caller order, each seeing the
/// side effects of its predecessors. The first task error aborts the
/// remainder and propagates unchanged; there is no rollback.
///
/// # Errors
///
/// - Return [`DispatchError::MalformedArguments`] if the task list is empty.
/// - Return [`DispatchError::UnknownGroup`] if an unsatisfied group has no
///   registered install routine.
/// - Return [`DispatchError::Task`] for any error raised by an install
///   routine or task.
pub fn dispatch(
    registry: &Registry,
    tasks: &[Task],
    session: &mut Session,
    posargs: &[String],
) -> Result<()> {
    let Some((first, _)) = tasks.split_first() else {
        return Err(DispatchError::MalformedArguments);
    };

    let included: Vec<&DependencyGroup> = registry
        .groups()
        .iter()
        .filter(|group| group.default || posargs.iter().any(|arg| *arg == group.name))
        .collect();

    let mut unsatisfied = BTreeSet::new();
    if first.role != TaskRole::Installer {
        let _quiet = session.suppressed();
        for group in &included {
            if !session.probe(&group.probe, &group.env) {
                debug!("dependency group {:?} needs installation", group.name);
                unsatisfied.insert(group.name.as_str());
            }
        }
    }

    if !unsatisfied.is_empty() {
        info!("installing dependencies in isolated environment...");
        for name in &unsatisfied {
            let install = registry
                .installer(name)
                .ok_or_else(|| DispatchError::UnknownGroup((*name).into()))?;
            install(session, &[])?;
        }
    }

    for task in tasks {
        debug!("running task {:?}", task.name);
        (task.run)(session, posargs)?;
    }

    Ok(())
}

/// All possible error types for task dispatch.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Caller passed an empty task list.
    #[error("must pass a list of tasks to execute")]
    MalformedArguments,

    /// An unsatisfied group has no install routine.
    #[error("no install routine registered for dependency group {0:?}")]
    UnknownGroup(String),

    /// A task or install routine failed.
    #[error(transparent)]
    Task(#[from] TaskError),
}

/// Friendly result alias.
pub type Result<T, E = DispatchError> = std::result::Result<T, E>;
