// SPDX-FileCopyrightText: 2025 Docket contributors
// SPDX-License-Identifier: MIT

use docket::{
    dispatch::{dispatch, Task},
    session::Session,
    tasks::{admin, build, check, deploy, i18n, install, scm},
    ProjectLayout,
};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::{path::PathBuf, process::exit};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "docket [options] <task> [--] [posargs]...",
    subcommand_help_heading = "Tasks",
    version
)]
struct Cli {
    /// Path to the project layout file.
    #[arg(short, long, value_name = "path", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        let layout = ProjectLayout::load(self.config.as_deref())?;
        let registry = install::default_registry(&layout)?;
        let mut session = Session::new(layout);

        let (tasks, posargs) = self.command.plan();
        dispatch(&registry, &tasks, &mut session, &posargs)?;

        Ok(())
    }
}

#[derive(Args, Clone, Debug)]
struct TaskArgs {
    /// Extra arguments forwarded to the underlying tools.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "posargs")]
    posargs: Vec<String>,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Build the project.
    Build(TaskArgs),

    /// Build the documentation.
    Docs(TaskArgs),

    /// Rebuild the docs continuously as source files are changed.
    #[command(alias = "autorebuild")]
    Autobuild(TaskArgs),

    /// Build the project in multiple languages (specify with '--lang').
    BuildLanguages(TaskArgs),

    /// Build the project for deployment in all languages.
    BuildMultilanguage(TaskArgs),

    /// Build and prepare the project for production deployment.
    BuildDeployment(TaskArgs),

    /// Get help with the project build.
    BuildHelp(TaskArgs),

    /// Build the gettext message templates for the project.
    BuildPot(TaskArgs),

    /// Update the checked-in message templates with the built ones.
    CopyPot(TaskArgs),

    /// Rebuild message templates and update the existing ones.
    UpdatePot(TaskArgs),

    /// Update per-language catalogs from templates (pass "-l LANG").
    UpdatePo(TaskArgs),

    /// Rebuild and update the templates, and update the source catalogs.
    UpdatePoPot(TaskArgs),

    /// Install the project's dependencies (passes through args).
    Install(TaskArgs),

    /// Install the project's commit hooks.
    InstallHooks(TaskArgs),

    /// Uninstall the project's commit hooks.
    UninstallHooks(TaskArgs),

    /// Lint the project.
    Lint(TaskArgs),

    /// Check that links in the project are valid.
    Linkcheck(TaskArgs),

    /// Clean build artifacts (pass '--ignore' to tolerate errors).
    Clean(TaskArgs),

    /// Run any command in the project environment.
    Run(TaskArgs),

    /// Display the built project.
    Serve(TaskArgs),

    /// Prepare the project for multi-version deployment.
    PrepareMultiversion(TaskArgs),

    /// Set up the git remotes; pass --https or --ssh to pick the URL type.
    SetupRemotes(TaskArgs),

    /// Point the submodule upstream remote at the organization repository.
    SetupSubmoduleRemotes(TaskArgs),

    /// Initialize and download all git submodules.
    InitSubmodules(TaskArgs),

    /// Configure git to automatically recurse into submodules.
    ConfigSubmodules(TaskArgs),

    /// Configure git to ignore noisy revisions in blame.
    IgnoreRevs(TaskArgs),

    /// Sync the submodule with the latest upstream branch.
    SyncUpstream(TaskArgs),

    /// Set up the project; pass --https or --ssh to pick the git URL type.
    Setup(TaskArgs),
}

impl Command {
    /// Map this command to its ordered task list plus raw posargs.
    fn plan(self) -> (Vec<Task>, Vec<String>) {
        match self {
            Self::Build(args) | Self::Docs(args) => (vec![build::DOCS], args.posargs),
            Self::Autobuild(args) => (vec![build::AUTOBUILD], args.posargs),
            Self::BuildLanguages(args) => (vec![build::BUILD_LANGUAGES], args.posargs),
            Self::BuildMultilanguage(args) => {
                (vec![build::DOCS, build::BUILD_LANGUAGES], args.posargs)
            }
            Self::BuildDeployment(args) => (
                vec![
                    build::DOCS,
                    build::BUILD_LANGUAGES,
                    deploy::PREPARE_MULTIVERSION,
                ],
                args.posargs,
            ),
            Self::BuildHelp(args) => (vec![build::BUILD_HELP], args.posargs),
            Self::BuildPot(args) => (vec![i18n::BUILD_POT], args.posargs),
            Self::CopyPot(args) => (vec![i18n::COPY_POT], args.posargs),
            Self::UpdatePot(args) => (vec![i18n::BUILD_POT, i18n::COPY_POT], args.posargs),
            Self::UpdatePo(args) => (vec![i18n::UPDATE_PO], args.posargs),
            Self::UpdatePoPot(args) => (
                vec![i18n::BUILD_POT, i18n::COPY_POT, i18n::UPDATE_PO],
                args.posargs,
            ),
            Self::Install(args) => (vec![install::INSTALL], args.posargs),
            Self::InstallHooks(args) => (vec![check::INSTALL_HOOKS], args.posargs),
            Self::UninstallHooks(args) => (vec![check::UNINSTALL_HOOKS], args.posargs),
            Self::Lint(args) => (vec![check::LINT], args.posargs),
            Self::Linkcheck(args) => (vec![check::LINKCHECK], args.posargs),
            Self::Clean(args) => (vec![admin::CLEAN], args.posargs),
            Self::Run(args) => (vec![admin::RUN], args.posargs),
            Self::Serve(args) => (vec![deploy::SERVE], args.posargs),
            Self::PrepareMultiversion(args) => (vec![deploy::PREPARE_MULTIVERSION], args.posargs),
            Self::SetupRemotes(args) => (vec![scm::SETUP_REMOTES], args.posargs),
            Self::SetupSubmoduleRemotes(args) => {
                (vec![scm::SETUP_SUBMODULE_REMOTES], args.posargs)
            }
            Self::InitSubmodules(args) => (vec![scm::INIT_SUBMODULES], args.posargs),
            Self::ConfigSubmodules(args) => (vec![scm::CONFIG_SUBMODULES], args.posargs),
            Self::IgnoreRevs(args) => (vec![scm::IGNORE_REVS], args.posargs),
            Self::SyncUpstream(args) => (vec![scm::SYNC_UPSTREAM], args.posargs),
            Self::Setup(args) => (
                vec![
                    scm::IGNORE_REVS,
                    scm::CONFIG_SUBMODULES,
                    scm::INIT_SUBMODULES,
                    scm::SETUP_SUBMODULE_REMOTES,
                    scm::SETUP_REMOTES,
                    check::INSTALL_HOOKS,
                    admin::CLEAN,
                ],
                args.posargs,
            ),
        }
    }
}

fn main() {
    let layer = fmt::layer().compact();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry().with(layer).with(filter).init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}
