// SPDX-FileCopyrightText: 2025 Docket contributors
// SPDX-License-Identifier: MIT

//! Named task implementations.
//!
//! Every task has the same shape: a function taking the shared [`Session`]
//! plus the raw trailing posargs of the CLI invocation, performing side
//! effects (subprocess runs, file writes) and returning no meaningful value.
//! Each submodule groups the tasks of one concern and exposes them as
//! [`Task`](crate::dispatch::Task) constants for the CLI to assemble into
//! ordered lists.
//!
//! Tasks never reinterpret the failures of the tools they drive. A non-zero
//! exit aborts the task, and with it the rest of the dispatch, carrying the
//! tool's own output.

pub mod admin;
pub mod build;
pub mod check;
pub mod deploy;
pub mod i18n;
pub mod install;
pub mod scm;

use crate::{args::Invocation, config::ProjectLayout};

use std::path::PathBuf;

/// Builder invocation recipe shared by the build, check, and i18n tasks.
pub(crate) fn builder_invocation(layout: &ProjectLayout, color: bool) -> Invocation<'_> {
    Invocation {
        base: &layout.build_invocation,
        builder: &layout.html_builder,
        build_options: &layout.build_options,
        extra_options: &[],
        source_dir: &layout.source_dir,
        build_root: &layout.build_root,
        build_dir: None,
        color,
    }
}

/// All possible error types for task execution.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// Argument normalization failed.
    #[error(transparent)]
    Args(#[from] crate::args::ArgsError),

    /// A collaborator primitive failed.
    #[error(transparent)]
    Session(#[from] crate::session::SessionError),

    /// Home directory resolution failed.
    #[error(transparent)]
    Path(#[from] crate::path::NoWayHome),

    /// A generated directory could not be removed.
    #[error("cannot remove generated directory {path:?}")]
    Clean {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A scratch build directory could not be created.
    #[error("cannot create scratch build directory")]
    Scratch(#[source] std::io::Error),

    /// A catalog file glob pattern was malformed.
    #[error(transparent)]
    CatalogPattern(#[from] glob::PatternError),

    /// A catalog file glob entry could not be read.
    #[error(transparent)]
    CatalogEntry(#[from] glob::GlobError),

    /// A translation catalog file could not be copied or removed.
    #[error("cannot update translation catalog {path:?}")]
    Catalog {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The pinned-version manifest could not be read.
    #[error("cannot read version manifest {path:?}")]
    Manifest {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Dev repository discovery failed.
    #[error("cannot list dev repositories under {path:?}")]
    DevRepos {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Multi-version deployment preparation failed.
    #[error("cannot prepare multi-version layout at {path:?}")]
    Publish {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Friendly result alias.
pub type Result<T, E = TaskError> = std::result::Result<T, E>;
