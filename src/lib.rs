// SPDX-FileCopyrightText: 2025 Docket contributors
// SPDX-License-Identifier: MIT

//! Task runner to build, check, and publish documentation sites.
//!
//! Docket owns no build logic of its own. Every task ultimately shells out
//! to an external tool: the documentation builder renders the site, git
//! wires up remotes and submodules, the commit-hook manager lints, the
//! package installer provisions dependencies. What this crate contributes is
//! the glue worth getting right once: reshaping flat argument lists into
//! structured tool invocations ([`args`]), probing and provisioning
//! dependency groups before tasks run ([`dispatch`]), and sequencing named
//! tasks against one shared execution context ([`session`]).
//!
//! # Dispatch Model
//!
//! The CLI maps each subcommand to an ordered list of [`Task`] values and
//! hands the list to [`dispatch::dispatch`]. Tasks run strictly one after
//! another, sharing a single [`Session`]; a later task may rely on the files
//! written or packages installed by an earlier one. There is no parallelism,
//! no async suspension, and no rollback: the first failure aborts the rest
//! of the list and surfaces the failing tool's own output.
//!
//! [`Task`]: crate::dispatch::Task
//! [`Session`]: crate::session::Session

pub mod args;
pub mod config;
pub mod dispatch;
pub mod path;
pub mod session;
pub mod tasks;

pub use config::ProjectLayout;
pub use dispatch::{dispatch, Registry, Task};
pub use session::Session;
