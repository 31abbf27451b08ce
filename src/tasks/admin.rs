// SPDX-FileCopyrightText: 2025 Docket contributors
// SPDX-License-Identifier: MIT

//! Housekeeping tasks.

use crate::{
    dispatch::{Task, TaskRole},
    session::{Session, SessionError},
    tasks::{Result, TaskError},
};

use std::fs;
use tracing::{info, warn};

/// Remove the generated build directories.
pub const CLEAN: Task = Task {
    name: "clean",
    role: TaskRole::Standard,
    run: clean,
};

/// Run an arbitrary command invocation in the project environment.
pub const RUN: Task = Task {
    name: "run",
    role: TaskRole::Standard,
    run: run_command,
};

fn clean(session: &mut Session, posargs: &[String]) -> Result<()> {
    let should_ignore = posargs.iter().any(|arg| arg == "--ignore" || arg == "-i");

    for dir in &session.layout.clean_dirs {
        if !dir.exists() {
            continue;
        }

        info!("removing generated directory {:?}", dir);
        if let Err(err) = fs::remove_dir_all(dir) {
            if err.kind() == std::io::ErrorKind::NotFound {
                continue;
            }
            if should_ignore {
                warn!("ignoring removal failure in {:?}: {err}", dir);
                continue;
            }

            warn!("pass '--ignore' to tolerate removal failures");
            return Err(TaskError::Clean {
                path: dir.clone(),
                source: err,
            });
        }
    }

    Ok(())
}

fn run_command(session: &mut Session, posargs: &[String]) -> Result<()> {
    if posargs.is_empty() {
        return Err(SessionError::MissingInvocation.into());
    }

    session.run(posargs)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectLayout;
    use sealed_test::prelude::*;
    use std::path::Path;

    #[sealed_test]
    fn clean_removes_generated_directories() -> anyhow::Result<()> {
        let mut session = Session::new(ProjectLayout::load(None)?);
        mkdirp::mkdirp("docs/_build/html")?;
        fs::write("docs/_build/html/index.html", "<p>home</p>")?;

        clean(&mut session, &[])?;

        assert!(!Path::new("docs/_build").exists());
        Ok(())
    }

    #[sealed_test]
    fn clean_skips_missing_directories() -> anyhow::Result<()> {
        let mut session = Session::new(ProjectLayout::load(None)?);
        clean(&mut session, &[])?;
        Ok(())
    }

    #[test]
    fn run_requires_a_command_invocation() {
        let mut session = Session::new(ProjectLayout::default());
        let result = run_command(&mut session, &[]);
        assert!(matches!(
            result,
            Err(TaskError::Session(SessionError::MissingInvocation))
        ));
    }

    #[test]
    fn run_passes_tokens_through() {
        let mut session = Session::new(ProjectLayout::default());
        let posargs = vec!["true".to_string(), "ignored".into()];
        assert!(run_command(&mut session, &posargs).is_ok());
    }
}
