// SPDX-FileCopyrightText: 2025 Docket contributors
// SPDX-License-Identifier: MIT

//! Documentation build tasks.
//!
//! The heart of the whole tool: run the documentation builder over the source
//! tree, either once, continuously with a watch frontend, or once per
//! configured language.

use crate::{
    args::{extract_option_values, Invocation},
    dispatch::{Task, TaskRole},
    session::Session,
    tasks::{builder_invocation, Result, TaskError},
};

use tracing::info;

/// Build the documentation once.
pub const DOCS: Task = Task {
    name: "docs",
    role: TaskRole::Standard,
    run: docs,
};

/// Rebuild the documentation continuously as source files change.
pub const AUTOBUILD: Task = Task {
    name: "autobuild",
    role: TaskRole::Standard,
    run: autobuild,
};

/// Build the documentation once per configured language.
pub const BUILD_LANGUAGES: Task = Task {
    name: "build-languages",
    role: TaskRole::Standard,
    run: build_languages,
};

/// Print the builder's own help text.
pub const BUILD_HELP: Task = Task {
    name: "build-help",
    role: TaskRole::Standard,
    run: build_help,
};

fn docs(session: &mut Session, posargs: &[String]) -> Result<()> {
    let argv = builder_invocation(&session.layout, session.ci()).construct(posargs);
    session.run(&argv)?;
    Ok(())
}

fn autobuild(session: &mut Session, posargs: &[String]) -> Result<()> {
    let layout = session.layout.clone();
    if let Some(tool) = layout.autobuild_invocation.first() {
        session.install(&[tool.clone()], false)?;
    }

    // The watch frontend serves from a scratch directory; the real build
    // root stays untouched.
    let scratch = tempfile::tempdir().map_err(TaskError::Scratch)?;
    let mut base = layout.autobuild_invocation.clone();
    base.push(format!("--watch={}", layout.source_dir.display()));
    let extra = vec!["-a".to_string()];

    let invocation = Invocation {
        base: &base,
        builder: &layout.html_builder,
        build_options: &layout.build_options,
        extra_options: &extra,
        source_dir: &layout.source_dir,
        build_root: &layout.build_root,
        build_dir: Some(scratch.path().to_path_buf()),
        color: session.ci(),
    };
    session.run(&invocation.construct(posargs))?;

    Ok(())
}

fn build_languages(session: &mut Session, posargs: &[String]) -> Result<()> {
    let layout = &session.layout;
    let (languages, posargs) = extract_option_values(posargs, &["--lang", "--language"], true);
    let languages = if languages.is_empty() {
        layout.languages()
    } else {
        languages
    };

    for language in &languages {
        info!("building {language} translation");
        let extra = vec!["-D".to_string(), format!("language={language}")];
        let invocation = Invocation {
            base: &layout.build_invocation,
            builder: &layout.html_builder,
            build_options: &layout.build_options,
            extra_options: &extra,
            source_dir: &layout.source_dir,
            build_root: &layout.build_root,
            build_dir: Some(layout.html_build_dir().join(language)),
            color: session.ci(),
        };
        session.run(&invocation.construct(&posargs))?;
    }

    Ok(())
}

fn build_help(session: &mut Session, _posargs: &[String]) -> Result<()> {
    let mut argv = session.layout.build_invocation.clone();
    argv.push("--help".into());
    session.run(&argv)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectLayout;
    use sealed_test::prelude::*;

    fn stub_session() -> Session {
        // A no-op builder keeps the tasks runnable without any tool present.
        let layout = ProjectLayout {
            build_invocation: vec!["true".into()],
            installer: vec!["true".into()],
            autobuild_invocation: vec!["true".into()],
            ..ProjectLayout::load(None).unwrap()
        };
        Session::new(layout)
    }

    #[sealed_test]
    fn docs_runs_builder_invocation() {
        assert!(docs(&mut stub_session(), &[]).is_ok());
    }

    #[sealed_test]
    fn docs_accepts_builder_override_and_filenames() {
        let posargs = vec![
            "-b".to_string(),
            "linkcheck".into(),
            "--".into(),
            "index.rst".into(),
        ];
        assert!(docs(&mut stub_session(), &posargs).is_ok());
    }

    #[sealed_test]
    fn build_languages_builds_each_requested_language() {
        let posargs = vec!["--lang".to_string(), "es,fr".into()];
        assert!(build_languages(&mut stub_session(), &posargs).is_ok());
    }
}
