// SPDX-FileCopyrightText: 2025 Docket contributors
// SPDX-License-Identifier: MIT

//! Translation catalog tasks.
//!
//! Documentation translation runs through gettext-style catalogs: the
//! gettext builder extracts message templates (`.pot`) out of the source
//! tree, the templates are checked in under the locale directory, and the
//! catalog tool folds them into per-language `.po` files that translators
//! edit. The tasks here automate those three steps.

use crate::{
    args::Invocation,
    dispatch::{Task, TaskRole},
    session::Session,
    tasks::{Result, TaskError},
};

use glob::glob;
use std::{fs, path::Path};
use tracing::info;

/// Extract fresh message templates with the gettext builder.
pub const BUILD_POT: Task = Task {
    name: "build-pot",
    role: TaskRole::Standard,
    run: build_pot,
};

/// Update the checked-in message templates with freshly built ones.
pub const COPY_POT: Task = Task {
    name: "copy-pot",
    role: TaskRole::Standard,
    run: copy_pot,
};

/// Fold message templates into per-language catalogs.
pub const UPDATE_PO: Task = Task {
    name: "update-po",
    role: TaskRole::Standard,
    run: update_po,
};

fn build_pot(session: &mut Session, posargs: &[String]) -> Result<()> {
    let layout = &session.layout;
    let invocation = Invocation {
        base: &layout.build_invocation,
        builder: &layout.gettext_builder,
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

fn copy_pot(session: &mut Session, _posargs: &[String]) -> Result<()> {
    let layout = &session.layout;
    let pot_dir = layout.pot_dir();

    if pot_dir.exists() {
        for entry in glob(&pot_pattern(&pot_dir))? {
            let stale = entry?;
            fs::remove_file(&stale).map_err(|err| TaskError::Catalog {
                path: stale.clone(),
                source: err,
            })?;
        }
    } else {
        mkdirp::mkdirp(&pot_dir).map_err(|err| TaskError::Catalog {
            path: pot_dir.clone(),
            source: err,
        })?;
    }

    for entry in glob(&pot_pattern(&layout.gettext_build_dir()))? {
        let pot_file = entry?;
        let Some(file_name) = pot_file.file_name() else {
            continue;
        };

        info!("copying {}", file_name.to_string_lossy());
        fs::copy(&pot_file, pot_dir.join(file_name)).map_err(|err| TaskError::Catalog {
            path: pot_file.clone(),
            source: err,
        })?;
    }

    Ok(())
}

fn update_po(session: &mut Session, posargs: &[String]) -> Result<()> {
    let layout = session.layout.clone();
    if let Some(tool) = layout.catalog_tool.first() {
        session.install(&[tool.clone()], false)?;
    }

    let mut posargs = posargs.to_vec();
    let mut lang_args = Vec::new();
    if let Some(idx) = posargs.iter().position(|arg| arg == "--all-languages") {
        posargs.remove(idx);
        for language in layout.languages() {
            lang_args.push("--language".to_string());
            lang_args.push(language);
        }
    } else if !posargs.iter().any(|arg| arg == "-l" || arg == "--language") {
        lang_args.push("--language".to_string());
        lang_args.push(layout.source_language.clone());
    }

    let mut argv = layout.catalog_tool.clone();
    argv.extend([
        "--config".to_string(),
        layout.conf_file.display().to_string(),
        "update".into(),
        "--pot-dir".into(),
        layout.pot_dir().display().to_string(),
        "--line-width".into(),
        layout.po_line_width.to_string(),
        "--no-obsolete".into(),
    ]);
    argv.extend(lang_args);
    argv.extend(posargs);
    session.run(&argv)?;

    Ok(())
}

fn pot_pattern(dir: &Path) -> String {
    format!("{}/*.pot", dir.display())
}
