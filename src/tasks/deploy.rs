// SPDX-FileCopyrightText: 2025 Docket contributors
// SPDX-License-Identifier: MIT

//! Deployment preparation tasks.
//!
//! The published site keeps one directory per major documentation version,
//! with a canonical alias directory for the version visitors should land on
//! and redirect stubs at the old flat URLs. A plain build produces a flat
//! tree, so before deployment the tree is reshuffled into that layout.

use crate::{
    dispatch::{Task, TaskRole},
    session::Session,
    tasks::{Result, TaskError},
};

use glob::glob;
use std::{
    fs,
    io::Error as IoError,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

#[cfg(target_os = "macos")]
const OPENER: &str = "open";
#[cfg(windows)]
const OPENER: &str = "explorer";
#[cfg(not(any(target_os = "macos", windows)))]
const OPENER: &str = "xdg-open";

/// Open the built site in a web browser.
pub const SERVE: Task = Task {
    name: "serve",
    role: TaskRole::Standard,
    run: serve,
};

/// Reshuffle the built HTML tree into the multi-version layout.
pub const PREPARE_MULTIVERSION: Task = Task {
    name: "prepare-multiversion",
    role: TaskRole::Standard,
    run: prepare_multiversion,
};

fn serve(session: &mut Session, _posargs: &[String]) -> Result<()> {
    let index = session.layout.html_index();
    session.run(&[OPENER.to_string(), format!("file://{}", index.display())])?;

    Ok(())
}

fn prepare_multiversion(session: &mut Session, _posargs: &[String]) -> Result<()> {
    let layout = &session.layout;
    let html_dir = layout.html_build_dir();
    let latest_dir = html_dir.join(layout.latest_version.to_string());

    // Move the flat build under the versioned directory. Entries are
    // collected up front since the directory is mutated while moving.
    mkdirp::mkdirp(&latest_dir).map_err(publish_error(&latest_dir))?;
    let entries: Vec<_> = fs::read_dir(&html_dir)
        .map_err(publish_error(&html_dir))?
        .collect::<std::io::Result<_>>()
        .map_err(publish_error(&html_dir))?;
    for entry in entries {
        if entry.path() == latest_dir {
            continue;
        }
        fs::rename(entry.path(), latest_dir.join(entry.file_name()))
            .map_err(publish_error(&entry.path()))?;
    }

    let current_dir = html_dir.join(&layout.default_version_name);
    if !current_dir.exists() {
        info!(
            "copying version {} to {:?}",
            layout.latest_version, layout.default_version_name
        );
        copy_dir(&latest_dir, &current_dir).map_err(publish_error(&current_dir))?;
    }

    generate_redirects(&html_dir, &layout.default_version_name, &layout.base_url)?;

    Ok(())
}

/// Write a redirect stub at every flat URL of the canonical version.
///
/// Pages that already exist at the flat location are left alone, so stubs
/// never clobber real content.
fn generate_redirects(html_dir: &Path, canonical: &str, base_url: &str) -> Result<()> {
    let canonical_dir = html_dir.join(canonical);
    let pattern = format!("{}/**/*.html", canonical_dir.display());

    for entry in glob(&pattern)? {
        let page = entry?;
        let rel = page.strip_prefix(&canonical_dir).unwrap_or(&page).to_path_buf();
        let stub = html_dir.join(&rel);
        if stub.exists() {
            continue;
        }

        if let Some(parent) = stub.parent() {
            mkdirp::mkdirp(parent).map_err(publish_error(parent))?;
        }

        let target = format!("{base_url}{canonical}/{}", rel.display());
        debug!("writing redirect stub {:?} -> {target}", stub);
        fs::write(&stub, redirect_page(&target)).map_err(publish_error(&stub))?;
    }

    Ok(())
}

fn redirect_page(target: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <meta http-equiv="refresh" content="0; url={target}">
    <link rel="canonical" href="{target}">
    <title>Redirecting...</title>
  </head>
  <body>
    <p>This page has moved to <a href="{target}">{target}</a>.</p>
  </body>
</html>
"#
    )
}

fn copy_dir(src: &Path, dst: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }

    Ok(())
}

fn publish_error(path: &Path) -> impl FnOnce(IoError) -> TaskError {
    let path: PathBuf = path.to_path_buf();
    move |source| TaskError::Publish { path, source }
}
