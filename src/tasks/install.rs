// SPDX-FileCopyrightText: 2025 Docket contributors
// SPDX-License-Identifier: MIT

//! Dependency installation.
//!
//! Dependencies are bundled into named __groups__, each gated behind one
//! cheap canary probe: `doc` carries the documentation and dev tooling every
//! dispatch needs, `api` carries the editable checkouts required to generate
//! API autodocs. The dispatcher consults [`default_registry`] to decide what
//! is missing; the explicit `install` task lets users force the same
//! routines by hand.

use crate::{
    config::ProjectLayout,
    dispatch::{DependencyGroup, Registry, Task, TaskRole},
    path::home_dir,
    session::Session,
    tasks::{Result, TaskError},
};

use std::{
    collections::{BTreeSet, HashMap},
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

/// Names of all dependency groups, in registration order.
pub const GROUP_NAMES: [&str; 2] = ["doc", "api"];

/// Version pretended when the manifest pins nothing.
const FALLBACK_VERSION: &str = "0.0.0";

/// Install the project's dependencies, passing extra args to the installer.
pub const INSTALL: Task = Task {
    name: "install",
    role: TaskRole::Installer,
    run: install,
};

/// Build the default dependency-group registry for a project.
///
/// The `doc` group is probed on every dispatch; the `api` group only when a
/// task requests it by name. The `api` probe runs with the user's home
/// directory exported, since application probes tend to need one even under
/// a cleared environment.
///
/// # Errors
///
/// - Return [`NoWayHome`](crate::path::NoWayHome) if the home directory
///   cannot be determined.
pub fn default_registry(layout: &ProjectLayout) -> crate::path::Result<Registry> {
    let mut registry = Registry::new();

    registry.add_group(
        DependencyGroup {
            name: "doc".into(),
            probe: vec![layout.hook_manager.clone(), "--version".into()],
            default: true,
            env: HashMap::new(),
        },
        install_doc,
    );

    let mut env = HashMap::new();
    env.insert("HOME".to_string(), home_dir()?.display().to_string());
    registry.add_group(
        DependencyGroup {
            name: "api".into(),
            probe: layout.api_probe.clone(),
            default: false,
            env,
        },
        install_api,
    );

    Ok(registry)
}

fn install(session: &mut Session, posargs: &[String]) -> Result<()> {
    let mut tags = BTreeSet::from(["doc"]);
    let mut passthrough = posargs.to_vec();

    for name in GROUP_NAMES {
        let flag = format!("--{name}");
        if posargs.iter().any(|arg| *arg == flag || arg == name) {
            tags.insert(name);
            passthrough.retain(|arg| *arg != flag && arg != name);
        }
    }

    for tag in tags {
        match tag {
            "doc" => install_doc(session, &passthrough)?,
            "api" => install_api(session, &passthrough)?,
            _ => {}
        }
    }

    Ok(())
}

/// Install the basic documentation and dev dependencies.
fn install_doc(session: &mut Session, posargs: &[String]) -> Result<()> {
    let layout = session.layout.clone();

    let pinned = format!("{}{}", layout.hook_manager, layout.hook_manager_spec);
    session.install(&[pinned], true)?;

    for requirements in &layout.requirements {
        let mut args = vec!["-r".to_string(), requirements.clone()];
        args.extend(posargs.iter().cloned());
        session.install(&args, true)?;
    }

    Ok(())
}

/// Install the dependencies needed to generate API autodocs.
fn install_api(session: &mut Session, posargs: &[String]) -> Result<()> {
    let layout = session.layout.clone();

    for repo in list_dev_repos(&layout)? {
        let mut env = HashMap::new();
        if !layout.pretend_version_repo.is_empty()
            && repo.to_string_lossy().contains(&layout.pretend_version_repo)
        {
            // The checkout has no release tags, so its build backend needs
            // the pinned version handed to it explicitly.
            env.insert(
                "SETUPTOOLS_SCM_PRETEND_VERSION".to_string(),
                pinned_version(&layout)?,
            );
        }

        let mut args = vec!["-e".to_string(), repo.display().to_string()];
        args.extend(posargs.iter().cloned());
        session.install_env(&args, true, &env)?;
    }

    Ok(())
}

/// List the dev repositories vendored under the API submodule.
///
/// The submodule itself counts when it carries a build manifest, followed by
/// every non-hidden manifest-carrying directory under its dependency
/// subdirectory, in name order.
pub fn list_dev_repos(layout: &ProjectLayout) -> Result<Vec<PathBuf>> {
    let mut repos = Vec::new();
    if has_manifest(&layout.api_repo) {
        repos.push(layout.api_repo.clone());
    }

    let deps_dir = layout.api_deps_dir();
    if !deps_dir.exists() {
        return Ok(repos);
    }

    let mut entries: Vec<_> = fs::read_dir(&deps_dir)
        .and_then(|dir| dir.collect::<std::io::Result<Vec<_>>>())
        .map_err(|err| TaskError::DevRepos {
            path: deps_dir.clone(),
            source: err,
        })?;
    entries.sort_by_key(fs::DirEntry::file_name);

    for entry in entries {
        let path = entry.path();
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        if path.is_dir() && has_manifest(&path) {
            debug!("found dev repository {:?}", path);
            repos.push(path);
        }
    }

    Ok(repos)
}

fn has_manifest(path: &Path) -> bool {
    path.join("setup.py").exists() || path.join("pyproject.toml").exists()
}

fn pinned_version(layout: &ProjectLayout) -> Result<String> {
    let manifest = layout.version_manifest_path();
    let content = fs::read_to_string(&manifest).map_err(|err| TaskError::Manifest {
        path: manifest.clone(),
        source: err,
    })?;

    Ok(extract_pinned_version(&content, &layout.pretend_version_repo))
}

/// Pull the pinned version of a package out of a requirements manifest.
///
/// Looks for the first line mentioning the package and returns the version
/// of its first exact-ish specifier clause (`>=`, `==`, or `<=`). Falls back
/// to `0.0.0` when nothing is pinned.
fn extract_pinned_version(content: &str, package: &str) -> String {
    for line in content.lines() {
        if !line.contains(package) {
            continue;
        }

        let spec = line.trim().trim_start_matches('-').trim();
        let spec = spec.strip_prefix(package).unwrap_or(spec).trim();
        for clause in spec.split(',') {
            let clause = clause.trim();
            let version = clause
                .strip_prefix(">=")
                .or_else(|| clause.strip_prefix("=="))
                .or_else(|| clause.strip_prefix("<="));
            if let Some(version) = version {
                return version.trim().to_string();
            }
        }

        break;
    }

    FALLBACK_VERSION.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;
    use simple_test_case::test_case;

    #[test_case("- python-lsp-server >=1.12.0,<1.13.0", "1.12.0"; "lower bound pin")]
    #[test_case("- python-lsp-server ==1.12.0", "1.12.0"; "exact pin")]
    #[test_case("- python-lsp-server <1.13.0", "0.0.0"; "no exactish clause")]
    #[test_case("- something-else >=2.0", "0.0.0"; "package absent")]
    #[test]
    fn extract_pinned_version_reads_specifier(line: &str, expect: &str) {
        use pretty_assertions::assert_eq;

        let content = format!("dependencies:\n{line}\n- other-package >=9.9\n");
        assert_eq!(
            extract_pinned_version(&content, "python-lsp-server"),
            expect,
        );
    }

    #[sealed_test]
    fn list_dev_repos_finds_manifest_carrying_checkouts() -> anyhow::Result<()> {
        let layout = ProjectLayout::load(None)?;
        mkdirp::mkdirp(layout.api_repo.join("external-deps/zeta"))?;
        mkdirp::mkdirp(layout.api_repo.join("external-deps/alpha"))?;
        mkdirp::mkdirp(layout.api_repo.join("external-deps/.hidden"))?;
        mkdirp::mkdirp(layout.api_repo.join("external-deps/no-manifest"))?;
        fs::write(layout.api_repo.join("setup.py"), "")?;
        fs::write(layout.api_repo.join("external-deps/zeta/pyproject.toml"), "")?;
        fs::write(layout.api_repo.join("external-deps/alpha/setup.py"), "")?;
        fs::write(layout.api_repo.join("external-deps/.hidden/setup.py"), "")?;

        let repos = list_dev_repos(&layout)?;

        let expect = vec![
            layout.api_repo.clone(),
            layout.api_repo.join("external-deps/alpha"),
            layout.api_repo.join("external-deps/zeta"),
        ];
        assert_eq!(repos, expect);

        Ok(())
    }

    #[sealed_test]
    fn install_doc_records_pinned_hook_manager() -> anyhow::Result<()> {
        let layout = ProjectLayout {
            installer: vec!["true".into()],
            ..ProjectLayout::load(None)?
        };
        let mut session = Session::new(layout);

        install_doc(&mut session, &[])?;

        assert_eq!(session.installed()[0], "pre-commit>=2.10.0,<4");
        assert!(session
            .installed()
            .contains(&"requirements.txt".to_string()));

        Ok(())
    }

    #[sealed_test]
    fn install_selects_requested_groups() -> anyhow::Result<()> {
        let layout = ProjectLayout {
            installer: vec!["true".into()],
            ..ProjectLayout::load(None)?
        };
        let mut session = Session::new(layout);

        // Group selectors must not leak into the installer passthrough.
        install(&mut session, &["--api".to_string()])?;
        assert!(!session.installed().contains(&"--api".to_string()));

        Ok(())
    }

    #[sealed_test]
    fn pinned_version_reads_manifest_from_layout() -> anyhow::Result<()> {
        let layout = ProjectLayout {
            pretend_version_repo: "python-lsp-server".into(),
            ..ProjectLayout::load(None)?
        };
        let manifest = layout.version_manifest_path();
        mkdirp::mkdirp(manifest.parent().unwrap())?;
        fs::write(
            &manifest,
            indoc! {"
                dependencies:
                - python-lsp-server >=1.12.0,<1.13.0
            "},
        )?;

        assert_eq!(pinned_version(&layout)?, "1.12.0");
        Ok(())
    }
}
