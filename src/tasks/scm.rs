// SPDX-FileCopyrightText: 2025 Docket contributors
// SPDX-License-Identifier: MIT

//! Repository setup tasks.
//!
//! A fresh clone of a documentation repository needs a handful of one-time
//! git arrangements: an `origin` remote pointing at the contributor's fork
//! with an `upstream` remote pointing at the organization, the same again
//! inside the vendored submodule, submodule recursion switched on, and noisy
//! revisions hidden from `git blame`. Each arrangement is its own task so
//! the composite setup command can sequence them.
//!
//! All tasks here drive the external `git` binary; nothing touches
//! repository internals directly.

use crate::{
    args::{extract_option_values, ArgsError},
    dispatch::{Task, TaskRole},
    session::Session,
    tasks::Result,
};

use tracing::warn;

/// Set up the origin and upstream remote repositories.
pub const SETUP_REMOTES: Task = Task {
    name: "setup-remotes",
    role: TaskRole::Standard,
    run: setup_remotes,
};

/// Point the submodule's upstream remote at the organization repository.
pub const SETUP_SUBMODULE_REMOTES: Task = Task {
    name: "setup-submodule-remotes",
    role: TaskRole::Standard,
    run: setup_submodule_remotes,
};

/// Initialize and download all submodules.
pub const INIT_SUBMODULES: Task = Task {
    name: "init-submodules",
    role: TaskRole::Standard,
    run: init_submodules,
};

/// Configure git to recurse into submodules automatically.
pub const CONFIG_SUBMODULES: Task = Task {
    name: "config-submodules",
    role: TaskRole::Standard,
    run: config_submodules,
};

/// Wire the ignored-revisions file into `git blame`.
pub const IGNORE_REVS: Task = Task {
    name: "ignore-revs",
    role: TaskRole::Standard,
    run: ignore_revs,
};

/// Rebase the submodule onto the latest upstream branch.
pub const SYNC_UPSTREAM: Task = Task {
    name: "sync-upstream",
    role: TaskRole::Standard,
    run: sync_upstream,
};

fn setup_remotes(session: &mut Session, posargs: &[String]) -> Result<()> {
    let layout = &session.layout;
    let https = posargs.iter().any(|arg| arg == "--https");
    let ssh = posargs.iter().any(|arg| arg == "--ssh");
    if https == ssh {
        return Err(ArgsError::ConflictingOptions {
            first: "--https".into(),
            second: "--ssh".into(),
        }
        .into());
    }

    let (username_args, _) = extract_option_values(posargs, &["--username"], false);

    // Current origin details decide the fork coordinates.
    let origin_url = session.run_captured(&argv(&["git", "remote", "get-url", "origin"]))?;
    let (mut origin_user, origin_repo) = parse_remote_url(&origin_url);

    if let Some(username) = username_args.first() {
        origin_user = username.trim().trim_start_matches('@').to_string();
    } else if origin_user.eq_ignore_ascii_case(&layout.org_name) {
        warn!(
            "origin remote currently set to upstream; should be your fork. \
             To fix, fork the repository and pass --username <your username>"
        );
    }

    let existing: Vec<String> = session
        .run_captured(&argv(&["git", "remote"]))?
        .lines()
        .map(str::to_string)
        .collect();

    for (remote, user, repo) in [
        ("origin", origin_user.as_str(), origin_repo.as_str()),
        ("upstream", layout.org_name.as_str(), layout.repo_name.as_str()),
    ] {
        let action = if existing.iter().any(|name| name == remote) {
            "set-url"
        } else {
            "add"
        };
        let fetch_url = fill_template(&layout.https_template, user, repo);
        session.run(&argv(&["git", "remote", action, remote, &fetch_url]))?;

        let push_url = if ssh {
            fill_template(&layout.ssh_template, user, repo)
        } else {
            fetch_url
        };
        session.run(&argv(&["git", "remote", "set-url", "--push", remote, &push_url]))?;
    }

    session.run(&argv(&["git", "fetch", "--all"]))?;

    Ok(())
}

fn setup_submodule_remotes(session: &mut Session, _posargs: &[String]) -> Result<()> {
    let layout = &session.layout;

    let existing = session.run_captured(&foreach("git remote"))?;
    if existing.lines().any(|name| name == "upstream") {
        return Ok(());
    }

    let repo = layout
        .api_repo
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let url = fill_template(&layout.https_template, &layout.org_name, &repo);

    session.run(&foreach(&format!("git remote add upstream '{url}'")))?;
    session.run(&foreach("git fetch --all"))?;

    Ok(())
}

fn init_submodules(session: &mut Session, _posargs: &[String]) -> Result<()> {
    session.run(&argv(&["git", "submodule", "update", "--init"]))?;
    Ok(())
}

fn config_submodules(session: &mut Session, _posargs: &[String]) -> Result<()> {
    session.run(&argv(&[
        "git",
        "config",
        "--local",
        "submodule.recurse",
        "true",
    ]))?;
    session.run(&argv(&[
        "git",
        "config",
        "--local",
        "push.recurseSubmodules",
        "check",
    ]))?;

    Ok(())
}

fn ignore_revs(session: &mut Session, _posargs: &[String]) -> Result<()> {
    if session.layout.ignore_revs_file.is_empty() {
        return Ok(());
    }

    session.run(&argv(&[
        "git",
        "config",
        "blame.ignoreRevsFile",
        &session.layout.ignore_revs_file,
    ]))?;

    Ok(())
}

fn sync_upstream(session: &mut Session, _posargs: &[String]) -> Result<()> {
    let branch = &session.layout.upstream_branch;
    session.run(&foreach(&format!(
        "git fetch upstream {branch} && git rebase FETCH_HEAD"
    )))?;

    Ok(())
}

/// Split a remote URL into its user and repository components.
///
/// Handles both HTTPS URLs and SCP-style SSH URLs; a trailing `.git` suffix
/// is stripped from the repository name.
fn parse_remote_url(url: &str) -> (String, String) {
    let path = if url.contains("https://") {
        url
    } else {
        url.rsplit(':').next().unwrap_or(url)
    };

    let path = path.strip_suffix(".git").unwrap_or(path);
    let mut parts = path.rsplit('/');
    let repo = parts.next().unwrap_or_default().to_string();
    let user = parts.next().unwrap_or_default().to_string();

    (user, repo)
}

fn fill_template(template: &str, user: &str, repo: &str) -> String {
    template.replace("{user}", user).replace("{repo}", repo)
}

fn argv(raw: &[&str]) -> Vec<String> {
    raw.iter().map(ToString::to_string).collect()
}

fn foreach(command: &str) -> Vec<String> {
    let mut tokens = argv(&["git", "submodule", "--quiet", "foreach"]);
    tokens.push(command.to_string());
    tokens
}
