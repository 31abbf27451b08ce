// SPDX-FileCopyrightText: 2025 Docket contributors
// SPDX-License-Identifier: MIT

//! Project layout configuration.
//!
//! Specify the layout for the `docket.toml` configuration file that describes
//! the documentation project being driven: where the source tree lives, how
//! the builder tool is invoked, which languages are translated, and which
//! repositories the setup tasks wire together.
//!
//! Every field carries a default modeling a conventional Sphinx-style layout
//! (`docs/` source tree, `docs/_build` output root), so a project without a
//! `docket.toml` still gets a fully working task set. Deserialization applies
//! shell expansion to user-supplied paths and anchors them at the current
//! working directory, so downstream code only ever sees absolute paths.

use crate::path::absolutize;

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

/// Default name of the layout file looked up in the working directory.
pub const LAYOUT_FILE: &str = "docket.toml";

/// Documentation project layout.
///
/// Describes everything the tasks need to know about one project: repository
/// coordinates for the setup tasks, builder invocation details for the build
/// tasks, and translation catalog locations for the i18n tasks.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProjectLayout {
    /// Organization owning the upstream repository.
    pub org_name: String,

    /// Name of the upstream repository.
    pub repo_name: String,

    /// Template for HTTPS remote URLs, with `{user}` and `{repo}` holes.
    pub https_template: String,

    /// Template for SSH remote URLs, with `{user}` and `{repo}` holes.
    pub ssh_template: String,

    /// Documentation source directory.
    pub source_dir: PathBuf,

    /// Root directory for builder output, one subdirectory per builder.
    pub build_root: PathBuf,

    /// Builder configuration file handed to the catalog tool.
    pub conf_file: PathBuf,

    /// Tokens invoking the documentation builder.
    pub build_invocation: Vec<String>,

    /// Fixed options passed to every build.
    pub build_options: Vec<String>,

    /// Tokens invoking the watch-and-rebuild frontend of the builder.
    pub autobuild_invocation: Vec<String>,

    /// Builder producing the browsable site.
    pub html_builder: String,

    /// Builder producing translation message templates.
    pub gettext_builder: String,

    /// Language the documentation is written in.
    pub source_language: String,

    /// Languages the documentation is translated into.
    pub translation_languages: Vec<String>,

    /// Directory holding translation catalogs.
    pub locale_dir: PathBuf,

    /// Line width for wrapped catalog entries, zero to disable wrapping.
    pub po_line_width: u32,

    /// Tokens invoking the translation catalog tool.
    pub catalog_tool: Vec<String>,

    /// Number of the newest published documentation version.
    pub latest_version: u32,

    /// Directory name the canonical version is published under.
    pub default_version_name: String,

    /// Base URL the site is deployed to.
    pub base_url: String,

    /// Revisions file wired into `git blame`, empty to skip.
    pub ignore_revs_file: String,

    /// Tokens invoking the package installer.
    pub installer: Vec<String>,

    /// Commit-hook manager binary.
    pub hook_manager: String,

    /// Version specifier pinned onto the hook manager at install time.
    pub hook_manager_spec: String,

    /// Requirements files installed for the `doc` dependency group.
    pub requirements: Vec<String>,

    /// Probe command for the `api` dependency group. An empty probe is never
    /// satisfied, so the group reinstalls whenever it is requested.
    pub api_probe: Vec<String>,

    /// Submodule checkout the API autodoc dependencies are installed from.
    pub api_repo: PathBuf,

    /// Subdirectory of [`api_repo`](Self::api_repo) holding vendored
    /// dependency checkouts.
    pub api_deps_subdir: String,

    /// Repository name matched against dev checkouts that need a pretended
    /// version exported during editable install, empty to disable.
    pub pretend_version_repo: String,

    /// Requirements manifest, relative to [`api_repo`](Self::api_repo), the
    /// pretended version is read from.
    pub version_manifest: PathBuf,

    /// Upstream branch the submodule sync task rebases onto.
    pub upstream_branch: String,

    /// Generated directories removed by the clean task.
    pub clean_dirs: Vec<PathBuf>,
}

impl ProjectLayout {
    /// Load the project layout.
    ///
    /// Reads the given file when one is passed, otherwise falls back to
    /// [`LAYOUT_FILE`] in the working directory, and to built-in defaults
    /// when that does not exist either.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Read`] if an explicit layout file cannot be
    ///   read.
    /// - Return [`ConfigError::Deserialize`] if the layout file is not valid
    ///   TOML.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(LAYOUT_FILE);
                if !fallback.exists() {
                    return Self::default().finalize();
                }
                fallback
            }
        };

        let content = fs::read_to_string(&path).map_err(|err| ConfigError::Read {
            source: err,
            path: path.clone(),
        })?;
        content.parse()
    }

    /// All configured languages, source language first.
    pub fn languages(&self) -> Vec<String> {
        let mut languages = vec![self.source_language.clone()];
        languages.extend(self.translation_languages.iter().cloned());
        languages
    }

    /// Output directory of the HTML builder.
    pub fn html_build_dir(&self) -> PathBuf {
        self.build_root.join(&self.html_builder)
    }

    /// Landing page of the built HTML site.
    pub fn html_index(&self) -> PathBuf {
        self.html_build_dir().join("index.html")
    }

    /// Output directory of the gettext builder.
    pub fn gettext_build_dir(&self) -> PathBuf {
        self.build_root.join(&self.gettext_builder)
    }

    /// Directory the checked-in message templates live in.
    pub fn pot_dir(&self) -> PathBuf {
        self.locale_dir.join("pot")
    }

    /// Directory holding vendored dependency checkouts of the API submodule.
    pub fn api_deps_dir(&self) -> PathBuf {
        self.api_repo.join(&self.api_deps_subdir)
    }

    /// Requirements manifest the pretended version is read from.
    pub fn version_manifest_path(&self) -> PathBuf {
        self.api_repo.join(&self.version_manifest)
    }

    // Shell expansion and absolutization of all user-facing path fields.
    fn finalize(mut self) -> Result<Self> {
        for field in [
            &mut self.source_dir,
            &mut self.build_root,
            &mut self.conf_file,
            &mut self.locale_dir,
            &mut self.api_repo,
        ] {
            *field = expand_path(field)?;
        }

        for dir in &mut self.clean_dirs {
            *dir = expand_path(dir)?;
        }

        Ok(self)
    }
}

impl Default for ProjectLayout {
    fn default() -> Self {
        Self {
            org_name: "example".into(),
            repo_name: "docs".into(),
            https_template: "https://github.com/{user}/{repo}.git".into(),
            ssh_template: "git@github.com:{user}/{repo}.git".into(),
            source_dir: "docs".into(),
            build_root: "docs/_build".into(),
            conf_file: "docs/conf.py".into(),
            build_invocation: to_strings(["python", "-I", "-m", "sphinx"]),
            build_options: to_strings(["-n", "-W", "--keep-going"]),
            autobuild_invocation: to_strings(["sphinx-autobuild", "--port=0", "--open-browser"]),
            html_builder: "html".into(),
            gettext_builder: "gettext".into(),
            source_language: "en".into(),
            translation_languages: Vec::new(),
            locale_dir: "docs/locales".into(),
            po_line_width: 0,
            catalog_tool: to_strings(["sphinx-intl"]),
            latest_version: 1,
            default_version_name: "current".into(),
            base_url: String::new(),
            ignore_revs_file: ".git-blame-ignore-revs".into(),
            installer: to_strings(["python", "-m", "pip", "install"]),
            hook_manager: "pre-commit".into(),
            hook_manager_spec: ">=2.10.0,<4".into(),
            requirements: to_strings(["requirements.txt"]),
            api_probe: Vec::new(),
            api_repo: "app".into(),
            api_deps_subdir: "external-deps".into(),
            pretend_version_repo: String::new(),
            version_manifest: "requirements/main.yml".into(),
            upstream_branch: "main".into(),
            clean_dirs: vec!["docs/_build".into(), "docs/_autosummary".into()],
        }
    }
}

impl FromStr for ProjectLayout {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let layout: ProjectLayout = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;
        layout.finalize()
    }
}

impl Display for ProjectLayout {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    let expanded = shellexpand::full(path.to_string_lossy().as_ref())
        .map_err(ConfigError::ShellExpansion)?
        .into_owned();
    Ok(absolutize(expanded))
}

fn to_strings<const N: usize>(raw: [&str; N]) -> Vec<String> {
    raw.iter().map(ToString::to_string).collect()
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read layout file.
    #[error("cannot read layout file {path:?}")]
    Read {
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias.
type Result<T, E = ConfigError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    #[sealed_test(env = [("DOCS_HOME", "/srv/project/docs")])]
    fn deserialize_expands_and_anchors_paths() -> anyhow::Result<()> {
        let layout: ProjectLayout = indoc! {r#"
            org_name = "spyder-ide"
            repo_name = "spyder-api-docs"
            source_dir = "$DOCS_HOME"
            translation_languages = ["es"]
            latest_version = 6
        "#}
        .parse()?;

        assert_eq!(layout.org_name, "spyder-ide");
        assert_eq!(layout.source_dir, PathBuf::from("/srv/project/docs"));
        assert_eq!(
            layout.build_root,
            std::env::current_dir()?.join("docs/_build"),
        );
        assert_eq!(layout.languages(), vec!["en".to_string(), "es".into()]);
        assert_eq!(layout.latest_version, 6);

        Ok(())
    }

    #[sealed_test]
    fn load_falls_back_to_defaults_without_layout_file() -> anyhow::Result<()> {
        let layout = ProjectLayout::load(None)?;
        let cwd = std::env::current_dir()?;

        assert_eq!(layout.source_dir, cwd.join("docs"));
        assert_eq!(layout.html_build_dir(), cwd.join("docs/_build/html"));
        assert_eq!(layout.pot_dir(), cwd.join("docs/locales/pot"));

        Ok(())
    }

    #[sealed_test]
    fn load_reads_layout_file_from_working_directory() -> anyhow::Result<()> {
        std::fs::write(LAYOUT_FILE, "repo_name = \"my-docs\"\n")?;

        let layout = ProjectLayout::load(None)?;
        assert_eq!(layout.repo_name, "my-docs");

        Ok(())
    }

    #[test]
    fn serialize_round_trips() -> anyhow::Result<()> {
        let layout = ProjectLayout {
            org_name: "spyder-ide".into(),
            translation_languages: vec!["es".into()],
            ..Default::default()
        };

        let rendered = layout.to_string();
        let reparsed: ProjectLayout = toml::de::from_str(&rendered)?;

        assert_eq!(reparsed.org_name, "spyder-ide");
        assert_eq!(reparsed.translation_languages, vec!["es".to_string()]);

        Ok(())
    }
}
