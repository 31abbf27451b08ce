// SPDX-FileCopyrightText: 2025 Docket contributors
// SPDX-License-Identifier: MIT

//! Argument normalization.
//!
//! Tasks receive their trailing command-line arguments as a flat list of
//! tokens. Before those tokens can be handed to an external tool they need to
//! be reshaped: split into options and positional filenames at a separator
//! token, searched for named option values, and rewritten so bare filenames
//! land inside the documentation source tree.
//!
//! Everything in this module is a pure function over token slices. No
//! subprocesses are spawned here, and nothing is mutated in place, which keeps
//! the reshaping logic trivial to test in isolation.
//!
//! # Token Ordering
//!
//! Order is significant throughout. Splitting preserves the internal order of
//! both halves, and extraction preserves the relative order of every token it
//! does not consume. When the same option is given more than once, the later
//! occurrence wins.

use crate::path::absolutize;

use std::path::{Path, PathBuf};

/// Default separator between options and trailing positional arguments.
pub const SEPARATOR: &str = "--";

/// Split a token sequence at the first occurrence of a separator.
///
/// If the separator never appears it behaves as if it were appended at the
/// end, so the tail comes back empty. Reinserting the separator between the
/// two halves always reconstructs the original sequence.
pub fn split_sequence(tokens: &[String], sep: &str) -> (Vec<String>, Vec<String>) {
    match tokens.iter().position(|token| token == sep) {
        Some(idx) => (tokens[..idx].to_vec(), tokens[idx + 1..].to_vec()),
        None => (tokens.to_vec(), Vec::new()),
    }
}

/// Extract the values of a named option from a sequence of option tokens.
///
/// Scans left to right. A token matching one of `names` marks the _next_
/// token as that option's value; both are consumed. Every other token is
/// copied to the remainder unchanged, preserving relative order. With
/// `split_csv` each matched value is stripped of trailing commas and split
/// into one value per comma-separated item.
///
/// A name token sitting at the very end of the input has no value to consume
/// and is silently dropped.
pub fn extract_option_values(
    options: &[String],
    names: &[&str],
    split_csv: bool,
) -> (Vec<String>, Vec<String>) {
    let mut values = Vec::new();
    let mut remaining = Vec::new();

    let mut save_next = false;
    for option in options {
        if save_next {
            if split_csv {
                values.extend(
                    option
                        .trim_matches(',')
                        .split(',')
                        .map(ToString::to_string),
                );
            } else {
                values.push(option.clone());
            }
            save_next = false;
        } else if names.contains(&option.as_str()) {
            save_next = true;
        } else {
            remaining.push(option.clone());
        }
    }

    (values, remaining)
}

/// Redirect bare filenames into the documentation source directory.
///
/// Filenames that already resolve underneath `source_dir` pass through
/// unchanged. Everything else is rewritten as `source_dir/<filename>` by a
/// plain string join, letting callers name files relative to the source tree
/// without typing the prefix.
pub fn process_filenames(filenames: &[String], source_dir: &Path) -> Vec<String> {
    filenames
        .iter()
        .map(|filename| {
            let resolved = absolutize(filename);
            if resolved != source_dir && resolved.starts_with(source_dir) {
                filename.clone()
            } else {
                source_dir.join(filename).display().to_string()
            }
        })
        .collect()
}

/// Reusable recipe for one documentation builder command line.
///
/// Holds the fixed pieces of an invocation. [`Invocation::construct`] folds
/// caller-supplied positional arguments into them to produce the final,
/// ready-to-execute token sequence.
#[derive(Clone, Debug)]
pub struct Invocation<'a> {
    /// Leading tokens naming the builder tool itself.
    pub base: &'a [String],

    /// Builder name to use when the caller does not override it.
    pub builder: &'a str,

    /// Fixed build options, never reordered.
    pub build_options: &'a [String],

    /// Options appended after the fixed ones for this particular call.
    pub extra_options: &'a [String],

    /// Documentation source directory.
    pub source_dir: &'a Path,

    /// Root under which per-builder output directories live.
    pub build_root: &'a Path,

    /// Explicit output directory, overriding the per-builder default.
    pub build_dir: Option<PathBuf>,

    /// Force colored output (set when running under CI).
    pub color: bool,
}

impl Invocation<'_> {
    /// Fold positional arguments into a complete builder command line.
    ///
    /// The posargs are split at the separator: the head may carry a
    /// `--builder`/`-b` override (last occurrence wins) plus arbitrary
    /// leftover options, the tail carries filenames to normalize. Leftover
    /// options always land after the fixed and extra options, before the
    /// positional source/build-dir/filename block.
    pub fn construct(&self, posargs: &[String]) -> Vec<String> {
        let (options, filenames) = split_sequence(posargs, SEPARATOR);
        let filenames = process_filenames(&filenames, self.source_dir);
        let (builders, options) = extract_option_values(&options, &["--builder", "-b"], false);
        let builder = builders.last().map(String::as_str).unwrap_or(self.builder);
        let build_dir = match &self.build_dir {
            Some(dir) => dir.clone(),
            None => self.build_root.join(builder),
        };

        let mut argv: Vec<String> = self.base.to_vec();
        argv.push("-b".into());
        argv.push(builder.into());
        argv.extend(self.build_options.iter().cloned());
        if self.color {
            argv.push("--color".into());
        }
        argv.extend(self.extra_options.iter().cloned());
        argv.extend(options);
        argv.push(SEPARATOR.into());
        argv.push(self.source_dir.display().to_string());
        argv.push(build_dir.display().to_string());
        argv.extend(filenames);

        argv
    }
}

/// Argument normalization error types.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ArgsError {
    /// Mutually exclusive options where exactly one is required.
    #[error("exactly one of {first:?} or {second:?} must be passed")]
    ConflictingOptions { first: String, second: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;
    use simple_test_case::test_case;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test_case(&["-n", "--", "index.rst"], &["-n"], &["index.rst"]; "separator in middle")]
    #[test_case(&["-n"], &["-n"], &[]; "separator absent")]
    #[test_case(&[], &[], &[]; "empty input")]
    #[test_case(&["--"], &[], &[]; "separator only")]
    #[test_case(&["--", "a", "--", "b"], &[], &["a", "--", "b"]; "first separator wins")]
    #[test]
    fn split_sequence_splits_at_first_separator(input: &[&str], head: &[&str], tail: &[&str]) {
        use pretty_assertions::assert_eq;

        let result = split_sequence(&tokens(input), SEPARATOR);
        assert_eq!(result, (tokens(head), tokens(tail)));
    }

    #[test]
    fn split_sequence_halves_reconcatenate_to_input() {
        let input = tokens(&["-n", "-W", "--", "a.rst", "b.rst"]);
        let (head, tail) = split_sequence(&input, SEPARATOR);

        let mut rebuilt = head;
        rebuilt.push(SEPARATOR.into());
        rebuilt.extend(tail);

        assert_eq!(rebuilt, input);
    }

    #[test]
    fn extract_option_values_finds_builder_override() {
        let options = tokens(&["--builder", "html", "foo"]);
        let result = extract_option_values(&options, &["--builder", "-b"], false);
        assert_eq!(result, (tokens(&["html"]), tokens(&["foo"])));
    }

    #[test]
    fn extract_option_values_matches_any_alias() {
        let options = tokens(&["-q", "-b", "latex", "--builder", "html"]);
        let (values, remaining) = extract_option_values(&options, &["--builder", "-b"], false);

        assert_eq!(values, tokens(&["latex", "html"]));
        assert_eq!(remaining, tokens(&["-q"]));
    }

    #[test]
    fn extract_option_values_preserves_remainder_order() {
        let options = tokens(&["-q", "--lang", "es", "-W", "-n"]);
        let (values, remaining) = extract_option_values(&options, &["--lang"], false);

        assert_eq!(values, tokens(&["es"]));
        assert_eq!(remaining, tokens(&["-q", "-W", "-n"]));
    }

    #[test]
    fn extract_option_values_splits_csv_values() {
        let options = tokens(&["--lang", "es,fr,", "foo"]);
        let (values, remaining) = extract_option_values(&options, &["--lang"], true);

        assert_eq!(values, tokens(&["es", "fr"]));
        assert_eq!(remaining, tokens(&["foo"]));
    }

    #[test]
    fn extract_option_values_drops_dangling_name_token() {
        let options = tokens(&["foo", "--builder"]);
        let (values, remaining) = extract_option_values(&options, &["--builder"], false);

        assert_eq!(values, Vec::<String>::new());
        assert_eq!(remaining, tokens(&["foo"]));
    }

    #[test]
    fn extract_option_values_never_rematches_consumed_value() {
        // A value token spelled like an option name must be consumed as a
        // value, not treated as another match.
        let options = tokens(&["--builder", "--builder", "html"]);
        let (values, remaining) = extract_option_values(&options, &["--builder"], false);

        assert_eq!(values, tokens(&["--builder"]));
        assert_eq!(remaining, tokens(&["html"]));
    }

    #[test]
    fn extract_option_values_is_idempotent_on_remainder() {
        let options = tokens(&["-b", "html", "-q", "--builder", "latex"]);
        let (_, remaining) = extract_option_values(&options, &["--builder", "-b"], false);
        let (values, unchanged) = extract_option_values(&remaining, &["--builder", "-b"], false);

        assert_eq!(values, Vec::<String>::new());
        assert_eq!(unchanged, remaining);
    }

    #[sealed_test]
    fn process_filenames_prefixes_bare_filenames() {
        let source_dir = std::env::current_dir().unwrap().join("docs");
        let result = process_filenames(&tokens(&["index.rst"]), &source_dir);
        assert_eq!(result, vec![source_dir.join("index.rst").display().to_string()]);
    }

    #[sealed_test]
    fn process_filenames_keeps_nested_filenames() {
        let source_dir = std::env::current_dir().unwrap().join("docs");
        let nested = tokens(&["docs/index.rst"]);
        assert_eq!(process_filenames(&nested, &source_dir), nested);
    }

    #[sealed_test]
    fn process_filenames_preserves_length_and_order() {
        let source_dir = std::env::current_dir().unwrap().join("docs");
        let result = process_filenames(&tokens(&["a.rst", "docs/b.rst", "c.rst"]), &source_dir);

        assert_eq!(result.len(), 3);
        assert!(result[0].ends_with("a.rst"));
        assert_eq!(result[1], "docs/b.rst");
        assert!(result[2].ends_with("c.rst"));
    }

    #[sealed_test]
    fn construct_orders_fixed_options_before_user_options() {
        let cwd = std::env::current_dir().unwrap();
        let source_dir = cwd.join("docs");
        let build_root = cwd.join("docs/_build");
        let base = tokens(&["sphinx-build"]);
        let build_options = tokens(&["-n", "-W"]);
        let extra_options = tokens(&["-a"]);
        let invocation = Invocation {
            base: &base,
            builder: "html",
            build_options: &build_options,
            extra_options: &extra_options,
            source_dir: &source_dir,
            build_root: &build_root,
            build_dir: None,
            color: false,
        };

        let argv = invocation.construct(&tokens(&["-q", "--", "index.rst"]));

        let expect = vec![
            "sphinx-build".to_string(),
            "-b".into(),
            "html".into(),
            "-n".into(),
            "-W".into(),
            "-a".into(),
            "-q".into(),
            "--".into(),
            source_dir.display().to_string(),
            build_root.join("html").display().to_string(),
            source_dir.join("index.rst").display().to_string(),
        ];
        assert_eq!(argv, expect);
    }

    #[sealed_test]
    fn construct_honors_builder_override() {
        let cwd = std::env::current_dir().unwrap();
        let source_dir = cwd.join("docs");
        let build_root = cwd.join("docs/_build");
        let base = tokens(&["sphinx-build"]);
        let invocation = Invocation {
            base: &base,
            builder: "html",
            build_options: &[],
            extra_options: &[],
            source_dir: &source_dir,
            build_root: &build_root,
            build_dir: None,
            color: false,
        };

        let argv = invocation.construct(&tokens(&["-b", "linkcheck"]));

        assert_eq!(argv[1..3], tokens(&["-b", "linkcheck"]));
        assert!(argv.contains(&build_root.join("linkcheck").display().to_string()));
    }

    #[sealed_test]
    fn construct_appends_color_flag_when_requested() {
        let cwd = std::env::current_dir().unwrap();
        let source_dir = cwd.join("docs");
        let build_root = cwd.join("docs/_build");
        let base = tokens(&["sphinx-build"]);
        let invocation = Invocation {
            base: &base,
            builder: "html",
            build_options: &[],
            extra_options: &[],
            source_dir: &source_dir,
            build_root: &build_root,
            build_dir: None,
            color: true,
        };

        let argv = invocation.construct(&[]);
        assert!(argv.contains(&"--color".to_string()));
    }
}
