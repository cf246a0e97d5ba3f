//! Expanding command line paths into the list of files to simplify.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};

/// Extensions picked up when a directory is given.
pub const SCRIPT_EXTENSIONS: &[&str] = &["js", "mjs", "cjs"];

fn is_pattern(arg: &str) -> bool {
    arg.contains(&['*', '?', '['][..])
}

fn glob_into(pattern: &str, out: &mut BTreeSet<PathBuf>) -> anyhow::Result<usize> {
    let mut found = 0;
    for entry in glob::glob(pattern).with_context(|| format!("invalid pattern {pattern}"))? {
        let path = entry.with_context(|| format!("failed to read a match of {pattern}"))?;
        if path.is_file() {
            out.insert(path);
            found += 1;
        }
    }
    Ok(found)
}

fn directory_pattern(dir: &Path, extension: &str) -> String {
    dir.join("**")
        .join(format!("*.{extension}"))
        .to_string_lossy()
        .into_owned()
}

/// Files named by `args`: plain files as given, directories walked for
/// script files, anything else treated as a glob. Sorted and deduplicated.
pub fn expand(args: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = BTreeSet::new();
    for arg in args {
        let path = Path::new(arg);
        if path.is_file() {
            files.insert(path.to_path_buf());
        } else if path.is_dir() {
            for extension in SCRIPT_EXTENSIONS {
                glob_into(&directory_pattern(path, extension), &mut files)?;
            }
        } else if is_pattern(arg) {
            if glob_into(arg, &mut files)? == 0 {
                tracing::warn!(pattern = %arg, "pattern matched no files");
            }
        } else {
            bail!("no such file or directory: {arg}");
        }
    }
    Ok(files.into_iter().collect())
}

/// Where a file's output goes under `out_dir`: relative inputs keep their
/// layout, absolute ones land by file name.
pub fn output_path(out_dir: &Path, input: &Path) -> PathBuf {
    if input.is_relative() {
        let relative: PathBuf = input
            .components()
            .filter(|c| matches!(c, std::path::Component::Normal(_)))
            .collect();
        out_dir.join(relative)
    } else {
        out_dir.join(input.file_name().unwrap_or(input.as_os_str()))
    }
}

/// Output paths under `out_dir` that more than one input maps to.
pub fn clashing_outputs(out_dir: &Path, inputs: &[PathBuf]) -> BTreeSet<PathBuf> {
    let mut seen: BTreeMap<PathBuf, usize> = BTreeMap::new();
    for input in inputs {
        *seen.entry(output_path(out_dir, input)).or_default() += 1;
    }
    seen.into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(target, _)| target)
        .collect()
}
