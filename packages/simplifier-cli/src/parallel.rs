//! Simplifying a batch of files on the rayon pool.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use metadata_simplifier::{Simplifier, SimplifyReport};
use rayon::prelude::*;

use crate::files::{clashing_outputs, output_path};

/// What happens to each simplified file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Keep the output in memory for the caller to print.
    Print,
    /// Overwrite changed inputs in place.
    Write,
    /// Write every output under a directory.
    OutDir(PathBuf),
    /// Only report which files would change.
    Check,
}

#[derive(Debug)]
pub struct FileResult {
    pub changed: bool,
    pub report: SimplifyReport,
    /// Set in [`Mode::Print`] only.
    pub code: Option<String>,
}

#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub result: anyhow::Result<FileResult>,
}

fn simplify_file(path: &Path, simplifier: &Simplifier, mode: &Mode) -> anyhow::Result<FileResult> {
    let source = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let out = simplifier.run_file(&source, Some(&path.to_string_lossy()))?;
    let changed = out.code != source;

    let mut code = None;
    match mode {
        Mode::Print => code = Some(out.code),
        Mode::Write => {
            if changed {
                fs::write(path, &out.code).with_context(|| format!("failed to write {}", path.display()))?;
            }
        }
        Mode::OutDir(dir) => {
            let target = output_path(dir, path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            fs::write(&target, &out.code).with_context(|| format!("failed to write {}", target.display()))?;
        }
        Mode::Check => {}
    }

    Ok(FileResult {
        changed,
        report: out.report,
        code,
    })
}

/// Simplify `files` in parallel. Outcomes come back in input order; a failing
/// file never stops the others.
pub fn simplify_files(files: &[PathBuf], simplifier: &Simplifier, mode: &Mode) -> Vec<FileOutcome> {
    let clashes = match mode {
        Mode::OutDir(dir) => clashing_outputs(dir, files),
        _ => Default::default(),
    };

    files
        .par_iter()
        .map(|path| {
            let result = match mode {
                Mode::OutDir(dir) if clashes.contains(&output_path(dir, path)) => Err(anyhow::anyhow!(
                    "another input also maps to {}, not writing",
                    output_path(dir, path).display()
                )),
                _ => simplify_file(path, simplifier, mode),
            };
            match &result {
                Ok(file) => tracing::debug!(file = %path.display(), changed = file.changed, report = %file.report, "simplified"),
                Err(e) => tracing::debug!(file = %path.display(), error = %e, "failed"),
            }
            FileOutcome {
                path: path.clone(),
                result,
            }
        })
        .collect()
}

/// Totals over one batch, printed as the run's summary line.
#[derive(Debug, Default)]
pub struct Summary {
    pub files: usize,
    pub changed: usize,
    pub failed: usize,
    pub report: SimplifyReport,
    pub elapsed: Duration,
}

impl Summary {
    pub fn collect(outcomes: &[FileOutcome], started: Instant) -> Self {
        let mut summary = Summary {
            files: outcomes.len(),
            elapsed: started.elapsed(),
            ..Summary::default()
        };
        for outcome in outcomes {
            match &outcome.result {
                Ok(file) => {
                    if file.changed {
                        summary.changed += 1;
                    }
                    summary.report.absorb(&file.report);
                }
                Err(_) => summary.failed += 1,
            }
        }
        summary
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files, {} changed, {} failed; {} in {:?}",
            self.files, self.changed, self.failed, self.report, self.elapsed
        )
    }
}
