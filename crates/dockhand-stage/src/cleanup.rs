//! Best-effort removal of staging directories.
//!
//! Nothing here returns an error. Problems are collected as warnings in a
//! [`CleanupReport`] so a failed cleanup can never change a run's outcome.

use std::path::{Path, PathBuf};

use dockhand_core::STAGING_PREFIX;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

impl CleanupReport {
    pub fn merge(&mut self, other: CleanupReport) {
        self.removed.extend(other.removed);
        self.warnings.extend(other.warnings);
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    fn warn(&mut self, message: String) {
        tracing::warn!("{message}");
        self.warnings.push(message);
    }
}

/// True for `.tmp_<id>` and execution-metadata variants such as `.tmp_<id>@tmp`.
pub fn is_staging_dir_name(name: &str) -> bool {
    name.strip_prefix(STAGING_PREFIX).is_some_and(|rest| !rest.is_empty())
}

/// Recursively remove a staging directory.
///
/// An absent directory counts as removed already, so calling this twice is
/// harmless. Paths whose final component is not a staging name are refused.
pub fn destroy(temp_dir: &Path) -> CleanupReport {
    let mut report = CleanupReport::default();

    let is_staging = temp_dir
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(is_staging_dir_name);
    if !is_staging {
        report.warn(format!(
            "refusing to remove {}: not a staging directory",
            temp_dir.display()
        ));
        return report;
    }

    match std::fs::remove_dir_all(temp_dir) {
        Ok(()) => {
            tracing::debug!(path = %temp_dir.display(), "removed staging directory");
            report.removed.push(temp_dir.to_path_buf());
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %temp_dir.display(), "staging directory already gone");
        }
        Err(e) => report.warn(format!("failed to remove {}: {e}", temp_dir.display())),
    }

    report
}

/// Remove every staging directory under `project_dir` except `current`.
pub fn sweep_orphans(project_dir: &Path, current: Option<&Path>) -> CleanupReport {
    let mut report = CleanupReport::default();

    let entries = match std::fs::read_dir(project_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return report,
        Err(e) => {
            report.warn(format!("failed to scan {}: {e}", project_dir.display()));
            return report;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                report.warn(format!("failed to read entry in {}: {e}", project_dir.display()));
                continue;
            }
        };

        let path = entry.path();
        if current.is_some_and(|c| c == path) {
            continue;
        }
        if !entry.file_name().to_str().is_some_and(is_staging_dir_name) {
            continue;
        }
        match entry.file_type() {
            Ok(t) if t.is_dir() => {}
            Ok(_) => continue,
            Err(e) => {
                report.warn(format!("failed to inspect {}: {e}", path.display()));
                continue;
            }
        }

        tracing::info!(path = %path.display(), "removing orphaned staging directory");
        report.merge(destroy(&path));
    }

    report
}
