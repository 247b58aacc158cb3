use std::path::{Path, PathBuf};

use serde::Serialize;

/// Which artifacts a promotion moved and which it found missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PromotionReport {
    pub moved: Vec<String>,
    pub skipped: Vec<String>,
}

/// Move each of `files` that exists in `temp_dir` into `project_dir`.
///
/// Existing files of the same name are replaced. Files missing from staging
/// are skipped, and nothing else in `project_dir` is touched. Moves are not
/// rolled back: an error leaves earlier files already promoted.
pub fn promote(
    temp_dir: &Path,
    project_dir: &Path,
    files: &[String],
) -> Result<PromotionReport, PromoteError> {
    let mut report = PromotionReport::default();

    for file in files {
        let src = temp_dir.join(file);
        if !src.is_file() {
            tracing::debug!(file = %file, "not in staging, skipping");
            report.skipped.push(file.clone());
            continue;
        }

        let dst = project_dir.join(file);
        std::fs::rename(&src, &dst).map_err(|e| PromoteError::Move {
            file: file.clone(),
            to: dst.clone(),
            moved: report.moved.clone(),
            source: e,
        })?;
        tracing::info!(file = %file, to = %dst.display(), "promoted");
        report.moved.push(file.clone());
    }

    Ok(report)
}

#[derive(Debug, thiserror::Error)]
pub enum PromoteError {
    #[error("failed to move {file} to {to} (already promoted: {moved:?})")]
    Move {
        file: String,
        to: PathBuf,
        moved: Vec<String>,
        source: std::io::Error,
    },
}
