use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use dockhand_core::DeploymentContext;

/// Permissions for secret files placed in staging.
#[cfg(unix)]
const SECRET_MODE: u32 = 0o600;

/// Create the project directory and this run's staging directory.
///
/// Existing directories are left as they are.
pub fn create(ctx: &DeploymentContext) -> Result<(), StagingError> {
    for dir in [ctx.base_project_dir(), ctx.temp_dir()] {
        std::fs::create_dir_all(dir).map_err(|e| StagingError::CreateDir {
            path: dir.to_path_buf(),
            source: e,
        })?;
    }
    tracing::debug!(temp_dir = %ctx.temp_dir().display(), "staging area ready");
    Ok(())
}

/// Copy a secret file into `temp_dir` as `file_name`, readable by the owner only.
///
/// Returns the destination path. Contents are streamed, never logged.
pub fn place_secret(
    temp_dir: &Path,
    source: &Path,
    file_name: &str,
) -> Result<PathBuf, StagingError> {
    let dest = temp_dir.join(file_name);

    let mut reader = std::fs::File::open(source).map_err(|e| StagingError::ReadSecret {
        path: source.to_path_buf(),
        source: e,
    })?;

    // The checkout may already hold a file or symlink by this name; replace
    // it rather than write through it.
    match std::fs::remove_file(&dest) {
        Ok(()) => tracing::debug!(dest = %dest.display(), "replacing checked-out file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(StagingError::WriteSecret {
                path: dest,
                source: e,
            });
        }
    }

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(SECRET_MODE);
    }

    let mut writer = options.open(&dest).map_err(|e| StagingError::WriteSecret {
        path: dest.clone(),
        source: e,
    })?;
    std::io::copy(&mut reader, &mut writer).map_err(|e| StagingError::WriteSecret {
        path: dest.clone(),
        source: e,
    })?;

    tracing::info!(dest = %dest.display(), "placed secret file");
    Ok(dest)
}

#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    #[error("failed to create directory {path}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read secret file {path}")]
    ReadSecret {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write secret file {path}")]
    WriteSecret {
        path: PathBuf,
        source: std::io::Error,
    },
}
