use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to load config from {path}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid base directory {path}")]
    BaseDir {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Identity resolution ──
    #[error("malformed repository URL {url:?}: {reason}")]
    MalformedRepoUrl { url: String, reason: &'static str },

    #[error("invalid project name override {name:?}: must be a single path segment")]
    InvalidNameOverride { name: String },

    #[error("invalid run id {run_id:?}: {reason}")]
    InvalidRunId { run_id: String, reason: &'static str },
}
