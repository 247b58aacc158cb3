use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("failed to run {program} (is it installed and on PATH?)")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("command failed: {command}\n{stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("command output was not valid UTF-8")]
    InvalidUtf8 { source: std::string::FromUtf8Error },

    #[error("failed to write to command stdin")]
    StdinWrite { source: std::io::Error },

    #[error("path is not valid UTF-8: {}", .0.display())]
    InvalidPath(PathBuf),
}
