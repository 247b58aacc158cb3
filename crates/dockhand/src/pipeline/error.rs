use std::path::PathBuf;

use dockhand_stage::{PromoteError, StagingError};
use dockhand_tools::ToolError;

/// Fatal errors that end a run in `Failed`.
///
/// Each message names the step that failed.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("resolve failed: could not read the origin remote")]
    RemoteDiscovery { source: ToolError },

    #[error("resolve failed")]
    Resolve { source: dockhand_core::Error },

    #[error("staging failed")]
    Staging { source: StagingError },

    #[error("checkout failed")]
    Checkout { source: ToolError },

    #[error("checkout failed: could not place secret file")]
    SecretPlacement { source: StagingError },

    #[error("build failed: missing stack descriptor at {}", .0.display())]
    MissingDescriptor(PathBuf),

    #[error("build failed")]
    Build { source: ToolError },

    #[error("promotion failed")]
    Promotion { source: PromoteError },

    #[error("start failed")]
    Start { source: ToolError },

    #[error("publish failed: missing {0}")]
    MissingField(&'static str),

    #[error("publish failed: registry login rejected")]
    Login { source: ToolError },

    #[error("publish failed: push rejected")]
    Push { source: ToolError },
}

impl From<dockhand_core::Error> for PipelineError {
    fn from(source: dockhand_core::Error) -> Self {
        Self::Resolve { source }
    }
}

/// Render an error with its full source chain on one line.
pub(crate) fn chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(cause.to_string().trim_end());
        source = cause.source();
    }
    message
}
