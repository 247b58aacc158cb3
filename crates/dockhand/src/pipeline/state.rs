use std::fmt;

use serde::Serialize;

/// One step of a deploy run.
///
/// Non-terminal states run in declaration order. `Done`, `Failed`, and
/// `Skipped` end the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Resolving,
    Staging,
    Cloning,
    Building,
    Promoting,
    Stopping,
    Starting,
    Publishing,
    Pruning,
    Done,
    Failed,
    Skipped,
}

impl PipelineState {
    /// The state that follows a successful step, `None` once terminal.
    pub fn next(self) -> Option<Self> {
        use PipelineState::*;
        match self {
            Resolving => Some(Staging),
            Staging => Some(Cloning),
            Cloning => Some(Building),
            Building => Some(Promoting),
            Promoting => Some(Stopping),
            Stopping => Some(Starting),
            Starting => Some(Publishing),
            Publishing => Some(Pruning),
            Pruning => Some(Done),
            Done | Failed | Skipped => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Skipped)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Resolving => "resolving",
            Self::Staging => "staging",
            Self::Cloning => "cloning",
            Self::Building => "building",
            Self::Promoting => "promoting",
            Self::Stopping => "stopping",
            Self::Starting => "starting",
            Self::Publishing => "publishing",
            Self::Pruning => "pruning",
            Self::Done => "done",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
