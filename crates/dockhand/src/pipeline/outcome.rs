use crate::pipeline::PipelineError;

/// Result of one pipeline step.
#[derive(Debug)]
pub enum StageOutcome {
    /// Step finished; move to the next state.
    Ok,
    /// Step had a problem the run tolerates. The reason is kept as a warning.
    SoftFail(String),
    /// Step failed; the run stops and the reconciler takes over.
    Fatal(PipelineError),
}

impl From<Result<(), PipelineError>> for StageOutcome {
    fn from(result: Result<(), PipelineError>) -> Self {
        match result {
            Ok(()) => Self::Ok,
            Err(e) => Self::Fatal(e),
        }
    }
}
