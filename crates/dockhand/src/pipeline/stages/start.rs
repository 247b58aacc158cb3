use dockhand_core::DeploymentContext;
use dockhand_tools::DeployTools;

use crate::pipeline::{PipelineError, StageOutcome};

/// Start the promoted stack, detached.
pub async fn run<T: DeployTools>(
    tools: &T,
    ctx: &DeploymentContext,
    descriptor_name: &str,
) -> StageOutcome {
    let descriptor = ctx.base_project_dir().join(descriptor_name);
    if !descriptor.is_file() {
        return StageOutcome::SoftFail(format!(
            "start skipped: missing stack descriptor at {}",
            descriptor.display()
        ));
    }

    tracing::info!(descriptor = %descriptor.display(), "starting stack");
    match tools.start(&descriptor).await {
        Ok(()) => StageOutcome::Ok,
        Err(source) => StageOutcome::Fatal(PipelineError::Start { source }),
    }
}
