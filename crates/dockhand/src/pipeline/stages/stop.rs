use dockhand_core::DeploymentContext;
use dockhand_tools::DeployTools;

use crate::pipeline::StageOutcome;

/// Bring down the stack running from the project directory.
///
/// A project without a descriptor has nothing running, which is fine.
/// A failing `down` is only a warning: `up` will still replace the
/// containers.
pub async fn run<T: DeployTools>(
    tools: &T,
    ctx: &DeploymentContext,
    descriptor_name: &str,
) -> StageOutcome {
    let descriptor = ctx.base_project_dir().join(descriptor_name);
    if !descriptor.is_file() {
        tracing::info!(project = %ctx.base_project_dir().display(), "no running stack to stop");
        return StageOutcome::Ok;
    }

    match tools.stop(&descriptor).await {
        Ok(()) => StageOutcome::Ok,
        Err(e) => StageOutcome::SoftFail(format!("stop failed: {e}")),
    }
}
