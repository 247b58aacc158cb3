use dockhand_core::DeploymentContext;
use dockhand_tools::DeployTools;

use crate::pipeline::{PipelineError, StageOutcome};

/// Build the staged stack's images.
///
/// The descriptor must exist in the staging area. The build sees the image
/// coordinates as `DOCKHAND_*` variables and is pinned to the project's
/// compose name, so images built in `.tmp_<run_id>` are the ones the
/// promoted stack starts.
pub async fn run<T: DeployTools>(
    tools: &T,
    ctx: &DeploymentContext,
    descriptor_name: &str,
) -> StageOutcome {
    let descriptor = ctx.temp_dir().join(descriptor_name);
    if !descriptor.is_file() {
        return StageOutcome::Fatal(PipelineError::MissingDescriptor(descriptor));
    }

    tracing::info!(descriptor = %descriptor.display(), "building stack");
    match tools.build(&descriptor, ctx.temp_dir(), &build_env(ctx)).await {
        Ok(()) => StageOutcome::Ok,
        Err(source) => StageOutcome::Fatal(PipelineError::Build { source }),
    }
}

/// Environment handed to the build tool.
pub fn build_env(ctx: &DeploymentContext) -> Vec<(String, String)> {
    let mut env = vec![
        ("COMPOSE_PROJECT_NAME".to_owned(), ctx.name().to_owned()),
        ("DOCKHAND_REGISTRY".to_owned(), ctx.registry().to_owned()),
        ("DOCKHAND_OWNER".to_owned(), ctx.owner().to_owned()),
        ("DOCKHAND_NAME".to_owned(), ctx.name().to_owned()),
    ];
    if let Some(tag) = ctx.tag() {
        env.push(("DOCKHAND_TAG".to_owned(), tag.to_owned()));
    }
    if let Ok(image) = ctx.image_ref() {
        env.push(("DOCKHAND_IMAGE".to_owned(), image));
    }
    env
}
