use dockhand_core::DeploymentContext;
use dockhand_stage::{CleanupReport, destroy, sweep_orphans};

/// Reclaim this run's staging area and any left behind by earlier runs.
///
/// Runs on every terminal state. Never fails; problems end up as warnings
/// in the returned report.
pub fn reconcile(ctx: &DeploymentContext) -> CleanupReport {
    let mut report = destroy(ctx.temp_dir());
    report.merge(sweep_orphans(ctx.base_project_dir(), Some(ctx.temp_dir())));

    if report.is_clean() {
        tracing::info!(removed = report.removed.len(), "cleanup finished");
    } else {
        tracing::warn!(
            removed = report.removed.len(),
            warnings = report.warnings.len(),
            "cleanup finished with warnings"
        );
    }
    report
}
