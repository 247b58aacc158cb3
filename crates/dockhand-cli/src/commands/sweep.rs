use std::path::Path;

use dockhand::DockhandConfig;
use dockhand::pipeline::discover_identity;
use dockhand::stage::sweep_orphans;
use dockhand::tools::DockerToolchain;

/// Remove every `.tmp_*` directory under the project directory.
pub async fn sweep(dir: &Path) -> anyhow::Result<()> {
    let config = DockhandConfig::load(dir)?;
    let (_, identity) = discover_identity(&DockerToolchain::new(), &config, dir).await?;
    let project_dir = config.base_dir_from(dir)?.join(&identity.name);

    let report = sweep_orphans(&project_dir, None);

    if report.removed.is_empty() {
        println!("No staging directories under {}", project_dir.display());
    }
    for path in &report.removed {
        println!("Removed {}", path.display());
    }

    if !report.is_clean() {
        for warning in &report.warnings {
            eprintln!("warning: {warning}");
        }
        anyhow::bail!("sweep finished with {} warning(s)", report.warnings.len());
    }
    Ok(())
}
