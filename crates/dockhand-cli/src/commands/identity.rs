use std::path::Path;

use dockhand::DockhandConfig;
use dockhand::pipeline::RunRequest;
use dockhand::tools::DockerToolchain;

/// Print the coordinates and directories a deploy would use. No side effects.
pub async fn identity(
    dir: &Path,
    run_id: &str,
    tag: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let config = DockhandConfig::load(dir)?;
    let branch = config.project.branch.clone();

    let mut request = RunRequest::new(config, &branch, run_id);
    request.tag = tag;
    request.workdir = dir.to_path_buf();

    let ctx = request.resolve(&DockerToolchain::new()).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&ctx)?);
        return Ok(());
    }

    let image = ctx
        .image_ref()
        .unwrap_or_else(|field| format!("(incomplete: missing {field})"));

    println!("repository   {}", ctx.repo_url());
    println!("owner        {}", ctx.owner());
    println!("name         {}", ctx.name());
    println!("registry     {}", ctx.registry());
    println!("image        {image}");
    println!("project dir  {}", ctx.base_project_dir().display());
    println!("staging dir  {}", ctx.temp_dir().display());
    println!("branch       {branch}");

    Ok(())
}
