use std::path::Path;

use dockhand::DockhandConfig;
use dockhand::pipeline::{self, RunOutcome, RunReport, RunRequest};
use dockhand::tools::DockerToolchain;
use secrecy::SecretString;

pub struct DeployArgs {
    pub branch: String,
    pub run_id: String,
    pub tag: Option<String>,
    pub git_ref: Option<String>,
    pub registry_password: Option<SecretString>,
    pub json: bool,
}

/// Run the deploy pipeline. Fails only when the run ends in `Failed`.
pub async fn deploy(dir: &Path, args: DeployArgs) -> anyhow::Result<()> {
    let config = DockhandConfig::load(dir)?;

    let mut request = RunRequest::new(config, &args.branch, &args.run_id);
    request.tag = args.tag;
    request.git_ref = args.git_ref;
    request.workdir = dir.to_path_buf();
    request.registry_password = args.registry_password;

    let report = pipeline::run(&DockerToolchain::new(), &request).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if let RunOutcome::Failed { state, message } = &report.outcome {
        anyhow::bail!("deploy failed while {state}: {message}");
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    println!();
    match &report.outcome {
        RunOutcome::Succeeded => match &report.image {
            Some(image) => println!("Deployed {image}"),
            None => println!("Deployed"),
        },
        RunOutcome::Skipped { branch, designated } => {
            println!("Skipped: branch {branch} is not the designated branch {designated}");
        }
        RunOutcome::Failed { state, .. } => println!("Failed while {state}"),
    }

    let states: Vec<&str> = report.states.iter().map(|s| s.as_str()).collect();
    println!("  states:   {}", states.join(" -> "));

    if let Some(promotion) = &report.promotion {
        if !promotion.moved.is_empty() {
            println!("  promoted: {}", promotion.moved.join(", "));
        }
        if !promotion.skipped.is_empty() {
            println!("  missing:  {}", promotion.skipped.join(", "));
        }
    }

    for warning in report.warnings.iter().chain(&report.cleanup.warnings) {
        println!("  warning:  {warning}");
    }

    if !report.cleanup.removed.is_empty() {
        println!(
            "  cleanup:  removed {} staging director{}",
            report.cleanup.removed.len(),
            if report.cleanup.removed.len() == 1 { "y" } else { "ies" }
        );
    }
}
