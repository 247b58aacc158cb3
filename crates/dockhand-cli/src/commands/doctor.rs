use std::path::Path;

use dockhand::tools::{CheckResult, DockerToolchain};
use dockhand::{CONFIG_FILE_NAME, DockhandConfig};

pub async fn doctor(dir: &Path) -> anyhow::Result<()> {
    let mut report = DockerToolchain::new().doctor().await;

    report.config_file = if !dir.join(CONFIG_FILE_NAME).exists() {
        CheckResult::ok("Not found, using defaults")
    } else {
        match DockhandConfig::load(dir) {
            Ok(_) => CheckResult::ok("Found"),
            Err(e) => CheckResult::fail(&e.to_string()),
        }
    };

    println!();
    println!("{report}");

    if !report.all_passed() {
        anyhow::bail!("some checks failed, see above for details");
    }

    Ok(())
}
