use std::path::Path;

use dockhand::CONFIG_FILE_NAME;

const TEMPLATE: &str = r#"[project]
# repo_url = "git@github.com:acme/my-app.git"   # default: git remote get-url origin
# owner = "acme"                                # default: from repo_url
# name = "my-app"                               # default: from repo_url
# base_dir = "/srv"                             # relative paths start at this directory
# branch = "main"                               # only this branch deploys

[registry]
# host = "ghcr.io"
# user = "deployer"                             # password: DOCKHAND_REGISTRY_PASSWORD

[deploy]
# descriptor = "docker-compose.yml"             # image: ${DOCKHAND_IMAGE}
# files = ["docker-compose.yml", ".env", ".env.local", "credentials.json"]
# env_file_name = ".env"
# credentials_file_name = "credentials.json"
# prune = true

[secrets]
# env_file = "/run/secrets/my-app.env"
# credentials_file = "/run/secrets/credentials.json"
# ssh_key = "/run/secrets/deploy_key"
"#;

/// Write a commented dockhand.toml into `dir`, leaving an existing one alone.
pub async fn init_config(dir: &Path) -> anyhow::Result<()> {
    let path = dir.join(CONFIG_FILE_NAME);
    if path.exists() {
        eprintln!("{CONFIG_FILE_NAME} already exists, skipping");
        return Ok(());
    }

    std::fs::write(&path, TEMPLATE)?;
    println!("Created {}", path.display());
    println!();
    println!("Next steps:");
    println!();
    println!("  1. Point the stack descriptor at the published image:");
    println!("     image: ${{DOCKHAND_IMAGE}}");
    println!();
    println!("  2. Check the toolchain:");
    println!("     dockhand doctor");
    println!();
    println!("  3. Deploy from CI:");
    println!("     BRANCH_NAME=main BUILD_NUMBER=1 IMAGE_TAG=v1 dockhand deploy");

    Ok(())
}
