mod commands;

use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "dockhand",
    about = "Build, stage, and promote docker compose deployments"
)]
#[command(version)]
struct Cli {
    /// Directory holding dockhand.toml and the repository checkout
    #[arg(long, short = 'C', global = true, default_value = ".")]
    dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the deploy pipeline for one commit
    Deploy {
        /// Branch that triggered this run
        #[arg(long, env = "BRANCH_NAME")]
        branch: String,
        /// Unique id of this run, usually the CI build number
        #[arg(long, env = "BUILD_NUMBER")]
        run_id: String,
        /// Image tag to publish
        #[arg(long, env = "IMAGE_TAG")]
        tag: Option<String>,
        /// Branch, tag, or full commit id to check out (default: the designated branch)
        #[arg(long)]
        git_ref: Option<String>,
        /// Registry password, piped to `docker login`
        #[arg(long, env = "DOCKHAND_REGISTRY_PASSWORD", hide_env_values = true)]
        registry_password: Option<String>,
        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the resolved image coordinates and directories
    Identity {
        /// Run id used for the staging directory
        #[arg(long, env = "BUILD_NUMBER", default_value = "local")]
        run_id: String,
        /// Image tag
        #[arg(long, env = "IMAGE_TAG")]
        tag: Option<String>,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove staging directories left behind by interrupted runs
    Sweep,
    /// Check that git, docker, and docker compose are usable
    Doctor,
    /// Write a dockhand.toml template
    Init,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // `.env` may supply env-backed arguments, so it is read before the full parse.
    load_dotenv(&project_dir())?;

    let cli = Cli::parse();
    let dir = cli.dir.as_path();

    match cli.command {
        Commands::Deploy {
            branch,
            run_id,
            tag,
            git_ref,
            registry_password,
            json,
        } => {
            let args = commands::DeployArgs {
                branch,
                run_id,
                tag,
                git_ref,
                registry_password: registry_password.map(secrecy::SecretString::from),
                json,
            };
            commands::deploy(dir, args).await?
        }
        Commands::Identity { run_id, tag, json } => {
            commands::identity(dir, &run_id, tag, json).await?
        }
        Commands::Sweep => commands::sweep(dir).await?,
        Commands::Doctor => commands::doctor(dir).await?,
        Commands::Init => commands::init_config(dir).await?,
    }

    Ok(())
}

/// `-C/--dir` from a lenient parse; the full parse happens after `.env` is loaded.
fn project_dir() -> PathBuf {
    match Cli::command().ignore_errors(true).try_get_matches() {
        Ok(matches) => matches
            .get_one::<PathBuf>("dir")
            .cloned()
            .unwrap_or_else(|| PathBuf::from(".")),
        // --help and --version; the full parse reports them.
        Err(e) => {
            tracing::debug!(kind = ?e.kind(), "no project dir from first parse");
            PathBuf::from(".")
        }
    }
}

fn load_dotenv(dir: &Path) -> anyhow::Result<()> {
    let path = dir.join(".env");
    match dotenvy::from_path(&path) {
        Ok(()) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => tracing::debug!(path = %path.display(), "no .env file"),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
