//! The deploy run state machine.
//!
//! ```text
//! Resolving → Staging → Cloning → Building → Promoting
//!           → Stopping → Starting → Publishing → Pruning → Done
//! ```
//!
//! A wrong branch ends the run in `Skipped` before anything touches the
//! filesystem. A fatal error in any step ends it in `Failed`. Whatever the
//! terminal state, the [`reconcile()`] finalizer removes the run's staging
//! directory and any orphans from earlier runs once a
//! [`DeploymentContext`] exists.

mod error;
mod outcome;
mod reconcile;
mod state;
pub mod stages;

use std::path::{Path, PathBuf};

use dockhand_core::{DeploymentContext, DockhandConfig, IdentityOverrides, RepoIdentity, RunId};
use dockhand_stage::{CleanupReport, PromotionReport};
use dockhand_tools::{CheckoutSpec, DeployTools};
use secrecy::SecretString;
use serde::Serialize;

pub use error::PipelineError;
pub use outcome::StageOutcome;
pub use reconcile::reconcile;
pub use state::PipelineState;

use stages::publish::RegistryLogin;

/// Inputs for one run.
#[derive(Debug)]
pub struct RunRequest {
    pub config: DockhandConfig,
    /// Branch that triggered the run.
    pub branch: String,
    /// CI build counter; names the staging directory.
    pub run_id: String,
    pub tag: Option<String>,
    /// Ref to check out. Defaults to the designated branch.
    pub git_ref: Option<String>,
    /// Where `origin` is looked up when no `repo_url` is configured.
    pub workdir: PathBuf,
    pub registry_password: Option<SecretString>,
}

impl RunRequest {
    pub fn new(config: DockhandConfig, branch: &str, run_id: &str) -> Self {
        Self {
            config,
            branch: branch.to_owned(),
            run_id: run_id.to_owned(),
            tag: None,
            git_ref: None,
            workdir: PathBuf::from("."),
            registry_password: None,
        }
    }

    /// Build the run's context: repository URL, identity, run id.
    ///
    /// A relative `base_dir` is taken from `workdir`. Performs no filesystem
    /// side effects.
    pub async fn resolve<T: DeployTools>(
        &self,
        tools: &T,
    ) -> Result<DeploymentContext, PipelineError> {
        let (repo_url, identity) = discover_identity(tools, &self.config, &self.workdir).await?;
        let run_id = RunId::new(&self.run_id)?;
        let base_dir = self.config.base_dir_from(&self.workdir)?;

        Ok(DeploymentContext::new(
            repo_url,
            identity,
            self.tag.clone(),
            base_dir,
            run_id,
            self.config.deploy.files.clone(),
        ))
    }

    fn designated_branch(&self) -> &str {
        self.config.project.branch.trim()
    }

    fn checkout_ref(&self) -> &str {
        non_blank(self.git_ref.as_deref()).unwrap_or_else(|| self.designated_branch())
    }
}

/// Repository URL and identity for the project configured in `config`.
///
/// The URL is `[project].repo_url` when set, otherwise the `origin` remote
/// of the repository in `workdir`.
pub async fn discover_identity<T: DeployTools>(
    tools: &T,
    config: &DockhandConfig,
    workdir: &Path,
) -> Result<(String, RepoIdentity), PipelineError> {
    let repo_url = match non_blank(config.project.repo_url.as_deref()) {
        Some(url) => url.to_owned(),
        None => tools
            .remote_url(workdir)
            .await
            .map_err(|source| PipelineError::RemoteDiscovery { source })?,
    };
    let identity = RepoIdentity::resolve(&repo_url, &IdentityOverrides::from_config(config))?;
    Ok((repo_url, identity))
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Succeeded,
    Skipped { branch: String, designated: String },
    Failed { state: PipelineState, message: String },
}

/// Everything that happened during a run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// States entered, in order, ending with the terminal state.
    pub states: Vec<PipelineState>,
    /// Soft failures the run continued past.
    pub warnings: Vec<String>,
    pub promotion: Option<PromotionReport>,
    pub cleanup: CleanupReport,
    /// Reference pushed to the registry.
    pub image: Option<String>,
    /// The fatal error, when the run failed.
    #[serde(skip)]
    pub error: Option<PipelineError>,
}

impl RunReport {
    fn new() -> Self {
        Self {
            outcome: RunOutcome::Succeeded,
            states: Vec::new(),
            warnings: Vec::new(),
            promotion: None,
            cleanup: CleanupReport::default(),
            image: None,
            error: None,
        }
    }

    pub fn final_state(&self) -> PipelineState {
        match self.outcome {
            RunOutcome::Succeeded => PipelineState::Done,
            RunOutcome::Skipped { .. } => PipelineState::Skipped,
            RunOutcome::Failed { .. } => PipelineState::Failed,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, RunOutcome::Failed { .. })
    }

    fn enter(&mut self, state: PipelineState) {
        if !state.is_terminal() {
            tracing::info!(%state, "entering state");
        }
        self.states.push(state);
    }

    fn fail(&mut self, state: PipelineState, err: PipelineError) {
        let message = error::chain(&err);
        tracing::error!(%state, error = %message, "run failed");
        self.outcome = RunOutcome::Failed { state, message };
        self.error = Some(err);
        self.enter(PipelineState::Failed);
    }
}

/// Execute one deploy run to a terminal state.
///
/// Never returns early without a report: fatal errors are recorded in
/// [`RunReport::outcome`], and cleanup runs before returning whenever a
/// context was resolved.
pub async fn run<T: DeployTools>(tools: &T, request: &RunRequest) -> RunReport {
    let mut report = RunReport::new();
    report.enter(PipelineState::Resolving);

    let branch = request.branch.trim();
    let designated = request.designated_branch();
    if branch != designated {
        tracing::info!(%branch, %designated, "not the designated branch, skipping");
        report.outcome = RunOutcome::Skipped {
            branch: branch.to_owned(),
            designated: designated.to_owned(),
        };
        report.enter(PipelineState::Skipped);
        return report;
    }

    let ctx = match request.resolve(tools).await {
        Ok(ctx) => ctx,
        Err(e) => {
            report.fail(PipelineState::Resolving, e);
            return report;
        }
    };
    tracing::info!(
        owner = %ctx.owner(),
        name = %ctx.name(),
        run_id = %ctx.run_id(),
        temp_dir = %ctx.temp_dir().display(),
        "resolved deployment"
    );

    let mut state = PipelineState::Resolving;
    while let Some(next) = state.next() {
        state = next;
        report.enter(state);
        if state.is_terminal() {
            break;
        }

        match step(tools, request, &ctx, state, &mut report).await {
            StageOutcome::Ok => {}
            StageOutcome::SoftFail(reason) => {
                tracing::warn!(%state, "{reason}");
                report.warnings.push(reason);
            }
            StageOutcome::Fatal(error) => {
                report.fail(state, error);
                break;
            }
        }
    }

    report.cleanup = reconcile(&ctx);
    report
}

async fn step<T: DeployTools>(
    tools: &T,
    request: &RunRequest,
    ctx: &DeploymentContext,
    state: PipelineState,
    report: &mut RunReport,
) -> StageOutcome {
    let config = &request.config;
    let descriptor = config.deploy.descriptor.as_str();

    match state {
        PipelineState::Staging => dockhand_stage::create(ctx)
            .map_err(|source| PipelineError::Staging { source })
            .into(),
        PipelineState::Cloning => checkout(tools, request, ctx).await.into(),
        PipelineState::Building => stages::build::run(tools, ctx, descriptor).await,
        PipelineState::Promoting => {
            let promoted =
                dockhand_stage::promote(ctx.temp_dir(), ctx.base_project_dir(), ctx.deploy_files());
            match promoted {
                Ok(promotion) => {
                    report.promotion = Some(promotion);
                    StageOutcome::Ok
                }
                Err(source) => StageOutcome::Fatal(PipelineError::Promotion { source }),
            }
        }
        PipelineState::Stopping => stages::stop::run(tools, ctx, descriptor).await,
        PipelineState::Starting => stages::start::run(tools, ctx, descriptor).await,
        PipelineState::Publishing => {
            let login = non_blank(config.registry.user.as_deref()).map(|user| RegistryLogin {
                user,
                password: request.registry_password.as_ref(),
            });
            match stages::publish::run(tools, ctx, login).await {
                Ok(image) => {
                    report.image = Some(image);
                    StageOutcome::Ok
                }
                Err(e) => StageOutcome::Fatal(e),
            }
        }
        PipelineState::Pruning if config.deploy.prune => match tools.prune_dangling().await {
            Ok(()) => StageOutcome::Ok,
            Err(e) => StageOutcome::SoftFail(format!("prune failed: {e}")),
        },
        PipelineState::Pruning => StageOutcome::Ok,
        PipelineState::Resolving
        | PipelineState::Done
        | PipelineState::Failed
        | PipelineState::Skipped => StageOutcome::Ok,
    }
}

/// Check out the repository into the staging area, then copy the secret
/// files in. git only clones into an empty directory.
async fn checkout<T: DeployTools>(
    tools: &T,
    request: &RunRequest,
    ctx: &DeploymentContext,
) -> Result<(), PipelineError> {
    let spec = CheckoutSpec {
        url: ctx.repo_url().to_owned(),
        git_ref: request.checkout_ref().to_owned(),
        dest: ctx.temp_dir().to_path_buf(),
        ssh_key: request.config.secrets.ssh_key.clone(),
    };
    tools
        .checkout(&spec)
        .await
        .map_err(|source| PipelineError::Checkout { source })?;

    let secrets = &request.config.secrets;
    let deploy = &request.config.deploy;
    for (path, file_name) in [
        (&secrets.env_file, &deploy.env_file_name),
        (&secrets.credentials_file, &deploy.credentials_file_name),
    ] {
        if let Some(path) = path {
            dockhand_stage::place_secret(ctx.temp_dir(), path, file_name)
                .map_err(|source| PipelineError::SecretPlacement { source })?;
        }
    }
    Ok(())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
