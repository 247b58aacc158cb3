use dockhand_core::DeploymentContext;
use dockhand_tools::DeployTools;
use secrecy::SecretString;

use crate::pipeline::PipelineError;

/// Registry account used before pushing.
pub struct RegistryLogin<'a> {
    pub user: &'a str,
    pub password: Option<&'a SecretString>,
}

/// Push the built image as `registry/owner/name:tag`.
///
/// Every coordinate is checked first, in that order. When a login is given
/// it happens before the push. Returns the pushed reference.
pub async fn run<T: DeployTools>(
    tools: &T,
    ctx: &DeploymentContext,
    login: Option<RegistryLogin<'_>>,
) -> Result<String, PipelineError> {
    let image = ctx.image_ref().map_err(PipelineError::MissingField)?;

    if let Some(login) = login {
        let password = login
            .password
            .ok_or(PipelineError::MissingField("registry password"))?;
        tracing::info!(registry = %ctx.registry(), user = %login.user, "logging in");
        tools
            .login(ctx.registry(), login.user, password)
            .await
            .map_err(|source| PipelineError::Login { source })?;
    }

    tracing::info!(%image, "pushing");
    tools
        .push(&image)
        .await
        .map_err(|source| PipelineError::Push { source })?;
    Ok(image)
}
