use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};

use crate::doctor::{CheckResult, DoctorReport};
use crate::error::ToolError;
use crate::executor::{CommandExecutor, Invocation, RealExecutor};

/// What to clone and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSpec {
    pub url: String,
    /// Branch, tag, or full commit id.
    pub git_ref: String,
    pub dest: PathBuf,
    /// Private key for SSH remotes; the agent/default key is used when unset.
    pub ssh_key: Option<PathBuf>,
}

/// Every external operation the deploy pipeline needs, one method each.
///
/// [`DockerToolchain`] implements this with git and docker compose; tests
/// substitute a mock.
#[allow(async_fn_in_trait)]
pub trait DeployTools: Send + Sync {
    /// URL of the `origin` remote of the repository in `repo_dir`.
    async fn remote_url(&self, repo_dir: &Path) -> Result<String, ToolError>;

    async fn checkout(&self, spec: &CheckoutSpec) -> Result<(), ToolError>;

    /// Build the images of the stack described by `descriptor`.
    async fn build(
        &self,
        descriptor: &Path,
        workdir: &Path,
        env: &[(String, String)],
    ) -> Result<(), ToolError>;

    async fn login(
        &self,
        registry: &str,
        user: &str,
        secret: &SecretString,
    ) -> Result<(), ToolError>;

    /// Bring the stack down.
    async fn stop(&self, descriptor: &Path) -> Result<(), ToolError>;

    /// Bring the stack up, detached.
    async fn start(&self, descriptor: &Path) -> Result<(), ToolError>;

    async fn push(&self, image_ref: &str) -> Result<(), ToolError>;

    /// Remove dangling images.
    async fn prune_dangling(&self) -> Result<(), ToolError>;
}

/// git + docker compose, parameterized over the executor for testability.
pub struct DockerToolchain<E: CommandExecutor = RealExecutor> {
    executor: E,
}

impl DockerToolchain<RealExecutor> {
    pub fn new() -> Self {
        Self {
            executor: RealExecutor,
        }
    }
}

impl Default for DockerToolchain<RealExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: CommandExecutor> DockerToolchain<E> {
    pub fn with_executor(executor: E) -> Self {
        Self { executor }
    }

    /// Check that git, docker, and the compose plugin are usable.
    ///
    /// Runs every check without early return.
    pub async fn doctor(&self) -> DoctorReport {
        let mut report = DoctorReport::default();

        report.git = match self.executor.exec(&git(["--version"])).await {
            Ok(v) => {
                // "git version 2.43.0"
                let v = v.trim();
                CheckResult::ok(v.strip_prefix("git version ").unwrap_or(v))
            }
            Err(e) => CheckResult::fail(&e.to_string()),
        };

        report.docker = match self
            .executor
            .exec(&docker(["version", "--format", "{{.Server.Version}}"]))
            .await
        {
            Ok(v) if !v.trim().is_empty() => CheckResult::ok(v.trim()),
            Ok(_) => CheckResult::fail("docker daemon did not report a version"),
            Err(e) => CheckResult::fail(&e.to_string()),
        };

        report.compose = match self
            .executor
            .exec(&docker(["compose", "version", "--short"]))
            .await
        {
            Ok(v) => CheckResult::ok(v.trim()),
            Err(e) => CheckResult::fail(&format!("docker compose plugin not available ({e})")),
        };

        report
    }
}

impl<E: CommandExecutor> DeployTools for DockerToolchain<E> {
    async fn remote_url(&self, repo_dir: &Path) -> Result<String, ToolError> {
        let output = self
            .executor
            .exec(&git(["remote", "get-url", "origin"]).current_dir(repo_dir))
            .await?;
        Ok(output.trim().to_owned())
    }

    async fn checkout(&self, spec: &CheckoutSpec) -> Result<(), ToolError> {
        let dest = path_arg(&spec.dest)?;
        let ssh = spec.ssh_key.as_deref().map(ssh_command).transpose()?;
        let with_ssh = |invocation: Invocation| match &ssh {
            Some(command) => invocation.env("GIT_SSH_COMMAND", command),
            None => invocation,
        };

        if !is_commit_id(&spec.git_ref) {
            let clone = git([
                "clone",
                "--depth",
                "1",
                "--branch",
                &spec.git_ref,
                &spec.url,
                dest,
            ]);
            return self.executor.exec_streaming(&with_ssh(clone)).await;
        }

        // `clone --branch` only takes branch and tag names.
        self.executor.exec(&git(["init", "--quiet", dest])).await?;
        let fetch = git(["fetch", "--depth", "1", &spec.url, &spec.git_ref]).current_dir(dest);
        self.executor.exec_streaming(&with_ssh(fetch)).await?;
        self.executor
            .exec(&git(["checkout", "--quiet", "--detach", "FETCH_HEAD"]).current_dir(dest))
            .await?;
        Ok(())
    }

    async fn build(
        &self,
        descriptor: &Path,
        workdir: &Path,
        env: &[(String, String)],
    ) -> Result<(), ToolError> {
        let mut invocation = compose(workdir, descriptor, &["build"])?;
        for (key, value) in env {
            invocation = invocation.env(key, value);
        }
        self.executor.exec_streaming(&invocation).await
    }

    async fn login(
        &self,
        registry: &str,
        user: &str,
        secret: &SecretString,
    ) -> Result<(), ToolError> {
        self.executor
            .exec_with_stdin(
                &docker(["login", registry, "--username", user, "--password-stdin"]),
                secret.expose_secret().as_bytes(),
            )
            .await?;
        Ok(())
    }

    async fn stop(&self, descriptor: &Path) -> Result<(), ToolError> {
        let invocation = compose(descriptor_dir(descriptor), descriptor, &["down"])?;
        self.executor.exec_streaming(&invocation).await
    }

    async fn start(&self, descriptor: &Path) -> Result<(), ToolError> {
        let invocation = compose(descriptor_dir(descriptor), descriptor, &["up", "-d"])?;
        self.executor.exec_streaming(&invocation).await
    }

    async fn push(&self, image_ref: &str) -> Result<(), ToolError> {
        self.executor.exec_streaming(&docker(["push", image_ref])).await
    }

    async fn prune_dangling(&self) -> Result<(), ToolError> {
        self.executor.exec(&docker(["image", "prune", "--force"])).await?;
        Ok(())
    }
}

// ── Helpers ──

fn git<const N: usize>(a: [&str; N]) -> Invocation {
    Invocation::new("git", a.iter().map(|s| (*s).to_owned()).collect())
}

fn docker<const N: usize>(a: [&str; N]) -> Invocation {
    Invocation::new("docker", a.iter().map(|s| (*s).to_owned()).collect())
}

fn ssh_command(key: &Path) -> Result<String, ToolError> {
    let key = path_arg(key)?;
    Ok(format!(
        "ssh -i {key} -o IdentitiesOnly=yes -o StrictHostKeyChecking=accept-new"
    ))
}

/// A full SHA-1 or SHA-256 object name.
fn is_commit_id(git_ref: &str) -> bool {
    matches!(git_ref.len(), 40 | 64) && git_ref.bytes().all(|b| b.is_ascii_hexdigit())
}

/// `docker compose -f <descriptor> <subcommand...>` run from `dir`.
///
/// `-f` is resolved against the working directory, so a descriptor directly
/// in `dir` is passed by file name.
fn compose(dir: &Path, descriptor: &Path, subcommand: &[&str]) -> Result<Invocation, ToolError> {
    let file = match descriptor.file_name() {
        Some(name) if descriptor.parent() == Some(dir) => Path::new(name),
        _ => descriptor,
    };
    let mut args = vec![
        "compose".to_owned(),
        "-f".to_owned(),
        path_arg(file)?.to_owned(),
    ];
    args.extend(subcommand.iter().map(|s| (*s).to_owned()));

    let invocation = Invocation::new("docker", args);
    if dir.as_os_str().is_empty() {
        Ok(invocation)
    } else {
        Ok(invocation.current_dir(dir))
    }
}

/// Compose takes relative paths and the project name from the working
/// directory, so stack commands run next to the descriptor.
fn descriptor_dir(descriptor: &Path) -> &Path {
    descriptor.parent().unwrap_or(Path::new(""))
}

fn path_arg(path: &Path) -> Result<&str, ToolError> {
    path.to_str().ok_or_else(|| ToolError::InvalidPath(path.to_path_buf()))
}
