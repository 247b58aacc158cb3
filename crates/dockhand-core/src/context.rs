use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;

use crate::identity::RepoIdentity;

/// Prefix shared by every per-run staging directory.
pub const STAGING_PREFIX: &str = ".tmp_";

/// Identifier of one pipeline run, usually the CI build number.
///
/// Validated so that `.tmp_<run_id>` always names a direct child of the
/// project directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    pub fn new(raw: &str) -> crate::Result<Self> {
        let trimmed = raw.trim();
        let reason = if trimmed.is_empty() {
            Some("must not be empty")
        } else if trimmed == "." || trimmed == ".." {
            Some("must not be a relative directory name")
        } else if trimmed
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_control() || c.is_whitespace())
        {
            Some("must not contain path separators or whitespace")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(crate::Error::InvalidRunId {
                run_id: raw.to_owned(),
                reason,
            }),
            None => Ok(Self(trimmed.to_owned())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for RunId {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Self::new(s)
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything one run needs to know, resolved up front.
///
/// Built once when the repository identity is known and only read
/// afterwards. `temp_dir` is always `base_project_dir/.tmp_<run_id>`.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentContext {
    repo_url: String,
    owner: String,
    name: String,
    registry: String,
    tag: Option<String>,
    base_dir: PathBuf,
    base_project_dir: PathBuf,
    run_id: RunId,
    temp_dir: PathBuf,
    deploy_files: Vec<String>,
}

impl DeploymentContext {
    pub fn new(
        repo_url: impl Into<String>,
        identity: RepoIdentity,
        tag: Option<String>,
        base_dir: impl Into<PathBuf>,
        run_id: RunId,
        deploy_files: Vec<String>,
    ) -> Self {
        let base_dir = base_dir.into();
        let base_project_dir = base_dir.join(&identity.name);
        let temp_dir = base_project_dir.join(staging_dir_name(&run_id));
        let tag = tag.map(|t| t.trim().to_owned()).filter(|t| !t.is_empty());

        Self {
            repo_url: repo_url.into(),
            owner: identity.owner,
            name: identity.name,
            registry: identity.registry,
            tag,
            base_dir,
            base_project_dir,
            run_id,
            temp_dir,
            deploy_files,
        }
    }

    pub fn repo_url(&self) -> &str {
        &self.repo_url
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn registry(&self) -> &str {
        &self.registry
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Permanent directory, durable across runs.
    pub fn base_project_dir(&self) -> &Path {
        &self.base_project_dir
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// Per-run staging directory.
    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    pub fn deploy_files(&self) -> &[String] {
        &self.deploy_files
    }

    /// Fully qualified `registry/owner/name:tag`.
    ///
    /// Fields are checked in that order; the error carries the name of the
    /// first one that is empty.
    pub fn image_ref(&self) -> Result<String, &'static str> {
        let tag = self.tag.as_deref().unwrap_or_default();
        for (field, value) in [
            ("registry", self.registry.as_str()),
            ("owner", self.owner.as_str()),
            ("name", self.name.as_str()),
            ("tag", tag),
        ] {
            if value.trim().is_empty() {
                return Err(field);
            }
        }
        Ok(format!(
            "{registry}/{owner}/{name}:{tag}",
            registry = self.registry,
            owner = self.owner,
            name = self.name,
        ))
    }
}

/// `.tmp_<run_id>`
pub fn staging_dir_name(run_id: &RunId) -> String {
    format!("{STAGING_PREFIX}{run_id}")
}
