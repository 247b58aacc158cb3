//! Repository identity resolution.
//!
//! Turns a git remote URL into the `owner`/`name` pair used for image
//! coordinates and the project directory name:
//!
//! ```text
//! git@github.com:AcmeCo/My-App.git   → acmeco / my-app
//! https://github.com/AcmeCo/My-App   → acmeco / my-app
//! ```

use serde::Serialize;

use crate::config::{DEFAULT_REGISTRY, DockhandConfig};

const ARCHIVE_SUFFIX: &str = ".git";

/// Values that win over whatever the remote URL yields.
///
/// Blank strings count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityOverrides {
    pub owner: Option<String>,
    pub name: Option<String>,
    pub registry: Option<String>,
}

impl IdentityOverrides {
    pub fn from_config(config: &DockhandConfig) -> Self {
        Self {
            owner: config.project.owner.clone(),
            name: config.project.name.clone(),
            registry: Some(config.registry.host.clone()),
        }
    }
}

/// Image coordinates derived from a repository.
///
/// # Examples
///
/// ```
/// use dockhand_core::{IdentityOverrides, RepoIdentity};
///
/// let id = RepoIdentity::resolve("git@host:AcmeCo/My-App.git", &IdentityOverrides::default())
///     .unwrap();
/// assert_eq!(id.owner, "acmeco");
/// assert_eq!(id.name, "my-app");
/// assert_eq!(id.registry, "ghcr.io");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoIdentity {
    pub owner: String,
    pub name: String,
    pub registry: String,
}

impl RepoIdentity {
    /// Derive owner and name from `url`, then apply `overrides`.
    ///
    /// Fails if the URL has fewer than two path segments or the repository
    /// segment is empty once the `.git` suffix is removed.
    pub fn resolve(url: &str, overrides: &IdentityOverrides) -> crate::Result<Self> {
        let (derived_owner, derived_name) = split_remote(url)?;

        let owner = non_blank(&overrides.owner).unwrap_or(derived_owner);
        let name = match non_blank(&overrides.name) {
            Some(name) if !is_single_segment(&name) => {
                return Err(crate::Error::InvalidNameOverride { name });
            }
            Some(name) => name,
            None => derived_name,
        };
        let registry =
            non_blank(&overrides.registry).unwrap_or_else(|| DEFAULT_REGISTRY.to_owned());

        tracing::debug!(%owner, %name, %registry, "resolved repository identity");

        Ok(Self {
            owner,
            name,
            registry,
        })
    }
}

/// Split a remote URL into lowercase `(owner, name)`.
fn split_remote(url: &str) -> crate::Result<(String, String)> {
    let normalized = url.trim().replace(':', "/");
    let segments: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();

    let [.., owner, repo] = segments.as_slice() else {
        return Err(crate::Error::MalformedRepoUrl {
            url: url.to_owned(),
            reason: "expected at least <owner>/<repo>",
        });
    };

    let repo = repo.to_lowercase();
    let name = repo.strip_suffix(ARCHIVE_SUFFIX).unwrap_or(&repo);
    if name.is_empty() {
        return Err(crate::Error::MalformedRepoUrl {
            url: url.to_owned(),
            reason: "repository name is empty",
        });
    }

    Ok((owner.to_lowercase(), name.to_owned()))
}

fn is_single_segment(name: &str) -> bool {
    !(name.contains('/') || name.contains('\\') || name == "." || name == "..")
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}
