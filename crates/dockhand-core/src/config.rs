use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "dockhand.toml";

/// Registry used when `[registry].host` is not set.
pub const DEFAULT_REGISTRY: &str = "ghcr.io";

/// Artifacts promoted from the staging area into the project directory.
pub const DEFAULT_DEPLOY_FILES: &[&str] =
    &["docker-compose.yml", ".env", ".env.local", "credentials.json"];

/// dockhand.toml configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DockhandConfig {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub deploy: DeployConfig,
    #[serde(default)]
    pub secrets: SecretsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Repository remote URL (defaults to `git remote get-url origin`)
    pub repo_url: Option<String>,
    /// Image owner (defaults to the owner segment of the remote URL)
    pub owner: Option<String>,
    /// Project name (defaults to the repository name)
    pub name: Option<String>,
    /// Root directory holding every deployed project
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
    /// Only runs triggered from this branch deploy
    #[serde(default = "default_branch")]
    pub branch: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Container registry host
    #[serde(default = "default_registry")]
    pub host: String,
    /// Registry user; login is skipped when unset
    pub user: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Stack descriptor file name
    #[serde(default = "default_descriptor")]
    pub descriptor: String,
    /// Files promoted from staging into the project directory
    #[serde(default = "default_deploy_files")]
    pub files: Vec<String>,
    /// Name the secret env file is placed under in staging
    #[serde(default = "default_env_file_name")]
    pub env_file_name: String,
    /// Name the credentials file is placed under in staging
    #[serde(default = "default_credentials_file_name")]
    pub credentials_file_name: String,
    /// Remove dangling images after publishing
    #[serde(default = "default_prune")]
    pub prune: bool,
}

/// Paths to secret material provided by the invoking environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretsConfig {
    /// Env file copied into staging as `deploy.env_file_name`
    pub env_file: Option<PathBuf>,
    /// Credentials file copied into staging as `deploy.credentials_file_name`
    pub credentials_file: Option<PathBuf>,
    /// SSH private key used for the repository checkout
    pub ssh_key: Option<PathBuf>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            repo_url: None,
            owner: None,
            name: None,
            base_dir: default_base_dir(),
            branch: default_branch(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            host: default_registry(),
            user: None,
        }
    }
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            descriptor: default_descriptor(),
            files: default_deploy_files(),
            env_file_name: default_env_file_name(),
            credentials_file_name: default_credentials_file_name(),
            prune: default_prune(),
        }
    }
}

impl DockhandConfig {
    /// Load from dockhand.toml in the given directory, or return defaults if not found.
    pub fn load(dir: &Path) -> crate::Result<Self> {
        let config_path = dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            let content =
                std::fs::read_to_string(&config_path).map_err(|e| crate::Error::ConfigLoad {
                    path: config_path.clone(),
                    source: e,
                })?;
            let config = toml::from_str(&content).map_err(|e| crate::Error::ConfigParse {
                path: config_path.clone(),
                source: e,
            })?;
            tracing::debug!(path = %config_path.display(), "loaded config");
            Ok(config)
        } else {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// `[project].base_dir` as an absolute path. A relative value is taken
    /// from `workdir`, the directory the config was loaded from.
    pub fn base_dir_from(&self, workdir: &Path) -> crate::Result<PathBuf> {
        let joined = workdir.join(&self.project.base_dir);
        std::path::absolute(&joined).map_err(|e| crate::Error::BaseDir {
            path: joined,
            source: e,
        })
    }
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("/srv")
}

fn default_branch() -> String {
    "main".to_owned()
}

fn default_registry() -> String {
    DEFAULT_REGISTRY.to_owned()
}

fn default_descriptor() -> String {
    "docker-compose.yml".to_owned()
}

fn default_deploy_files() -> Vec<String> {
    DEFAULT_DEPLOY_FILES.iter().map(|s| (*s).to_owned()).collect()
}

fn default_env_file_name() -> String {
    ".env".to_owned()
}

fn default_credentials_file_name() -> String {
    "credentials.json".to_owned()
}

fn default_prune() -> bool {
    true
}
