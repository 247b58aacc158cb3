//! Core types and configuration for dockhand.
//!
//! This crate defines the `dockhand.toml` schema ([`DockhandConfig`]),
//! repository identity resolution ([`RepoIdentity`]), the per-run
//! [`DeploymentContext`], and shared error types.

pub mod config;
pub mod context;
pub mod error;
pub mod identity;

pub use config::{
    CONFIG_FILE_NAME, DEFAULT_DEPLOY_FILES, DEFAULT_REGISTRY, DeployConfig, DockhandConfig,
    ProjectConfig, RegistryConfig, SecretsConfig,
};
pub use context::{DeploymentContext, RunId, STAGING_PREFIX, staging_dir_name};
pub use error::{Error, Result};
pub use identity::{IdentityOverrides, RepoIdentity};
