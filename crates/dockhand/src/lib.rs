//! Build, stage, and promote docker compose deployments.
//!
//! This is the facade crate. It re-exports the dockhand sub-crates and owns
//! the deploy pipeline that ties them together.
//!
//! | Module | Crate | Description |
//! |--------|-------|-------------|
//! | root | `dockhand-core` | Configuration, repository identity, run context |
//! | [`stage`] | `dockhand-stage` | Staging area, promotion, and cleanup |
//! | [`tools`] | `dockhand-tools` | git and docker compose operations |
//! | [`pipeline`] | this crate | The run state machine |
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use dockhand::DockhandConfig;
//! use dockhand::pipeline::{self, RunRequest};
//! use dockhand::tools::DockerToolchain;
//!
//! # async fn deploy() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DockhandConfig::load(Path::new("."))?;
//! let request = RunRequest::new(config, "main", "42");
//! let report = pipeline::run(&DockerToolchain::new(), &request).await;
//! println!("{:?}", report.outcome);
//! # Ok(())
//! # }
//! ```

// Core types flattened into root namespace for convenience.
pub use dockhand_core::*;

pub mod pipeline;

/// Staging area creation, artifact promotion, and best-effort cleanup.
pub mod stage {
    pub use dockhand_stage::*;
}

/// External tool operations behind the [`DeployTools`](tools::DeployTools) trait.
pub mod tools {
    pub use dockhand_tools::*;
}

pub use pipeline::{PipelineError, PipelineState, RunOutcome, RunReport, RunRequest};
