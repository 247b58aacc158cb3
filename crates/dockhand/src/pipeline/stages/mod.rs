//! Steps that talk to external tools.
//!
//! Each takes the run's [`DeploymentContext`](dockhand_core::DeploymentContext)
//! by reference and reports a [`StageOutcome`](super::StageOutcome).

pub mod build;
pub mod publish;
pub mod start;
pub mod stop;
