pub mod doctor;
pub mod error;
pub mod executor;
pub mod toolchain;

pub use doctor::{CheckResult, DoctorReport};
pub use error::ToolError;
pub use executor::{CommandExecutor, Invocation, RealExecutor};
pub use toolchain::{CheckoutSpec, DeployTools, DockerToolchain};
