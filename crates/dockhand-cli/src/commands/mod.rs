mod deploy;
mod doctor;
mod identity;
mod init;
mod sweep;

pub use deploy::{DeployArgs, deploy};
pub use doctor::doctor;
pub use identity::identity;
pub use init::init_config;
pub use sweep::sweep;
