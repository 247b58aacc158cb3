//! Staging area management, artifact promotion, and cleanup for dockhand.
//!
//! # Filesystem layout
//!
//! ```text
//! <base_dir>/<name>/                 permanent project directory
//!   docker-compose.yml .env ...      promoted artifacts
//!   .tmp_<run_id>/                   staging area for the current run
//!   .tmp_<old_run>/ .tmp_<id>@tmp/   orphans left by killed runs
//! ```
//!
//! Only `.tmp_*` children are ever removed. The project directory itself
//! and anything promoted into it are never deleted here.

pub mod cleanup;
pub mod promote;
pub mod staging;

pub use cleanup::{CleanupReport, destroy, is_staging_dir_name, sweep_orphans};
pub use promote::{PromoteError, PromotionReport, promote};
pub use staging::{StagingError, create, place_secret};
