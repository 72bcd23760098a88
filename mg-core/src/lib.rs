//! mg-core: shared ids, error kinds, and configuration for the job
//! execution engine.

pub mod config;
pub mod errors;
pub mod ids;
pub mod status;

pub use config::{AppConfig, ConfigError, RawConfig};
pub use errors::{DogError, DogResult, ErrorKind};
pub use ids::{ExecutionId, JobId, SplitId, UserId};
pub use status::{legacy_status_to_execution_status, ExecutionStatus};
