//! Platform boundary for runway.
//!
//! [`PlatformGateway`] is the single seam between the orchestrator and the
//! outside world: the local container engine, Cloud Run, and Cloud Logging.
//! [`GcloudGateway`] implements it by shelling out to `docker` and `gcloud`
//! through a [`CommandExecutor`], which tests replace with mocks.

pub mod client;
pub mod command;
pub mod executor;
pub mod gateway;
pub mod logs;

pub use client::GcloudGateway;
pub use command::CommandError;
pub use executor::{CommandExecutor, RealExecutor, Tool};
pub use gateway::{
    Deletion, GatewayError, PlatformGateway, ServiceDescriptor, ServiceRequest, Target,
};
pub use logs::{DEFAULT_LOG_LIMIT, FOLLOW_INTERVAL, LogEntry, LogQuery, LogStream, Severity};
