//! Orchestration for runway: deploy, list, logs, status, and remove.
//!
//! [`Deployer`] sequences the local state store (`runway-core`) and the
//! platform gateway (`runway-cloud`) into each command. It owns error
//! classification: every remote failure becomes a [`PipelineError`] carrying
//! the failed step and, for permission failures, the roles to grant.
//!
//! # Naming
//!
//! ```text
//! branch main (or --production)  → app
//! branch feature/X (or --preview) → app-feature-x-k3j9x0qa
//! ```
//!
//! Previews get a fresh random suffix on every deploy, so redeploying a
//! branch creates a new service rather than replacing the previous preview.

pub mod error;
pub mod git;
pub mod list;
pub mod logs;
pub mod pipeline;
pub mod remove;
pub mod status;

pub use error::{Aborted, Operation, PipelineError, PreflightFailure, Stage};
pub use list::{ListFilter, ListedDeployment, Listing};
pub use pipeline::{DeployReport, DeployRequest, Deployer, IMAGE_PLATFORM};
pub use remove::{RemovalPlan, RemoveOutcome, RemoveReport};
pub use status::DeploymentStatus;
