//! Core types and local state for runway.
//!
//! This crate owns everything runway persists and derives without touching
//! the network: the `.runway/config.json` schema ([`ProjectConfig`]), the
//! deployment history ([`DeploymentHistory`]), global preferences, the
//! [`StateStore`] that reads and writes them, service naming
//! ([`naming`]), and `.env` parsing ([`env`]).

pub mod config;
pub mod env;
pub mod error;
pub mod history;
pub mod naming;
pub mod store;

pub use config::{GlobalPreferences, ProjectConfig, ServiceResources};
pub use error::{Error, Result};
pub use history::{DeploymentHistory, DeploymentKind, DeploymentRecord};
pub use store::StateStore;
