mod deploy;
mod init;
mod list;
mod logs;
mod remove;
mod status;

use runway_cloud::GcloudGateway;
use runway_core::StateStore;
use runway_deploy::Deployer;
use std::path::Path;

pub use deploy::deploy;
pub use init::{InitArgs, init};
pub use list::list;
pub use logs::logs;
pub use remove::remove;
pub use status::status;

/// Deployer for the project in the current directory.
fn deployer() -> anyhow::Result<Deployer<GcloudGateway>> {
    let store = StateStore::open(Path::new("."))?;
    Ok(Deployer::new(GcloudGateway::new(), store))
}
