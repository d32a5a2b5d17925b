use crate::error::{Operation, PipelineError};
use crate::pipeline::Deployer;
use runway_cloud::{PlatformGateway, ServiceDescriptor, Target};
use runway_core::DeploymentRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentStatus {
    pub service: ServiceDescriptor,
    pub record: Option<DeploymentRecord>,
}

impl<G: PlatformGateway> Deployer<G> {
    /// Describe one deployment (the production service when `None`).
    pub async fn status(
        &self,
        deployment: Option<&str>,
    ) -> Result<DeploymentStatus, PipelineError> {
        let config = self.load_config()?;
        let name = deployment.unwrap_or(&config.service_name);

        let record = self
            .store
            .find_record(name)
            .map_err(|e| PipelineError::State { source: e })?;
        let region = record
            .as_ref()
            .map_or(config.region.as_str(), |r| r.region.as_str());
        let target = Target::new(&config.project_id, region);

        let service = match self.gateway.get_service(&target, name).await {
            Ok(Some(service)) => service,
            Ok(None) => return Err(PipelineError::NotFound { name: name.to_owned() }),
            Err(e) if e.is_not_found() => {
                return Err(PipelineError::NotFound { name: name.to_owned() });
            }
            Err(e) => return Err(PipelineError::classify(Operation::Describe, e)),
        };

        Ok(DeploymentStatus { service, record })
    }
}
