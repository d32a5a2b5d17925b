use crate::error::{Operation, PipelineError};
use crate::pipeline::Deployer;
use chrono::{DateTime, Utc};
use runway_cloud::{PlatformGateway, ServiceDescriptor, Target};
use runway_core::{DeploymentHistory, DeploymentKind, naming};

/// Which partitions `runway list` shows. Neither flag set means both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub production: bool,
    pub preview: bool,
}

impl ListFilter {
    pub fn includes(self, kind: DeploymentKind) -> bool {
        if !self.production && !self.preview {
            return true;
        }
        match kind {
            DeploymentKind::Production => self.production,
            DeploymentKind::Preview => self.preview,
        }
    }
}

/// A remote service joined with what local history knows about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedDeployment {
    pub name: String,
    pub kind: DeploymentKind,
    /// `None` when the service is not in local history.
    pub branch: Option<String>,
    pub url: String,
    pub deployed_at: Option<DateTime<Utc>>,
    pub in_history: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub production: Vec<ListedDeployment>,
    pub preview: Vec<ListedDeployment>,
}

impl Listing {
    pub fn is_empty(&self) -> bool {
        self.production.is_empty() && self.preview.is_empty()
    }
}

impl<G: PlatformGateway> Deployer<G> {
    /// Remote services belonging to this project, partitioned by kind.
    ///
    /// The remote list decides what exists. Services missing from history
    /// are classified by name alone: an exact match with the production name
    /// is production, anything else is a preview. That guess is best-effort.
    pub async fn list(&self, filter: ListFilter) -> Result<Listing, PipelineError> {
        let config = self.load_config()?;
        let target = Target::new(&config.project_id, &config.region);

        let services = match self.gateway.list_services(&target).await {
            Ok(services) => services,
            Err(e) if e.is_not_found() => {
                tracing::debug!(error = %e, "no services found");
                Vec::new()
            }
            Err(e) => return Err(PipelineError::classify(Operation::List, e)),
        };

        let history = match self.store.read_history() {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!("could not read deployment history: {e}");
                DeploymentHistory::default()
            }
        };

        let mut listing = Listing::default();
        for service in services
            .into_iter()
            .filter(|s| naming::belongs_to(&config.service_name, &s.name))
        {
            let listed = join(service, &history, &config.service_name);
            if !filter.includes(listed.kind) {
                continue;
            }
            match listed.kind {
                DeploymentKind::Production => listing.production.push(listed),
                DeploymentKind::Preview => listing.preview.push(listed),
            }
        }

        Ok(listing)
    }
}

fn join(
    service: ServiceDescriptor,
    history: &DeploymentHistory,
    production_name: &str,
) -> ListedDeployment {
    match history.find(&service.name) {
        Some(record) => ListedDeployment {
            kind: record.kind,
            branch: Some(record.branch.clone()),
            url: if service.url.is_empty() {
                record.url.clone()
            } else {
                service.url
            },
            deployed_at: Some(record.created_at),
            in_history: true,
            name: service.name,
        },
        None => ListedDeployment {
            kind: if service.name == production_name {
                DeploymentKind::Production
            } else {
                DeploymentKind::Preview
            },
            branch: None,
            url: service.url,
            deployed_at: service.created_at,
            in_history: false,
            name: service.name,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_includes_everything() {
        let filter = ListFilter::default();
        assert!(filter.includes(DeploymentKind::Production));
        assert!(filter.includes(DeploymentKind::Preview));
    }

    #[test]
    fn single_flag_filters() {
        let filter = ListFilter {
            production: true,
            preview: false,
        };
        assert!(filter.includes(DeploymentKind::Production));
        assert!(!filter.includes(DeploymentKind::Preview));
    }
}
