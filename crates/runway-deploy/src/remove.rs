use crate::error::{Operation, PipelineError};
use crate::pipeline::Deployer;
use runway_cloud::{Deletion, PlatformGateway, Target};
use runway_core::DeploymentRecord;

/// What `runway remove` is about to delete, shown before confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalPlan {
    pub name: String,
    /// Local history entry, if there is one.
    pub record: Option<DeploymentRecord>,
    pub project_id: String,
    pub region: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    /// The platform had no such service; local history was cleaned anyway.
    AlreadyAbsent,
    /// The user declined. Nothing was touched.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveReport {
    pub outcome: RemoveOutcome,
    pub warnings: Vec<String>,
}

impl<G: PlatformGateway> Deployer<G> {
    /// Delete a deployed service and its history entry.
    ///
    /// `confirm` sees the plan and decides whether to go ahead; pass
    /// `|_| Ok(true)` to skip the prompt. History is only cleaned once the
    /// platform has confirmed the service is gone.
    pub async fn remove<F>(&self, name: &str, confirm: F) -> Result<RemoveReport, PipelineError>
    where
        F: FnOnce(&RemovalPlan) -> std::io::Result<bool>,
    {
        let config = self.load_config()?;
        let mut warnings = Vec::new();

        let record = match self.store.find_record(name) {
            Ok(Some(record)) => Some(record),
            Ok(None) => {
                let warning = format!("'{name}' is not in local deployment history");
                tracing::warn!("{warning}");
                warnings.push(warning);
                None
            }
            Err(e) => {
                let warning = format!("could not read deployment history: {e}");
                tracing::warn!("{warning}");
                warnings.push(warning);
                None
            }
        };

        let region = record
            .as_ref()
            .map_or_else(|| config.region.clone(), |r| r.region.clone());
        let plan = RemovalPlan {
            name: name.to_owned(),
            record,
            project_id: config.project_id.clone(),
            region,
        };

        let confirmed = confirm(&plan).map_err(|e| PipelineError::Prompt { source: e })?;
        if !confirmed {
            tracing::info!(service = name, "removal cancelled");
            return Ok(RemoveReport {
                outcome: RemoveOutcome::Cancelled,
                warnings,
            });
        }

        let target = Target::new(&plan.project_id, &plan.region);
        let outcome = match self.gateway.delete_service(&target, name).await {
            Ok(Deletion::Deleted) => RemoveOutcome::Removed,
            Ok(Deletion::NotFound) => RemoveOutcome::AlreadyAbsent,
            Err(e) if e.is_not_found() => RemoveOutcome::AlreadyAbsent,
            Err(e) => return Err(PipelineError::classify(Operation::Delete, e)),
        };
        tracing::info!(service = name, ?outcome, "service removed");

        self.store
            .remove_record(name)
            .map_err(|e| PipelineError::State { source: e })?;

        Ok(RemoveReport { outcome, warnings })
    }
}
