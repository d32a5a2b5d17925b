use crate::error::{Operation, PipelineError};
use crate::pipeline::Deployer;
use chrono::Utc;
use runway_cloud::{LogEntry, LogQuery, LogStream, PlatformGateway, Target};
use runway_core::ProjectConfig;
use tokio_util::sync::CancellationToken;

impl<G: PlatformGateway> Deployer<G> {
    /// The most recent `limit` entries for `deployment` (the production
    /// service when `None`), oldest first.
    pub async fn tail_logs(
        &self,
        deployment: Option<&str>,
        limit: u32,
    ) -> Result<Vec<LogEntry>, PipelineError> {
        let config = self.load_config()?;
        let (target, service) = self.log_target(&config, deployment);
        self.fetch_recent(&target, &service, limit).await
    }

    /// Print recent entries, then poll for new ones until `cancel` fires.
    pub async fn follow_logs<F>(
        &self,
        deployment: Option<&str>,
        limit: u32,
        cancel: CancellationToken,
        mut on_entry: F,
    ) -> Result<(), PipelineError>
    where
        F: FnMut(LogEntry),
    {
        let config = self.load_config()?;
        let (target, service) = self.log_target(&config, deployment);

        let recent = self.fetch_recent(&target, &service, limit).await?;
        let since = recent.last().map_or_else(Utc::now, |e| e.timestamp);
        for entry in recent {
            on_entry(entry);
        }

        tracing::info!(%service, "following logs");
        LogStream::new(since)
            .with_cancel(cancel)
            .with_limit(limit)
            .run(&self.gateway, &target, &service, on_entry)
            .await
            .map_err(|e| PipelineError::classify(Operation::Logs, e))
    }

    async fn fetch_recent(
        &self,
        target: &Target,
        service: &str,
        limit: u32,
    ) -> Result<Vec<LogEntry>, PipelineError> {
        let query = LogQuery {
            service: service.to_owned(),
            since: None,
            limit,
        };
        self.gateway
            .fetch_logs(target, &query)
            .await
            .map_err(|e| PipelineError::classify(Operation::Logs, e))
    }

    /// Region comes from the history record when there is one, since a
    /// deployment outlives later region changes in the config.
    fn log_target(&self, config: &ProjectConfig, deployment: Option<&str>) -> (Target, String) {
        let service = deployment.unwrap_or(&config.service_name).to_owned();
        let region = match self.store.find_record(&service) {
            Ok(Some(record)) => record.region,
            Ok(None) => config.region.clone(),
            Err(e) => {
                tracing::warn!("could not read deployment history: {e}");
                config.region.clone()
            }
        };
        (Target::new(&config.project_id, &region), service)
    }
}
