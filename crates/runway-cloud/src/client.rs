use crate::command::CommandError;
use crate::executor::{CommandExecutor, RealExecutor, Tool};
use crate::gateway::{
    Deletion, GatewayError, PlatformGateway, ServiceDescriptor, ServiceRequest, Target,
};
use crate::logs::{self, LogEntry, LogQuery};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// [`PlatformGateway`] backed by the `gcloud` and `docker` CLIs,
/// parameterized over the executor for testability.
pub struct GcloudGateway<E: CommandExecutor = RealExecutor> {
    executor: E,
}

impl GcloudGateway<RealExecutor> {
    pub fn new() -> Self {
        Self {
            executor: RealExecutor,
        }
    }
}

impl Default for GcloudGateway<RealExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: CommandExecutor> GcloudGateway<E> {
    pub fn with_executor(executor: E) -> Self {
        Self { executor }
    }

    async fn gcloud(&self, args: Vec<String>) -> Result<String, CommandError> {
        self.executor.exec(Tool::Gcloud, &args).await
    }

    async fn docker(&self, args: Vec<String>) -> Result<String, CommandError> {
        self.executor.exec(Tool::Docker, &args).await
    }
}

impl<E: CommandExecutor> PlatformGateway for GcloudGateway<E> {
    // ── Preflight ──

    async fn is_container_engine_running(&self) -> bool {
        match self
            .docker(args(["info", "--format", "{{.ServerVersion}}"]))
            .await
        {
            Ok(version) => {
                tracing::debug!(version = version.trim(), "container engine is running");
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, "container engine probe failed");
                false
            }
        }
    }

    async fn is_authenticated(&self) -> bool {
        match self
            .gcloud(args(["auth", "print-access-token", "--quiet"]))
            .await
        {
            Ok(token) => !token.trim().is_empty(),
            Err(e) => {
                tracing::debug!(error = %e, "gcloud auth probe failed");
                false
            }
        }
    }

    // ── Artifact Registry ──

    async fn configure_registry_auth(&self, registry_host: &str) -> Result<(), GatewayError> {
        self.gcloud(args(["auth", "configure-docker", registry_host, "--quiet"]))
            .await
            .map_err(|e| GatewayError::RegistryAuth {
                registry: registry_host.to_owned(),
                source: e,
            })?;
        Ok(())
    }

    async fn ensure_repository(
        &self,
        target: &Target,
        repository: &str,
    ) -> Result<(), GatewayError> {
        let describe = self
            .gcloud(args([
                "artifacts",
                "repositories",
                "describe",
                repository,
                "--project",
                &target.project_id,
                "--location",
                &target.region,
                "--format",
                "value(name)",
            ]))
            .await;

        match describe {
            Ok(_) => return Ok(()),
            Err(e) if e.is_not_found() => {
                tracing::info!(%repository, "creating Artifact Registry repository");
            }
            Err(e) => {
                return Err(GatewayError::Repository {
                    repository: repository.to_owned(),
                    source: e,
                });
            }
        }

        self.gcloud(args([
            "artifacts",
            "repositories",
            "create",
            repository,
            "--project",
            &target.project_id,
            "--location",
            &target.region,
            "--repository-format",
            "docker",
            "--quiet",
        ]))
        .await
        .map_err(|e| GatewayError::Repository {
            repository: repository.to_owned(),
            source: e,
        })?;

        Ok(())
    }

    // ── Container engine ──

    async fn build_image(
        &self,
        tag: &str,
        platform: &str,
        context_dir: &Path,
    ) -> Result<(), GatewayError> {
        let context = context_dir.to_string_lossy();
        self.docker(args([
            "build",
            "--platform",
            platform,
            "--progress",
            "plain",
            "--tag",
            tag,
            &context,
        ]))
        .await
        .map_err(|e| GatewayError::Build {
            tag: tag.to_owned(),
            source: e,
        })?;
        Ok(())
    }

    async fn tag_image(&self, source: &str, tag: &str) -> Result<(), GatewayError> {
        self.docker(args(["tag", source, tag]))
            .await
            .map_err(|e| GatewayError::Tag {
                source_tag: source.to_owned(),
                tag: tag.to_owned(),
                source: e,
            })?;
        Ok(())
    }

    async fn push_image(&self, tag: &str) -> Result<(), GatewayError> {
        self.docker(args(["push", tag]))
            .await
            .map_err(|e| GatewayError::Push {
                tag: tag.to_owned(),
                source: e,
            })?;
        Ok(())
    }

    // ── Cloud Run ──

    async fn deploy_service(
        &self,
        target: &Target,
        request: &ServiceRequest,
    ) -> Result<ServiceDescriptor, GatewayError> {
        let resources = &request.resources;
        let cpu = resources.cpu.to_string();
        let max = resources.max_instances.to_string();
        let port = resources.port.to_string();

        let mut cmd = args([
            "run",
            "deploy",
            &request.name,
            "--image",
            &request.image,
            "--project",
            &target.project_id,
            "--region",
            &target.region,
            "--platform",
            "managed",
            "--memory",
            &resources.memory,
            "--cpu",
            &cpu,
            "--max-instances",
            &max,
            "--port",
            &port,
            "--quiet",
            "--format",
            "value(status.url)",
        ]);

        if let Some(flag) = env_vars_flag(&request.env) {
            cmd.push("--set-env-vars".to_owned());
            cmd.push(flag);
        }

        let output = self
            .gcloud(cmd)
            .await
            .map_err(|e| GatewayError::Deploy {
                service: request.name.clone(),
                source: e,
            })?;

        let url = output.trim();
        if url.is_empty() {
            return Err(GatewayError::MissingUrl {
                service: request.name.clone(),
            });
        }

        Ok(ServiceDescriptor {
            name: request.name.clone(),
            url: url.to_owned(),
            region: target.region.clone(),
            image: Some(request.image.clone()),
            created_at: None,
            ready: true,
        })
    }

    async fn get_service(
        &self,
        target: &Target,
        name: &str,
    ) -> Result<Option<ServiceDescriptor>, GatewayError> {
        let output = self
            .gcloud(args([
                "run",
                "services",
                "describe",
                name,
                "--project",
                &target.project_id,
                "--region",
                &target.region,
                "--format",
                "json",
            ]))
            .await;

        let output = match output {
            Ok(output) => output,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => {
                return Err(GatewayError::Describe {
                    service: name.to_owned(),
                    source: e,
                });
            }
        };

        let raw: RawService = serde_json::from_str(&output).map_err(|e| GatewayError::Parse {
            what: "service description",
            source: e,
        })?;
        Ok(Some(raw.into_descriptor(&target.region)))
    }

    async fn list_services(&self, target: &Target) -> Result<Vec<ServiceDescriptor>, GatewayError> {
        let output = self
            .gcloud(args([
                "run",
                "services",
                "list",
                "--project",
                &target.project_id,
                "--region",
                &target.region,
                "--format",
                "json",
            ]))
            .await
            .map_err(|e| GatewayError::List { source: e })?;

        if output.trim().is_empty() {
            return Ok(Vec::new());
        }

        let raw: Vec<RawService> =
            serde_json::from_str(&output).map_err(|e| GatewayError::Parse {
                what: "service list",
                source: e,
            })?;
        Ok(raw
            .into_iter()
            .map(|s| s.into_descriptor(&target.region))
            .collect())
    }

    async fn delete_service(&self, target: &Target, name: &str) -> Result<Deletion, GatewayError> {
        let result = self
            .gcloud(args([
                "run",
                "services",
                "delete",
                name,
                "--project",
                &target.project_id,
                "--region",
                &target.region,
                "--quiet",
            ]))
            .await;

        match result {
            Ok(_) => Ok(Deletion::Deleted),
            Err(e) if e.is_not_found() => Ok(Deletion::NotFound),
            Err(e) => Err(GatewayError::Delete {
                service: name.to_owned(),
                source: e,
            }),
        }
    }

    async fn set_public_access(&self, target: &Target, name: &str) -> Result<(), GatewayError> {
        self.gcloud(args([
            "run",
            "services",
            "add-iam-policy-binding",
            name,
            "--project",
            &target.project_id,
            "--region",
            &target.region,
            "--member",
            "allUsers",
            "--role",
            "roles/run.invoker",
            "--quiet",
        ]))
        .await
        .map_err(|e| GatewayError::AccessPolicy {
            service: name.to_owned(),
            source: e,
        })?;
        Ok(())
    }

    // ── Cloud Logging ──

    async fn fetch_logs(
        &self,
        target: &Target,
        query: &LogQuery,
    ) -> Result<Vec<LogEntry>, GatewayError> {
        let limit = query.limit.to_string();
        let mut cmd = args([
            "logging",
            "read",
            &log_filter(target, query),
            "--project",
            &target.project_id,
            "--limit",
            &limit,
            "--format",
            "json",
        ]);
        // Following from a watermark wants the oldest entries after it; a
        // one-shot read wants the newest `limit` entries.
        if query.since.is_some() {
            cmd.push("--order".to_owned());
            cmd.push("asc".to_owned());
        }

        let output = self.gcloud(cmd).await.map_err(|e| GatewayError::Logs {
            service: query.service.clone(),
            source: e,
        })?;

        logs::parse_entries(&output).map_err(|e| GatewayError::Parse {
            what: "log entries",
            source: e,
        })
    }
}

// ── Helpers ──

fn args<const N: usize>(a: [&str; N]) -> Vec<String> {
    a.iter().map(|s| (*s).to_owned()).collect()
}

fn log_filter(target: &Target, query: &LogQuery) -> String {
    let mut filter = format!(
        r#"resource.type="cloud_run_revision" AND resource.labels.service_name="{}" AND resource.labels.location="{}""#,
        query.service, target.region
    );
    if let Some(since) = query.since {
        filter.push_str(&format!(
            r#" AND timestamp>"{}""#,
            since.to_rfc3339_opts(SecondsFormat::AutoSi, true)
        ));
    }
    filter
}

/// Value for `--set-env-vars`. Values containing commas switch to gcloud's
/// alternate delimiter syntax (`^DELIM^K=V<DELIM>K=V`).
pub(crate) fn env_vars_flag(env: &BTreeMap<String, String>) -> Option<String> {
    if env.is_empty() {
        return None;
    }

    let pairs: Vec<String> = env.iter().map(|(k, v)| format!("{k}={v}")).collect();
    if !pairs.iter().any(|p| p.contains(',')) {
        return Some(pairs.join(","));
    }

    let delimiter = ["@@", "##", "%%", "~~", ";;"]
        .into_iter()
        .find(|d| !pairs.iter().any(|p| p.contains(d)))
        .unwrap_or("|~|");
    Some(format!("^{delimiter}^{}", pairs.join(delimiter)))
}

// ── gcloud run services describe/list --format json ──

#[derive(Deserialize)]
struct RawService {
    metadata: RawMetadata,
    #[serde(default)]
    spec: Option<RawServiceSpec>,
    #[serde(default)]
    status: Option<RawStatus>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMetadata {
    name: String,
    #[serde(default)]
    labels: BTreeMap<String, String>,
    creation_timestamp: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct RawServiceSpec {
    template: Option<RawTemplate>,
}

#[derive(Deserialize)]
struct RawTemplate {
    spec: Option<RawTemplateSpec>,
}

#[derive(Deserialize)]
struct RawTemplateSpec {
    #[serde(default)]
    containers: Vec<RawContainer>,
}

#[derive(Deserialize)]
struct RawContainer {
    image: Option<String>,
}

#[derive(Deserialize)]
struct RawStatus {
    url: Option<String>,
    #[serde(default)]
    conditions: Vec<RawCondition>,
}

#[derive(Deserialize)]
struct RawCondition {
    #[serde(rename = "type")]
    kind: String,
    status: String,
}

impl RawService {
    fn into_descriptor(self, default_region: &str) -> ServiceDescriptor {
        let region = self
            .metadata
            .labels
            .get("cloud.googleapis.com/location")
            .cloned()
            .unwrap_or_else(|| default_region.to_owned());

        let image = self
            .spec
            .and_then(|s| s.template)
            .and_then(|t| t.spec)
            .and_then(|s| s.containers.into_iter().next())
            .and_then(|c| c.image);

        let (url, ready) = match self.status {
            Some(status) => {
                let ready = status
                    .conditions
                    .iter()
                    .any(|c| c.kind == "Ready" && c.status == "True");
                (status.url.unwrap_or_default(), ready)
            }
            None => (String::new(), false),
        };

        ServiceDescriptor {
            name: self.metadata.name,
            url,
            region,
            image,
            created_at: self.metadata.creation_timestamp,
            ready,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_vars_flag_plain() {
        let env = BTreeMap::from([
            ("B".to_owned(), "2".to_owned()),
            ("A".to_owned(), "x=y".to_owned()),
        ]);
        assert_eq!(env_vars_flag(&env).as_deref(), Some("A=x=y,B=2"));
    }

    #[test]
    fn env_vars_flag_empty() {
        assert_eq!(env_vars_flag(&BTreeMap::new()), None);
    }

    #[test]
    fn env_vars_flag_commas_use_alternate_delimiter() {
        let env = BTreeMap::from([
            ("HOSTS".to_owned(), "a,b".to_owned()),
            ("MODE".to_owned(), "prod".to_owned()),
        ]);
        assert_eq!(
            env_vars_flag(&env).as_deref(),
            Some("^@@^HOSTS=a,b@@MODE=prod")
        );
    }

    #[test]
    fn env_vars_flag_skips_delimiters_in_values() {
        let env = BTreeMap::from([("K".to_owned(), "a,b@@c".to_owned())]);
        assert_eq!(env_vars_flag(&env).as_deref(), Some("^##^K=a,b@@c"));
    }

    #[test]
    fn log_filter_with_watermark() {
        let target = Target::new("p", "us-central1");
        let query = LogQuery {
            service: "app".to_owned(),
            since: Some(
                DateTime::parse_from_rfc3339("2025-01-01T00:00:01Z")
                    .unwrap()
                    .with_timezone(&Utc),
            ),
            limit: 10,
        };

        let filter = log_filter(&target, &query);
        assert!(filter.contains(r#"resource.labels.service_name="app""#));
        assert!(filter.contains(r#"resource.labels.location="us-central1""#));
        assert!(filter.ends_with(r#"timestamp>"2025-01-01T00:00:01Z""#));
    }
}
