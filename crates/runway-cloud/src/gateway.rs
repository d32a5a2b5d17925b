use crate::command::CommandError;
use crate::logs::{LogEntry, LogQuery};
use chrono::{DateTime, Utc};
use runway_core::ServiceResources;
use std::collections::BTreeMap;
use std::path::Path;

/// Where remote services live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub project_id: String,
    pub region: String,
}

impl Target {
    pub fn new(project_id: &str, region: &str) -> Self {
        Self {
            project_id: project_id.to_owned(),
            region: region.to_owned(),
        }
    }
}

/// Desired state for one create-or-update call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRequest {
    pub name: String,
    pub image: String,
    pub env: BTreeMap<String, String>,
    pub resources: ServiceResources,
}

/// The platform's view of a deployed service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub name: String,
    /// Public URL; empty while the service has never become ready.
    pub url: String,
    pub region: String,
    pub image: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub ready: bool,
}

/// Result of a delete; absence is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deletion {
    Deleted,
    NotFound,
}

/// Every call runway makes to the container engine, the compute service,
/// and the log service.
///
/// The orchestrator only talks to this trait, so a native API client can
/// replace the subprocess-backed [`GcloudGateway`](crate::GcloudGateway)
/// without touching it. No method retries.
#[allow(async_fn_in_trait)]
pub trait PlatformGateway: Send + Sync {
    /// Never fails; any probe error reads as `false`.
    async fn is_container_engine_running(&self) -> bool;

    /// Never fails; any probe error reads as `false`.
    async fn is_authenticated(&self) -> bool;

    /// Register the platform credential helper for `registry_host`.
    async fn configure_registry_auth(&self, registry_host: &str) -> Result<(), GatewayError>;

    /// Create the image repository if it does not exist yet.
    async fn ensure_repository(&self, target: &Target, repository: &str)
    -> Result<(), GatewayError>;

    async fn build_image(
        &self,
        tag: &str,
        platform: &str,
        context_dir: &Path,
    ) -> Result<(), GatewayError>;

    /// Local retag; no rebuild.
    async fn tag_image(&self, source: &str, tag: &str) -> Result<(), GatewayError>;

    async fn push_image(&self, tag: &str) -> Result<(), GatewayError>;

    /// Idempotent: an existing service of the same name is updated in place.
    async fn deploy_service(
        &self,
        target: &Target,
        request: &ServiceRequest,
    ) -> Result<ServiceDescriptor, GatewayError>;

    /// `Ok(None)` when the service does not exist.
    async fn get_service(
        &self,
        target: &Target,
        name: &str,
    ) -> Result<Option<ServiceDescriptor>, GatewayError>;

    async fn list_services(&self, target: &Target) -> Result<Vec<ServiceDescriptor>, GatewayError>;

    async fn delete_service(&self, target: &Target, name: &str) -> Result<Deletion, GatewayError>;

    /// Allow unauthenticated invocations.
    async fn set_public_access(&self, target: &Target, name: &str) -> Result<(), GatewayError>;

    /// Entries ordered oldest to newest.
    async fn fetch_logs(
        &self,
        target: &Target,
        query: &LogQuery,
    ) -> Result<Vec<LogEntry>, GatewayError>;
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("failed to configure docker credentials for {registry}")]
    RegistryAuth {
        registry: String,
        source: CommandError,
    },

    #[error("failed to ensure Artifact Registry repository '{repository}'")]
    Repository {
        repository: String,
        source: CommandError,
    },

    #[error("image build failed for {tag}")]
    Build { tag: String, source: CommandError },

    #[error("failed to tag {source_tag} as {tag}")]
    Tag {
        source_tag: String,
        tag: String,
        source: CommandError,
    },

    #[error("failed to push {tag}")]
    Push { tag: String, source: CommandError },

    #[error("deployment of service '{service}' failed")]
    Deploy {
        service: String,
        source: CommandError,
    },

    #[error("service '{service}' was deployed but the platform returned no URL")]
    MissingUrl { service: String },

    #[error("failed to grant public access to service '{service}'")]
    AccessPolicy {
        service: String,
        source: CommandError,
    },

    #[error("failed to describe service '{service}'")]
    Describe {
        service: String,
        source: CommandError,
    },

    #[error("failed to list services")]
    List { source: CommandError },

    #[error("failed to delete service '{service}'")]
    Delete {
        service: String,
        source: CommandError,
    },

    #[error("failed to read logs for service '{service}'")]
    Logs {
        service: String,
        source: CommandError,
    },

    #[error("unexpected {what} output from gcloud")]
    Parse {
        what: &'static str,
        source: serde_json::Error,
    },
}

impl GatewayError {
    /// The failed subprocess, when there was one.
    pub fn command_error(&self) -> Option<&CommandError> {
        match self {
            Self::RegistryAuth { source, .. }
            | Self::Repository { source, .. }
            | Self::Build { source, .. }
            | Self::Tag { source, .. }
            | Self::Push { source, .. }
            | Self::Deploy { source, .. }
            | Self::AccessPolicy { source, .. }
            | Self::Describe { source, .. }
            | Self::List { source }
            | Self::Delete { source, .. }
            | Self::Logs { source, .. } => Some(source),
            Self::MissingUrl { .. } | Self::Parse { .. } => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.command_error().is_some_and(CommandError::is_not_found)
    }

    pub fn is_permission_denied(&self) -> bool {
        self.command_error()
            .is_some_and(CommandError::is_permission_denied)
    }
}
