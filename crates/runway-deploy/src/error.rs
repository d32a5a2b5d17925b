use runway_cloud::GatewayError;
use std::fmt;

/// Where a deploy stands. Each stage is entered before the step it names
/// runs, so an abort reports the step that failed. A run moves strictly
/// forward through these and ends in `Succeeded` or `Aborted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    PreflightChecking,
    Preflighted,
    EnvLoaded,
    Building,
    Pushing,
    Deploying,
    AccessConfigured,
    HistoryRecorded,
    Succeeded,
    Aborted,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "loading project state",
            Self::PreflightChecking => "pre-flight checks",
            Self::Preflighted => "pre-flight checks",
            Self::EnvLoaded => "environment loading",
            Self::Building => "image build",
            Self::Pushing => "image push",
            Self::Deploying => "service deployment",
            Self::AccessConfigured => "access configuration",
            Self::HistoryRecorded => "history update",
            Self::Succeeded => "completion",
            Self::Aborted => "abort",
        })
    }
}

/// Remote operation a failure came from; decides the remediation text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    RegistryAuth,
    Repository,
    Build,
    Push,
    Deploy,
    AccessPolicy,
    Describe,
    List,
    Delete,
    Logs,
}

impl Operation {
    /// IAM roles the caller needs for this operation.
    pub fn required_roles(self) -> &'static [&'static str] {
        match self {
            Self::RegistryAuth | Self::Push => &["roles/artifactregistry.writer"],
            Self::Repository => &["roles/artifactregistry.admin"],
            Self::Build => &[],
            Self::Deploy => &["roles/run.developer", "roles/iam.serviceAccountUser"],
            Self::AccessPolicy => &["roles/run.admin"],
            Self::Describe | Self::List => &["roles/run.viewer"],
            Self::Delete => &["roles/run.developer"],
            Self::Logs => &["roles/logging.viewer"],
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::RegistryAuth => "registry authentication",
            Self::Repository => "Artifact Registry repository setup",
            Self::Build => "image build",
            Self::Push => "image push",
            Self::Deploy => "Cloud Run deploy",
            Self::AccessPolicy => "public access grant",
            Self::Describe => "service lookup",
            Self::List => "service listing",
            Self::Delete => "service deletion",
            Self::Logs => "log read",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PreflightFailure {
    #[error("container engine is not running; start Docker (or Docker Desktop) and retry")]
    ContainerEngineDown,

    #[error("gcloud is not authenticated; run: gcloud auth login")]
    NotAuthenticated,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("project configuration error")]
    Configuration { source: runway_core::Error },

    #[error("pre-flight check failed: {0}")]
    Preflight(PreflightFailure),

    #[error("could not configure registry credentials; run: gcloud auth configure-docker")]
    AuthConfig { source: GatewayError },

    #[error("image build failed; see the build output below")]
    Build { source: GatewayError },

    #[error("image push failed")]
    Push { source: GatewayError },

    #[error("Cloud Run deployment failed")]
    Deploy { source: GatewayError },

    #[error("could not make the service publicly accessible")]
    AccessPolicy { source: GatewayError },

    #[error("deployment '{name}' not found")]
    NotFound { name: String },

    #[error(
        "{operation} was denied; the active account needs: {}",
        operation.required_roles().join(", ")
    )]
    Permission {
        operation: Operation,
        source: GatewayError,
    },

    #[error("{operation} failed")]
    Platform {
        operation: Operation,
        source: GatewayError,
    },

    #[error("failed to update local state")]
    State { source: runway_core::Error },

    #[error("could not read confirmation")]
    Prompt { source: std::io::Error },
}

impl PipelineError {
    /// Turn a gateway failure into the pipeline taxonomy, attaching the
    /// remediation for permission failures.
    pub fn classify(operation: Operation, source: GatewayError) -> Self {
        if source.is_permission_denied() && !operation.required_roles().is_empty() {
            return Self::Permission { operation, source };
        }

        match operation {
            Operation::RegistryAuth => Self::AuthConfig { source },
            Operation::Build => Self::Build { source },
            Operation::Repository | Operation::Push => Self::Push { source },
            Operation::Deploy => Self::Deploy { source },
            Operation::AccessPolicy => Self::AccessPolicy { source },
            Operation::Describe | Operation::List | Operation::Delete | Operation::Logs => {
                Self::Platform { operation, source }
            }
        }
    }
}

/// A deploy that stopped before `Succeeded`.
#[derive(Debug, thiserror::Error)]
#[error("deploy aborted during {stage}")]
pub struct Aborted {
    pub stage: Stage,
    /// Steps that completed before the failure.
    pub completed: Vec<String>,
    /// Non-fatal problems seen before the failure.
    pub warnings: Vec<String>,
    pub source: PipelineError,
}
