//! The deploy pipeline.
//!
//! ```text
//! runway deploy
//!   Idle               ── load .runway/config.json, resolve kind + service name
//!   PreflightChecking  ── docker running? gcloud authenticated?
//!   EnvLoaded          ── .env (missing file is a warning)
//!   Building           ── docker build {repo}/{service}:{timestamp}, retag :latest
//!   Pushing            ── registry auth + repository, push timestamp tag, push :latest
//!   Deploying          ── gcloud run deploy (create or update)
//!   AccessConfigured   ── allUsers → roles/run.invoker
//!   HistoryRecorded    ── append to .runway/deployments.json
//!   Succeeded
//! ```
//!
//! Every step runs once; any failure aborts the run with the stage it was in.
//! Non-fatal problems (missing `.env`, failed `:latest` retag or push,
//! preferences write) are collected as warnings.

use crate::error::{Aborted, Operation, PipelineError, PreflightFailure, Stage};
use chrono::Utc;
use runway_cloud::{PlatformGateway, ServiceRequest, Target};
use runway_core::{
    DeploymentKind, DeploymentRecord, ProjectConfig, ServiceResources, StateStore, env, naming,
};
use std::path::PathBuf;

/// Cloud Run only runs amd64 images.
pub const IMAGE_PLATFORM: &str = "linux/amd64";

const BUILD_ID_FORMAT: &str = "%Y%m%d%H%M%S";

/// Sequences the platform gateway and the state store into runway's
/// commands.
pub struct Deployer<G: PlatformGateway> {
    pub(crate) gateway: G,
    pub(crate) store: StateStore,
}

impl<G: PlatformGateway> Deployer<G> {
    pub fn new(gateway: G, store: StateStore) -> Self {
        Self { gateway, store }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub(crate) fn load_config(&self) -> Result<ProjectConfig, PipelineError> {
        self.store
            .load_config()
            .map_err(|e| PipelineError::Configuration { source: e })
    }

    /// Run the full deploy pipeline.
    pub async fn deploy(&self, request: &DeployRequest) -> Result<DeployReport, Aborted> {
        let mut progress = Progress::default();
        match self.run_pipeline(request, &mut progress).await {
            Ok(record) => {
                progress.enter(Stage::Succeeded);
                Ok(DeployReport {
                    record,
                    steps: progress.steps,
                    warnings: progress.warnings,
                })
            }
            Err(source) => {
                tracing::debug!(stage = ?progress.stage, error = %source, "deploy aborted");
                Err(Aborted {
                    stage: progress.stage,
                    completed: progress.steps,
                    warnings: progress.warnings,
                    source,
                })
            }
        }
    }

    async fn run_pipeline(
        &self,
        request: &DeployRequest,
        progress: &mut Progress,
    ) -> Result<DeploymentRecord, PipelineError> {
        let config = self.load_config()?;
        let kind = naming::resolve_kind(request.kind, &request.branch);
        let service_name = naming::derive_service_name(
            &config.service_name,
            kind,
            &request.branch,
            &mut rand::rng(),
        );
        let target = Target::new(&config.project_id, &config.region);
        tracing::info!(%service_name, %kind, branch = %request.branch, "deploying");

        // ── Pre-flight ──
        progress.enter(Stage::PreflightChecking);
        if !self.gateway.is_container_engine_running().await {
            return Err(PipelineError::Preflight(PreflightFailure::ContainerEngineDown));
        }
        if !self.gateway.is_authenticated().await {
            return Err(PipelineError::Preflight(PreflightFailure::NotAuthenticated));
        }
        progress.enter(Stage::Preflighted);
        progress.step("Pre-flight checks passed".to_owned());

        // ── Environment ──
        let env_path = request
            .env_file
            .clone()
            .unwrap_or_else(|| self.store.project_dir().join(env::DEFAULT_ENV_FILE));
        let loaded = env::load(&env_path);
        if let Some(warning) = loaded.warning() {
            progress.warn(warning);
        }
        let env_vars = loaded.vars();
        progress.enter(Stage::EnvLoaded);
        if !env_vars.is_empty() {
            progress.step(format!("{} environment variable(s) loaded", env_vars.len()));
        }

        // ── Build ──
        progress.enter(Stage::Building);
        let repository = config.image_repository();
        let build_id = Utc::now().format(BUILD_ID_FORMAT);
        let image = format!("{repository}/{service_name}:{build_id}");
        let latest = format!("{repository}/{service_name}:latest");

        self.gateway
            .build_image(&image, IMAGE_PLATFORM, self.store.project_dir())
            .await
            .map_err(|e| PipelineError::classify(Operation::Build, e))?;
        progress.step(format!("Built {image}"));

        let latest_tagged = match self.gateway.tag_image(&image, &latest).await {
            Ok(()) => true,
            Err(e) => {
                progress.warn(format!("could not tag {latest}: {e}"));
                false
            }
        };

        // ── Push ──
        progress.enter(Stage::Pushing);
        let registry_host = repository.split('/').next().unwrap_or(&repository);
        self.gateway
            .configure_registry_auth(registry_host)
            .await
            .map_err(|e| PipelineError::classify(Operation::RegistryAuth, e))?;

        if let Some(location) = ArtifactLocation::parse(&repository) {
            let registry_target = Target::new(location.project_id, location.region);
            self.gateway
                .ensure_repository(&registry_target, location.repository)
                .await
                .map_err(|e| PipelineError::classify(Operation::Repository, e))?;
        }

        self.gateway
            .push_image(&image)
            .await
            .map_err(|e| PipelineError::classify(Operation::Push, e))?;
        progress.step(format!("Pushed {image}"));

        if latest_tagged {
            match self.gateway.push_image(&latest).await {
                Ok(()) => progress.step(format!("Pushed {latest}")),
                Err(e) => progress.warn(format!("could not push {latest}: {e}")),
            }
        }

        // ── Deploy ──
        progress.enter(Stage::Deploying);
        let service = self
            .gateway
            .deploy_service(
                &target,
                &ServiceRequest {
                    name: service_name.clone(),
                    image: image.clone(),
                    env: env_vars,
                    resources: ServiceResources::default(),
                },
            )
            .await
            .map_err(|e| PipelineError::classify(Operation::Deploy, e))?;
        progress.step(format!("Deployed {service_name} ({})", config.region));

        // ── Access ──
        progress.enter(Stage::AccessConfigured);
        self.gateway
            .set_public_access(&target, &service_name)
            .await
            .map_err(|e| PipelineError::classify(Operation::AccessPolicy, e))?;
        progress.step("Public access enabled".to_owned());

        // ── History ──
        progress.enter(Stage::HistoryRecorded);
        let record = DeploymentRecord {
            service_name,
            kind,
            branch: request.branch.clone(),
            url: service.url,
            image,
            region: config.region.clone(),
            created_at: Utc::now(),
        };
        self.store
            .add_record(record.clone())
            .map_err(|e| PipelineError::State { source: e })?;

        if let Err(e) = self.store.remember_project(&config.project_id) {
            progress.warn(format!("could not update global preferences: {e}"));
        }

        Ok(record)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeployRequest {
    /// Explicit `--production` / `--preview`; `None` decides by branch.
    pub kind: Option<DeploymentKind>,
    pub branch: String,
    /// Defaults to `<project>/.env`.
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct DeployReport {
    pub record: DeploymentRecord,
    pub steps: Vec<String>,
    pub warnings: Vec<String>,
}

struct Progress {
    stage: Stage,
    steps: Vec<String>,
    warnings: Vec<String>,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            stage: Stage::Idle,
            steps: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl Progress {
    fn enter(&mut self, stage: Stage) {
        tracing::debug!(?stage, "stage");
        self.stage = stage;
    }

    fn step(&mut self, message: String) {
        tracing::info!("{message}");
        self.steps.push(message);
    }

    fn warn(&mut self, message: String) {
        tracing::warn!("{message}");
        self.warnings.push(message);
    }
}

/// An Artifact Registry path, `<location>-docker.pkg.dev/<project>/<repo>`.
///
/// The registry may live in another project or location than the service.
#[derive(Debug, PartialEq, Eq)]
struct ArtifactLocation<'a> {
    region: &'a str,
    project_id: &'a str,
    repository: &'a str,
}

impl<'a> ArtifactLocation<'a> {
    /// `None` for anything that is not an Artifact Registry docker path.
    fn parse(path: &'a str) -> Option<Self> {
        let mut parts = path.split('/');
        let region = parts.next()?.strip_suffix("-docker.pkg.dev")?;
        let project_id = parts.next()?;
        let repository = parts.next()?;
        if parts.next().is_some()
            || region.is_empty()
            || project_id.is_empty()
            || repository.is_empty()
        {
            return None;
        }
        Some(Self {
            region,
            project_id,
            repository,
        })
    }
}
