use serde::{Deserialize, Serialize};

/// Schema version written into every new `config.json`.
pub const SCHEMA_VERSION: &str = "1.0";

/// Region used when `runway init` is not given one.
pub const DEFAULT_REGION: &str = "us-central1";

/// Artifact Registry repository that holds runway-built images.
pub const ARTIFACT_REPO_NAME: &str = "runway";

/// `.runway/config.json`
///
/// Fields are defaulted on load so that a partially written document still
/// parses; [`ProjectConfig::validate`] reports what is missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    /// GCP project ID
    #[serde(default)]
    pub project_id: String,
    /// Cloud Run region
    #[serde(default)]
    pub region: String,
    /// Production service name; preview names are derived from it
    #[serde(default)]
    pub service_name: String,
    /// Image repository, e.g. `us-central1-docker.pkg.dev/my-project/runway`
    #[serde(default)]
    pub artifact_registry: String,
    #[serde(default = "default_version")]
    pub version: String,
}

impl ProjectConfig {
    pub fn new(project_id: &str, region: &str, service_name: &str) -> Self {
        Self {
            project_id: project_id.to_owned(),
            region: region.to_owned(),
            service_name: service_name.to_owned(),
            artifact_registry: format!(
                "{region}-docker.pkg.dev/{project_id}/{ARTIFACT_REPO_NAME}"
            ),
            version: default_version(),
        }
    }

    /// Check that every required field is present.
    ///
    /// All missing fields are reported together, not just the first.
    pub fn validate(&self) -> crate::Result<()> {
        let missing: Vec<&'static str> = [
            ("projectId", &self.project_id),
            ("region", &self.region),
            ("serviceName", &self.service_name),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(crate::Error::InvalidConfig { missing })
        }
    }

    /// Image repository to push to, falling back to the conventional
    /// Artifact Registry path when the stored value is empty.
    pub fn image_repository(&self) -> String {
        if self.artifact_registry.trim().is_empty() {
            format!(
                "{}-docker.pkg.dev/{}/{ARTIFACT_REPO_NAME}",
                self.region, self.project_id
            )
        } else {
            self.artifact_registry.trim_end_matches('/').to_owned()
        }
    }
}

/// `<config_dir>/runway/preferences.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_project: Option<String>,
}

/// Resources every deployed service gets. Not user-tunable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceResources {
    pub memory: String,
    pub cpu: u32,
    pub port: u16,
    pub max_instances: u32,
}

impl Default for ServiceResources {
    fn default() -> Self {
        Self {
            memory: "512Mi".to_owned(),
            cpu: 1,
            port: 8080,
            max_instances: 10,
        }
    }
}

fn default_version() -> String {
    SCHEMA_VERSION.to_owned()
}
