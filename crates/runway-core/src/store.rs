//! Persisted runway state.
//!
//! Three JSON documents, each read whole and replaced whole:
//!
//! | Document | Path | Missing file reads as |
//! |----------|------|-----------------------|
//! | [`ProjectConfig`] | `<project>/.runway/config.json` | `None` (not initialized) |
//! | [`DeploymentHistory`] | `<project>/.runway/deployments.json` | empty history |
//! | [`GlobalPreferences`] | `<config_dir>/runway/preferences.json` | defaults |
//!
//! Writes go to a sibling `.tmp` file that is then renamed over the target,
//! so an interrupted write never leaves a truncated document behind.

use crate::config::{GlobalPreferences, ProjectConfig};
use crate::history::{DeploymentHistory, DeploymentRecord};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Directory inside the project root holding per-project state.
pub const STATE_DIR: &str = ".runway";
const CONFIG_FILE: &str = "config.json";
const HISTORY_FILE: &str = "deployments.json";
const PREFERENCES_FILE: &str = "preferences.json";

/// Environment variable overriding the global preferences directory.
pub const CONFIG_DIR_ENV: &str = "RUNWAY_CONFIG_DIR";

#[derive(Debug, Clone)]
pub struct StateStore {
    project_dir: PathBuf,
    global_dir: PathBuf,
}

impl StateStore {
    /// Store rooted at `project_dir`, with global preferences under
    /// `$RUNWAY_CONFIG_DIR` or the platform config directory.
    pub fn open(project_dir: &Path) -> crate::Result<Self> {
        let global_dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .ok_or(crate::Error::NoHomeDir)?
                .join("runway"),
        };
        Ok(Self::with_global_dir(project_dir, &global_dir))
    }

    pub fn with_global_dir(project_dir: &Path, global_dir: &Path) -> Self {
        Self {
            project_dir: project_dir.to_path_buf(),
            global_dir: global_dir.to_path_buf(),
        }
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.project_dir.join(STATE_DIR).join(CONFIG_FILE)
    }

    pub fn history_path(&self) -> PathBuf {
        self.project_dir.join(STATE_DIR).join(HISTORY_FILE)
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.global_dir.join(PREFERENCES_FILE)
    }

    // ── Project configuration ──

    pub fn is_initialized(&self) -> bool {
        self.config_path().exists()
    }

    pub fn read_config(&self) -> crate::Result<Option<ProjectConfig>> {
        read_json(&self.config_path())
    }

    pub fn write_config(&self, config: &ProjectConfig) -> crate::Result<()> {
        write_json(&self.config_path(), config)
    }

    /// Read and validate the project configuration.
    ///
    /// Fails with [`Error::NotInitialized`](crate::Error::NotInitialized) when
    /// no config exists and [`Error::InvalidConfig`](crate::Error::InvalidConfig)
    /// when required fields are missing.
    pub fn load_config(&self) -> crate::Result<ProjectConfig> {
        let config = self
            .read_config()?
            .ok_or_else(|| crate::Error::NotInitialized {
                path: self.config_path(),
            })?;
        config.validate()?;
        Ok(config)
    }

    // ── Deployment history ──

    pub fn read_history(&self) -> crate::Result<DeploymentHistory> {
        Ok(read_json(&self.history_path())?.unwrap_or_default())
    }

    pub fn write_history(&self, history: &DeploymentHistory) -> crate::Result<()> {
        write_json(&self.history_path(), history)
    }

    pub fn add_record(&self, record: DeploymentRecord) -> crate::Result<()> {
        let mut history = self.read_history()?;
        history.add(record);
        self.write_history(&history)
    }

    /// Remove the record for `service_name`. Returns whether one was present;
    /// the history file is only rewritten when something changed.
    pub fn remove_record(&self, service_name: &str) -> crate::Result<bool> {
        let mut history = self.read_history()?;
        if !history.remove(service_name) {
            return Ok(false);
        }
        self.write_history(&history)?;
        Ok(true)
    }

    pub fn find_record(&self, service_name: &str) -> crate::Result<Option<DeploymentRecord>> {
        Ok(self.read_history()?.find(service_name).cloned())
    }

    // ── Global preferences ──

    pub fn read_global(&self) -> crate::Result<GlobalPreferences> {
        Ok(read_json(&self.preferences_path())?.unwrap_or_default())
    }

    pub fn write_global(&self, preferences: &GlobalPreferences) -> crate::Result<()> {
        write_json(&self.preferences_path(), preferences)
    }

    pub fn remember_project(&self, project_id: &str) -> crate::Result<()> {
        let mut preferences = self.read_global()?;
        if preferences.last_used_project.as_deref() == Some(project_id) {
            return Ok(());
        }
        preferences.last_used_project = Some(project_id.to_owned());
        self.write_global(&preferences)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> crate::Result<Option<T>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(crate::Error::ConfigRead {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| crate::Error::ConfigParse {
            path: path.to_path_buf(),
            source: e,
        })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> crate::Result<()> {
    let write_err = |source| crate::Error::StateWrite {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }

    let mut bytes =
        serde_json::to_vec_pretty(value).map_err(|e| crate::Error::StateSerialize {
            path: path.to_path_buf(),
            source: e,
        })?;
    bytes.push(b'\n');

    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, bytes).map_err(write_err)?;
    std::fs::rename(&tmp_path, path).map_err(write_err)?;

    tracing::debug!(path = %path.display(), "state written");
    Ok(())
}
