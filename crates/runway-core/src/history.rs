use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentKind {
    Production,
    Preview,
}

impl fmt::Display for DeploymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Production => f.write_str("production"),
            Self::Preview => f.write_str("preview"),
        }
    }
}

/// One successful deploy, as remembered locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub service_name: String,
    #[serde(rename = "type")]
    pub kind: DeploymentKind,
    pub branch: String,
    pub url: String,
    pub image: String,
    pub region: String,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// `.runway/deployments.json`
///
/// An advisory cache of what was deployed from this machine. The platform's
/// service list is authoritative for existence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentHistory {
    #[serde(default)]
    pub deployments: Vec<DeploymentRecord>,
}

impl DeploymentHistory {
    /// Append a record, dropping any earlier record with the same service name.
    pub fn add(&mut self, record: DeploymentRecord) {
        self.deployments
            .retain(|r| r.service_name != record.service_name);
        self.deployments.push(record);
    }

    /// Remove the record for `service_name`. Returns whether one was present.
    pub fn remove(&mut self, service_name: &str) -> bool {
        let before = self.deployments.len();
        self.deployments.retain(|r| r.service_name != service_name);
        self.deployments.len() != before
    }

    pub fn find(&self, service_name: &str) -> Option<&DeploymentRecord> {
        self.deployments
            .iter()
            .find(|r| r.service_name == service_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, kind: DeploymentKind) -> DeploymentRecord {
        DeploymentRecord {
            service_name: name.to_owned(),
            kind,
            branch: "main".to_owned(),
            url: format!("https://{name}.a.run.app"),
            image: format!("repo/{name}:20250101000000"),
            region: "us-central1".to_owned(),
            created_at: DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    #[test]
    fn add_supersedes_same_name() {
        let mut history = DeploymentHistory::default();
        history.add(record("app", DeploymentKind::Production));
        history.add(record("app-x-1", DeploymentKind::Preview));

        let mut again = record("app", DeploymentKind::Production);
        again.url = "https://new.a.run.app".to_owned();
        history.add(again);

        assert_eq!(history.deployments.len(), 2);
        assert_eq!(history.deployments[0].service_name, "app-x-1");
        assert_eq!(history.find("app").unwrap().url, "https://new.a.run.app");
    }

    #[test]
    fn remove_reports_presence() {
        let mut history = DeploymentHistory::default();
        history.add(record("app", DeploymentKind::Production));

        assert!(history.remove("app"));
        assert!(!history.remove("app"));
        assert!(history.deployments.is_empty());
    }

    #[test]
    fn serializes_with_type_and_timestamp_keys() {
        let mut history = DeploymentHistory::default();
        history.add(record("app", DeploymentKind::Preview));

        let json = serde_json::to_value(&history).unwrap();
        let entry = &json["deployments"][0];
        assert_eq!(entry["serviceName"], "app");
        assert_eq!(entry["type"], "preview");
        assert_eq!(entry["timestamp"], "2025-01-01T00:00:00Z");
    }
}
