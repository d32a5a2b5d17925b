use chrono::{TimeZone, Utc};
use runway_core::{DeploymentHistory, DeploymentKind, DeploymentRecord, StateStore};
use tempfile::TempDir;

fn store(tmp: &TempDir) -> StateStore {
    StateStore::with_global_dir(tmp.path(), &tmp.path().join("global"))
}

fn record(name: &str, kind: DeploymentKind, branch: &str) -> DeploymentRecord {
    DeploymentRecord {
        service_name: name.to_owned(),
        kind,
        branch: branch.to_owned(),
        url: format!("https://{name}-abc.a.run.app"),
        image: format!("us-central1-docker.pkg.dev/p/runway/{name}:20250301120000"),
        region: "us-central1".to_owned(),
        created_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
    }
}

#[test]
fn read_history_defaults_to_empty() {
    let tmp = TempDir::new().unwrap();
    assert_eq!(store(&tmp).read_history().unwrap(), DeploymentHistory::default());
}

#[test]
fn add_then_remove_restores_previous_history() {
    let tmp = TempDir::new().unwrap();
    let store = store(&tmp);
    store
        .add_record(record("app", DeploymentKind::Production, "main"))
        .unwrap();
    store
        .add_record(record("app-a-11111111", DeploymentKind::Preview, "a"))
        .unwrap();
    let before = store.read_history().unwrap();

    store
        .add_record(record("app-b-22222222", DeploymentKind::Preview, "b"))
        .unwrap();
    assert!(store.remove_record("app-b-22222222").unwrap());

    assert_eq!(store.read_history().unwrap(), before);
}

#[test]
fn remove_missing_record_is_a_no_op() {
    let tmp = TempDir::new().unwrap();
    let store = store(&tmp);

    assert!(!store.remove_record("ghost").unwrap());
    assert!(!store.history_path().exists());
}

#[test]
fn redeploy_supersedes_record() {
    let tmp = TempDir::new().unwrap();
    let store = store(&tmp);
    store
        .add_record(record("app", DeploymentKind::Production, "main"))
        .unwrap();

    let mut newer = record("app", DeploymentKind::Production, "main");
    newer.image = "us-central1-docker.pkg.dev/p/runway/app:20250302000000".to_owned();
    store.add_record(newer.clone()).unwrap();

    let history = store.read_history().unwrap();
    assert_eq!(history.deployments.len(), 1);
    assert_eq!(store.find_record("app").unwrap(), Some(newer));
}

#[test]
fn history_file_format() {
    let tmp = TempDir::new().unwrap();
    let store = store(&tmp);
    store
        .add_record(record("app-feature-x-abcd1234", DeploymentKind::Preview, "feature/x"))
        .unwrap();

    let raw = std::fs::read_to_string(store.history_path()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let entry = &json["deployments"][0];

    assert_eq!(entry["serviceName"], "app-feature-x-abcd1234");
    assert_eq!(entry["type"], "preview");
    assert_eq!(entry["branch"], "feature/x");
    assert_eq!(entry["region"], "us-central1");
    assert_eq!(entry["timestamp"], "2025-03-01T12:00:00Z");
}

#[test]
fn reads_history_written_by_hand() {
    let tmp = TempDir::new().unwrap();
    let store = store(&tmp);
    std::fs::create_dir_all(store.history_path().parent().unwrap()).unwrap();
    std::fs::write(
        store.history_path(),
        r#"{
  "deployments": [
    {
      "serviceName": "app",
      "type": "production",
      "branch": "main",
      "url": "https://app.a.run.app",
      "image": "repo/app:1",
      "region": "us-central1",
      "timestamp": "2025-01-05T08:30:00.123Z"
    }
  ]
}"#,
    )
    .unwrap();

    let found = store.find_record("app").unwrap().unwrap();
    assert_eq!(found.kind, DeploymentKind::Production);
    assert_eq!(found.url, "https://app.a.run.app");
}
