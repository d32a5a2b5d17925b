use proptest::prelude::*;
use runway_core::env;
use std::collections::BTreeMap;
use tempfile::TempDir;

proptest! {
    #[test]
    fn env_round_trip(
        vars in prop::collection::btree_map(
            "[A-Z_][A-Z0-9_]{0,15}",
            "[a-zA-Z0-9:/._=@ -]{0,30}",
            0..12,
        )
    ) {
        // Surrounding whitespace is trimmed on parse, so compare against trimmed values.
        let expected: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.clone(), v.trim().to_owned()))
            .collect();
        let serialized: String = vars
            .iter()
            .map(|(k, v)| format!("{k}={v}\n"))
            .collect();

        prop_assert_eq!(env::parse(&serialized), expected);
    }
}

#[test]
fn env_load_missing_file_warns() {
    let tmp = TempDir::new().unwrap();
    let loaded = env::load(&tmp.path().join(".env"));

    assert!(loaded.vars().is_empty());
    assert!(loaded.warning().unwrap().contains("no environment file"));
}

#[test]
fn env_load_reads_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join(".env");
    std::fs::write(&path, "# settings\nAPI_KEY='abc=123'\nDEBUG=true\n").unwrap();

    let loaded = env::load(&path);
    let vars = loaded.vars();

    assert!(loaded.warning().is_none());
    assert_eq!(vars["API_KEY"], "abc=123");
    assert_eq!(vars["DEBUG"], "true");
}
