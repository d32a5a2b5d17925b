use arch_lint::rules::{NoErrorSwallowing, NoSilentResultDrop};
use arch_lint::{Analyzer, Severity};
use std::path::Path;

/// Workspace members, libraries before the binary.
const CRATES: &[&str] = &["runway-core", "runway-cloud", "runway-deploy", "runway-cli"];

/// Runs AL003 (no-error-swallowing) and AL013 (no-silent-result-drop) against
/// every runway crate's `src/`. Test code is excluded.
#[test]
fn arch_lint_al003_al013() {
    let crates_dir = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("crates directory");

    let mut reports = Vec::new();
    for name in CRATES {
        let src = crates_dir.join(name).join("src");
        assert!(src.is_dir(), "missing source tree for {name}");

        let analyzer = Analyzer::builder()
            .root(src.as_path())
            .exclude("**/target/**")
            .exclude("**/tests/**")
            .rule(NoErrorSwallowing::new())
            .rule(NoSilentResultDrop::new())
            .build()
            .expect("build analyzer");

        let result = analyzer.analyze().expect("analyze");
        if result.has_violations_at(Severity::Warning) {
            reports.push(format!(
                "{name}:\n{}",
                result.format_test_report(Severity::Warning)
            ));
        }
    }

    assert!(reports.is_empty(), "{}", reports.join("\n"));
}
