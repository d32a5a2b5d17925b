use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use runway_core::DeploymentKind;
use runway_core::naming::{self, MAX_SERVICE_NAME_LEN, SUFFIX_LEN};

fn valid_shape(name: &str) -> bool {
    let bytes = name.as_bytes();
    !bytes.is_empty()
        && bytes[0].is_ascii_alphanumeric()
        && bytes[bytes.len() - 1].is_ascii_alphanumeric()
        && bytes
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
        && !name.contains("--")
}

proptest! {
    #[test]
    fn preview_names_are_always_valid(branch in any::<String>(), seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let name = naming::derive_service_name("app", DeploymentKind::Preview, &branch, &mut rng);

        prop_assert!(valid_shape(&name), "invalid name {name:?} for branch {branch:?}");
        prop_assert!(name.len() <= MAX_SERVICE_NAME_LEN);
        prop_assert!(naming::is_valid_service_name(&name));
    }

    #[test]
    fn preview_names_valid_for_any_base(
        base in "[a-zA-Z0-9_./-]{0,80}",
        branch in "\\PC{0,60}",
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let name = naming::derive_service_name(&base, DeploymentKind::Preview, &branch, &mut rng);

        prop_assert!(valid_shape(&name), "invalid name {name:?}");
        prop_assert!(name.len() <= MAX_SERVICE_NAME_LEN);
    }

    #[test]
    fn production_name_is_base(base in "[a-z][a-z0-9-]{0,40}", branch in any::<String>()) {
        let mut rng = StdRng::seed_from_u64(0);
        let name = naming::derive_service_name(&base, DeploymentKind::Production, &branch, &mut rng);
        prop_assert_eq!(name, base);
    }

    #[test]
    fn sanitized_branch_is_stable_and_bounded(branch in any::<String>()) {
        let first = naming::sanitize_branch(&branch);
        let second = naming::sanitize_branch(&branch);

        prop_assert_eq!(&first, &second);
        prop_assert!(first.len() <= naming::MAX_BRANCH_LEN);
        prop_assert!(!first.starts_with('-') && !first.ends_with('-'));
        prop_assert!(!first.contains("--"));
    }
}

#[test]
fn successive_previews_differ_only_in_suffix() {
    let mut rng = rand::rng();
    let a = naming::derive_service_name("app", DeploymentKind::Preview, "feature/X", &mut rng);
    let b = naming::derive_service_name("app", DeploymentKind::Preview, "feature/X", &mut rng);

    assert_ne!(a, b);
    assert_eq!(a[..a.len() - SUFFIX_LEN], b[..b.len() - SUFFIX_LEN]);
    assert!(a.starts_with("app-feature-x-"));
}

#[test]
fn unicode_branch_is_replaced() {
    let mut rng = StdRng::seed_from_u64(42);
    let name = naming::derive_service_name("app", DeploymentKind::Preview, "機能/ß-Ünïcode", &mut rng);

    assert!(naming::is_valid_service_name(&name));
    assert!(name.starts_with("app-"));
}
