//! Service name derivation.
//!
//! Production deploys reuse the configured service name. Preview deploys get
//! `<base>-<branch>-<suffix>` where the branch is sanitized and the suffix is
//! eight random lowercase alphanumerics. Every derived preview name satisfies
//! Cloud Run's naming rule: lowercase alphanumerics and hyphens, starting and
//! ending with an alphanumeric, at most [`MAX_SERVICE_NAME_LEN`] characters,
//! and never two hyphens in a row.

use crate::history::DeploymentKind;
use rand::Rng;

/// Branch that deploys to production when no kind is requested explicitly.
pub const TRUNK_BRANCH: &str = "main";

pub const MAX_BRANCH_LEN: usize = 30;
pub const SUFFIX_LEN: usize = 8;
pub const MAX_SERVICE_NAME_LEN: usize = 63;

const SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Production only when asked for explicitly or when deploying the trunk branch.
pub fn resolve_kind(explicit: Option<DeploymentKind>, branch: &str) -> DeploymentKind {
    match explicit {
        Some(kind) => kind,
        None if branch == TRUNK_BRANCH => DeploymentKind::Production,
        None => DeploymentKind::Preview,
    }
}

/// Derive the service name for a deploy.
///
/// The random source is injected so callers (and tests) control it.
pub fn derive_service_name<R: Rng + ?Sized>(
    base: &str,
    kind: DeploymentKind,
    branch: &str,
    rng: &mut R,
) -> String {
    match kind {
        DeploymentKind::Production => base.to_owned(),
        DeploymentKind::Preview => {
            let branch = sanitize_branch(branch);
            let suffix = random_suffix(rng);

            let reserved = SUFFIX_LEN + 1 + if branch.is_empty() { 0 } else { branch.len() + 1 };
            let base: String = normalize_hyphens(&replace_invalid(base))
                .chars()
                .take(MAX_SERVICE_NAME_LEN - reserved)
                .collect();

            normalize_hyphens(&format!("{base}-{branch}-{suffix}"))
        }
    }
}

/// Lowercase, map everything outside `[a-z0-9-]` to `-`, collapse and trim
/// hyphens, cap at [`MAX_BRANCH_LEN`], then trim again since truncation can
/// expose a trailing hyphen.
pub fn sanitize_branch(branch: &str) -> String {
    let collapsed = normalize_hyphens(&replace_invalid(branch));
    let truncated: String = collapsed.chars().take(MAX_BRANCH_LEN).collect();
    truncated.trim_end_matches('-').to_owned()
}

/// Turn an arbitrary label (e.g. a directory name) into a usable service name.
/// Returns `None` when nothing alphanumeric survives.
pub fn sanitize_service_name(raw: &str) -> Option<String> {
    let normalized = normalize_hyphens(&replace_invalid(raw));
    let truncated: String = normalized.chars().take(MAX_SERVICE_NAME_LEN).collect();
    let name = truncated.trim_end_matches('-');
    if name.is_empty() {
        None
    } else {
        Some(name.to_owned())
    }
}

/// Prefix shared by every preview derived from `base`.
pub fn preview_prefix(base: &str) -> String {
    format!("{base}-")
}

/// Whether `name` belongs to the deployment family of `base`.
pub fn belongs_to(base: &str, name: &str) -> bool {
    name == base || name.starts_with(&preview_prefix(base))
}

pub fn is_valid_service_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    let (Some(first), Some(last)) = (bytes.first(), bytes.last()) else {
        return false;
    };

    name.len() <= MAX_SERVICE_NAME_LEN
        && first.is_ascii_alphanumeric()
        && last.is_ascii_alphanumeric()
        && bytes
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
        && !name.contains("--")
}

pub fn random_suffix<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..SUFFIX_LEN)
        .map(|_| SUFFIX_CHARSET[rng.random_range(0..SUFFIX_CHARSET.len())] as char)
        .collect()
}

fn replace_invalid(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Collapse runs of `-` and trim them from both ends.
fn normalize_hyphens(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c == '-' && (out.is_empty() || out.ends_with('-')) {
            continue;
        }
        out.push(c);
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}
