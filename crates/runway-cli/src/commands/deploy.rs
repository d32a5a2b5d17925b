use runway_core::DeploymentKind;
use runway_deploy::{DeployRequest, git};
use std::path::{Path, PathBuf};

/// Branch recorded when git cannot tell us.
const UNKNOWN_BRANCH: &str = "unknown";

/// Execute the full deploy pipeline.
pub async fn deploy(
    production: bool,
    preview: bool,
    branch: Option<String>,
    env_file: Option<PathBuf>,
) -> anyhow::Result<()> {
    let deployer = super::deployer()?;

    let kind = if production {
        Some(DeploymentKind::Production)
    } else if preview {
        Some(DeploymentKind::Preview)
    } else {
        None
    };

    let branch = match branch {
        Some(branch) => branch,
        None => match git::current_branch(Path::new(".")) {
            Ok(branch) => branch,
            Err(e) => {
                eprintln!("warning: could not detect git branch ({e}); using '{UNKNOWN_BRANCH}'");
                UNKNOWN_BRANCH.to_owned()
            }
        },
    };

    let request = DeployRequest {
        kind,
        branch,
        env_file,
    };

    let report = match deployer.deploy(&request).await {
        Ok(report) => report,
        Err(aborted) => {
            for warning in &aborted.warnings {
                eprintln!("warning: {warning}");
            }
            if !aborted.completed.is_empty() {
                eprintln!("Completed before the failure:");
                for step in &aborted.completed {
                    eprintln!("  ✓ {step}");
                }
            }
            return Err(aborted.into());
        }
    };

    for warning in &report.warnings {
        eprintln!("warning: {warning}");
    }

    let record = &report.record;
    println!();
    println!("Deployed {} ({})", record.service_name, record.kind);
    println!("  branch: {}", record.branch);
    println!("  image:  {}", record.image);
    println!("  URL:    {}", record.url);

    Ok(())
}
