use runway_deploy::{RemovalPlan, RemoveOutcome};
use std::io::Write;

/// Delete a Cloud Run service and its local history entry.
pub async fn remove(name: &str, skip_confirm: bool) -> anyhow::Result<()> {
    let deployer = super::deployer()?;

    let report = deployer
        .remove(name, |plan| {
            if skip_confirm {
                Ok(true)
            } else {
                confirm(plan)
            }
        })
        .await?;

    for warning in &report.warnings {
        eprintln!("warning: {warning}");
    }

    match report.outcome {
        RemoveOutcome::Removed => println!("Removed {name}."),
        RemoveOutcome::AlreadyAbsent => {
            println!("{name} was already gone from Cloud Run; local history cleaned.")
        }
        RemoveOutcome::Cancelled => println!("Aborted."),
    }

    Ok(())
}

fn confirm(plan: &RemovalPlan) -> std::io::Result<bool> {
    println!("This will delete:");
    println!(
        "  - Cloud Run service '{}' in {} (project {})",
        plan.name, plan.region, plan.project_id
    );
    if let Some(record) = &plan.record {
        println!("    {} deployment of branch '{}'", record.kind, record.branch);
        println!("    {}", record.url);
    }
    println!();
    print!("Are you sure? [y/N] ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    Ok(matches!(input.trim(), "y" | "Y" | "yes" | "YES"))
}
