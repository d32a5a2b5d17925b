use runway_deploy::{ListFilter, ListedDeployment};

pub async fn list(production: bool, preview: bool) -> anyhow::Result<()> {
    let deployer = super::deployer()?;
    let listing = deployer.list(ListFilter { production, preview }).await?;

    if listing.is_empty() {
        println!("No deployments found.");
        return Ok(());
    }

    if !listing.production.is_empty() {
        println!("Production:");
        for deployment in &listing.production {
            print_deployment(deployment);
        }
    }

    if !listing.preview.is_empty() {
        if !listing.production.is_empty() {
            println!();
        }
        println!("Previews:");
        for deployment in &listing.preview {
            print_deployment(deployment);
        }
    }

    Ok(())
}

fn print_deployment(deployment: &ListedDeployment) {
    let branch = deployment.branch.as_deref().unwrap_or("-");
    let deployed_at = deployment
        .deployed_at
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "-".to_owned());

    println!("  {}", deployment.name);
    println!("    branch:   {branch}");
    println!("    deployed: {deployed_at}");
    println!("    URL:      {}", deployment.url);
    if !deployment.in_history {
        println!("    (not deployed from this machine)");
    }
}
