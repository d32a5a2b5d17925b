pub async fn status(deployment: Option<&str>) -> anyhow::Result<()> {
    let deployer = super::deployer()?;
    let status = deployer.status(deployment).await?;
    let service = &status.service;

    println!("Service:  {}", service.name);
    println!("Region:   {}", service.region);
    println!("Ready:    {}", if service.ready { "yes" } else { "no" });
    println!(
        "URL:      {}",
        if service.url.is_empty() { "-" } else { service.url.as_str() }
    );
    if let Some(image) = &service.image {
        println!("Image:    {image}");
    }
    if let Some(created_at) = service.created_at {
        println!("Created:  {}", created_at.format("%Y-%m-%d %H:%M UTC"));
    }

    match &status.record {
        Some(record) => {
            println!("Kind:     {}", record.kind);
            println!("Branch:   {}", record.branch);
            println!("Deployed: {}", record.created_at.format("%Y-%m-%d %H:%M UTC"));
        }
        None => println!("(not in local deployment history)"),
    }

    Ok(())
}
