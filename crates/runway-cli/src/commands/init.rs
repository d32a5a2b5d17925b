use runway_core::config::DEFAULT_REGION;
use runway_core::{ProjectConfig, StateStore, naming};
use std::path::Path;

pub struct InitArgs {
    pub project: Option<String>,
    pub region: Option<String>,
    pub service: Option<String>,
    pub force: bool,
}

/// Write `.runway/config.json` for the current directory.
pub fn init(args: InitArgs) -> anyhow::Result<()> {
    let project_dir = std::env::current_dir()?;
    let store = StateStore::open(Path::new("."))?;

    if store.is_initialized() && !args.force {
        anyhow::bail!(
            "{} already exists.\n\
             Use `runway init --force` to overwrite it.",
            store.config_path().display()
        );
    }

    let project_id = match args.project {
        Some(project) => project,
        None => store.read_global()?.last_used_project.ok_or_else(|| {
            anyhow::anyhow!("no GCP project given and none used before; pass --project <id>")
        })?,
    };

    let service_name = match args.service {
        Some(service) => naming::sanitize_service_name(&service).ok_or_else(|| {
            anyhow::anyhow!("'{service}' cannot be turned into a valid Cloud Run service name")
        })?,
        None => default_service_name(&project_dir)?,
    };

    let region = args.region.unwrap_or_else(|| DEFAULT_REGION.to_owned());
    let config = ProjectConfig::new(&project_id, &region, &service_name);
    config.validate()?;

    store.write_config(&config)?;
    if let Err(e) = store.remember_project(&project_id) {
        eprintln!("warning: could not update global preferences: {e}");
    }

    println!("Created {}", store.config_path().display());
    println!();
    println!("  project:  {}", config.project_id);
    println!("  region:   {}", config.region);
    println!("  service:  {}", config.service_name);
    println!("  registry: {}", config.artifact_registry);
    println!();
    println!("Next steps:");
    println!("  runway deploy --production");

    Ok(())
}

fn default_service_name(project_dir: &Path) -> anyhow::Result<String> {
    let dir_name = project_dir
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("cannot derive a service name; pass --service <name>"))?;

    naming::sanitize_service_name(dir_name).ok_or_else(|| {
        anyhow::anyhow!(
            "directory name '{dir_name}' is not a usable service name; pass --service <name>"
        )
    })
}
