mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "runway",
    about = "Deploy web apps to Cloud Run with per-branch preview environments"
)]
#[command(version)]
struct Cli {
    /// Show debug output (overridden by RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write .runway/config.json for this project
    Init {
        /// GCP project ID (default: last used project)
        #[arg(long)]
        project: Option<String>,
        /// Cloud Run region
        #[arg(long)]
        region: Option<String>,
        /// Production service name (default: directory name)
        #[arg(long)]
        service: Option<String>,
        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },
    /// Build, push, and deploy to Cloud Run
    Deploy {
        /// Deploy as the production service
        #[arg(long, conflicts_with = "preview")]
        production: bool,
        /// Deploy as a preview service
        #[arg(long)]
        preview: bool,
        /// Branch name (default: current git branch)
        #[arg(long)]
        branch: Option<String>,
        /// Environment file (default: .env)
        #[arg(long)]
        env_file: Option<PathBuf>,
    },
    /// List deployments of this project
    List {
        /// Only the production deployment
        #[arg(long)]
        production: bool,
        /// Only preview deployments
        #[arg(long)]
        preview: bool,
    },
    /// Show Cloud Run logs
    Logs {
        /// Keep polling for new entries until Ctrl-C
        #[arg(long, short = 'f')]
        follow: bool,
        /// Service name (default: production service)
        #[arg(long, short = 'd')]
        deployment: Option<String>,
        /// Number of log entries to show (default: 100)
        #[arg(long, short = 'n')]
        limit: Option<u32>,
    },
    /// Show one deployment
    Status {
        /// Service name (default: production service)
        #[arg(long, short = 'd')]
        deployment: Option<String>,
    },
    /// Delete a deployment
    Remove {
        /// Service name
        name: String,
        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    match cli.command {
        Commands::Init {
            project,
            region,
            service,
            force,
        } => commands::init(commands::InitArgs {
            project,
            region,
            service,
            force,
        })?,
        Commands::Deploy {
            production,
            preview,
            branch,
            env_file,
        } => commands::deploy(production, preview, branch, env_file).await?,
        Commands::List {
            production,
            preview,
        } => commands::list(production, preview).await?,
        Commands::Logs {
            follow,
            deployment,
            limit,
        } => commands::logs(follow, deployment.as_deref(), limit).await?,
        Commands::Status { deployment } => commands::status(deployment.as_deref()).await?,
        Commands::Remove { name, yes } => commands::remove(&name, yes).await?,
    }

    Ok(())
}
