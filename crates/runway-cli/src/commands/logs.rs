use runway_cloud::{DEFAULT_LOG_LIMIT, LogEntry};
use tokio_util::sync::CancellationToken;

pub async fn logs(follow: bool, deployment: Option<&str>, limit: Option<u32>) -> anyhow::Result<()> {
    let deployer = super::deployer()?;
    let limit = limit.unwrap_or(DEFAULT_LOG_LIMIT);

    if !follow {
        let entries = deployer.tail_logs(deployment, limit).await?;
        if entries.is_empty() {
            println!("No log entries.");
        }
        for entry in &entries {
            print_entry(entry);
        }
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => on_interrupt.cancel(),
            Err(e) => tracing::warn!("could not listen for Ctrl-C: {e}"),
        }
    });

    println!("Following logs (Ctrl-C to stop)...");
    deployer
        .follow_logs(deployment, limit, cancel, |entry| print_entry(&entry))
        .await?;

    Ok(())
}

fn print_entry(entry: &LogEntry) {
    println!(
        "{} {:<8} {}",
        entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
        entry.severity.to_string(),
        entry.message
    );
}
