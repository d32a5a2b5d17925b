use std::path::Path;
use std::process::Command;

/// Name of the branch checked out in `project_dir`.
pub fn current_branch(project_dir: &Path) -> Result<String, GitError> {
    let output = Command::new("git")
        .args(["rev-parse", "--abbrev-ref", "HEAD"])
        .current_dir(project_dir)
        .output()
        .map_err(|e| GitError::Command {
            detail: "failed to execute git rev-parse".to_owned(),
            source: e,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(GitError::Failed {
            detail: format!(
                "git rev-parse exited with {}: {}",
                output.status,
                stderr.trim()
            ),
        });
    }

    let branch = String::from_utf8_lossy(&output.stdout).trim().to_owned();
    if branch.is_empty() || branch == "HEAD" {
        return Err(GitError::Detached);
    }
    Ok(branch)
}

#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("{detail}")]
    Command {
        detail: String,
        source: std::io::Error,
    },

    #[error("{detail}")]
    Failed { detail: String },

    #[error("HEAD is detached; pass --branch to name the deployment")]
    Detached,
}
