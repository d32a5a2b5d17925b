use crate::command::CommandError;
use std::fmt;

/// External CLI a command is run with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Gcloud,
    Docker,
}

impl Tool {
    pub fn program(self) -> &'static str {
        match self {
            Self::Gcloud => "gcloud",
            Self::Docker => "docker",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

/// Abstraction over subprocess execution for testability.
///
/// Production code uses [`RealExecutor`], tests use mockall-generated mocks.
#[allow(async_fn_in_trait)]
pub trait CommandExecutor: Send + Sync {
    /// Run `tool` with `args`, capturing stdout. A non-zero exit yields
    /// [`CommandError::CommandFailed`] carrying the captured stderr.
    async fn exec(&self, tool: Tool, args: &[String]) -> Result<String, CommandError>;
}

/// Runs the real `gcloud` / `docker` binaries.
pub struct RealExecutor;

impl CommandExecutor for RealExecutor {
    async fn exec(&self, tool: Tool, args: &[String]) -> Result<String, CommandError> {
        use std::process::Stdio;

        let program = tool.program();
        tracing::debug!(%program, ?args, "exec");

        let output = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| CommandError::NotFound { program, source: e })?;

        if output.status.success() {
            String::from_utf8(output.stdout)
                .map_err(|e| CommandError::InvalidUtf8 { program, source: e })
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            tracing::debug!(%program, status = %output.status, "command failed");
            Err(CommandError::CommandFailed {
                program,
                args: args.to_vec(),
                stderr,
            })
        }
    }
}
