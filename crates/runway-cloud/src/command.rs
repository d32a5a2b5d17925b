#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{program} not found: is it installed and on PATH?")]
    NotFound {
        program: &'static str,
        source: std::io::Error,
    },

    #[error("{program} command failed: {args:?}\n{stderr}")]
    CommandFailed {
        program: &'static str,
        args: Vec<String>,
        stderr: String,
    },

    #[error("{program} output was not valid UTF-8")]
    InvalidUtf8 {
        program: &'static str,
        source: std::string::FromUtf8Error,
    },
}

impl CommandError {
    /// Captured stderr of a command that ran and failed.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::CommandFailed { stderr, .. } => Some(stderr),
            Self::NotFound { .. } | Self::InvalidUtf8 { .. } => None,
        }
    }

    /// The platform reported the target resource as absent.
    pub fn is_not_found(&self) -> bool {
        self.stderr().is_some_and(|stderr| {
            let lower = stderr.to_ascii_lowercase();
            lower.contains("not_found")
                || lower.contains("could not be found")
                || lower.contains("cannot find service")
        })
    }

    /// The platform refused the call for lack of IAM permissions.
    pub fn is_permission_denied(&self) -> bool {
        self.stderr().is_some_and(|stderr| {
            let lower = stderr.to_ascii_lowercase();
            lower.contains("permission_denied")
                || lower.contains("permission denied")
                || lower.contains("does not have permission")
                || lower.contains("forbidden")
        })
    }
}
