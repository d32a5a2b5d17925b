//! `.env` loading for deployed services.
//!
//! Deliberately small: `KEY=VALUE` per line, `#` comment lines, and an
//! optional single pair of matching straight quotes around the value. No
//! escapes, no interpolation, no `export` prefix.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment file read by `runway deploy` unless `--env-file` is given.
pub const DEFAULT_ENV_FILE: &str = ".env";

pub type EnvVars = BTreeMap<String, String>;

/// Parse `.env` content. Later duplicates win; lines without `=` or with an
/// empty key are skipped.
pub fn parse(contents: &str) -> EnvVars {
    let mut vars = EnvVars::new();

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }

        vars.insert(key.to_owned(), unquote(value.trim()).to_owned());
    }

    vars
}

/// Outcome of reading an env file. Never an error: callers get an empty
/// mapping plus the reason to warn about.
#[derive(Debug)]
pub enum EnvLoad {
    Loaded { path: PathBuf, vars: EnvVars },
    Missing { path: PathBuf },
    Unreadable { path: PathBuf, source: std::io::Error },
}

impl EnvLoad {
    pub fn vars(&self) -> EnvVars {
        match self {
            Self::Loaded { vars, .. } => vars.clone(),
            Self::Missing { .. } | Self::Unreadable { .. } => EnvVars::new(),
        }
    }

    /// Message to surface to the user, if any.
    pub fn warning(&self) -> Option<String> {
        match self {
            Self::Loaded { .. } => None,
            Self::Missing { path } => Some(format!(
                "no environment file at {}; deploying without environment variables",
                path.display()
            )),
            Self::Unreadable { path, source } => Some(format!(
                "could not read environment file {}: {source}; deploying without environment variables",
                path.display()
            )),
        }
    }
}

pub fn load(path: &Path) -> EnvLoad {
    match std::fs::read_to_string(path) {
        Ok(contents) => EnvLoad::Loaded {
            path: path.to_path_buf(),
            vars: parse(&contents),
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => EnvLoad::Missing {
            path: path.to_path_buf(),
        },
        Err(e) => EnvLoad::Unreadable {
            path: path.to_path_buf(),
            source: e,
        },
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}
