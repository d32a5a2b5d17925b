use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {path}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}")]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to write {path}")]
    StateWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize {path}")]
    StateSerialize {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("project is not initialized ({path} not found); run: runway init")]
    NotInitialized { path: PathBuf },

    #[error(
        "invalid project configuration: missing required field(s): {}",
        missing.join(", ")
    )]
    InvalidConfig { missing: Vec<&'static str> },

    #[error("could not determine the user configuration directory; set RUNWAY_CONFIG_DIR")]
    NoHomeDir,
}
