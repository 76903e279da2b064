use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssignmeError {
    #[error("Not authenticated. Run `assignme auth` or set `auth.token_file` first.")]
    NotAuthenticated,

    #[error("No organization given. Pass `--org` or set `defaults.org` in the config.")]
    NoOrganization,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("GitHub API error: {0}")]
    GitHub(String),

    #[error("GitHub returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cannot read team snapshot {}: {source}", path.display())]
    SnapshotRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Team snapshot {} is not a valid team listing: {source}", path.display())]
    SnapshotParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Team not found in {}: {team}. Run `assignme fetch-teams` to refresh it.", snapshot.display())]
    TeamNotFound { team: String, snapshot: PathBuf },

    #[error("{failed} of {total} step(s) failed")]
    StepsFailed { failed: usize, total: usize },
}

impl From<octocrab::Error> for AssignmeError {
    fn from(err: octocrab::Error) -> Self {
        AssignmeError::GitHub(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AssignmeError>;
