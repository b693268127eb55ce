use thiserror::Error;

/// Failures of VFS mutations and lookups. Every variant carries the
/// resolved path the operation was working on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VfsError {
    #[error("{0}: No such file or directory")]
    NotFound(String),
    #[error("{0}: Not a directory")]
    NotADirectory(String),
    #[error("{0}: Is a directory")]
    IsADirectory(String),
    #[error("{0}: File exists")]
    AlreadyExists(String),
    #[error("{0}: Directory not empty")]
    NotEmpty(String),
    #[error("{0}: {1}")]
    InvalidOperation(String, &'static str),
}

impl VfsError {
    /// Path the failed operation was resolved to.
    pub fn path(&self) -> &str {
        match self {
            Self::NotFound(p)
            | Self::NotADirectory(p)
            | Self::IsADirectory(p)
            | Self::AlreadyExists(p)
            | Self::NotEmpty(p)
            | Self::InvalidOperation(p, _) => p,
        }
    }

    /// The message without the path.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "No such file or directory",
            Self::NotADirectory(_) => "Not a directory",
            Self::IsADirectory(_) => "Is a directory",
            Self::AlreadyExists(_) => "File exists",
            Self::NotEmpty(_) => "Directory not empty",
            Self::InvalidOperation(_, why) => *why,
        }
    }
}

/// Error returned by a command handler. The dispatcher prints it as
/// `<command>: <message>` and maps it to exit status 1.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Vfs(#[from] VfsError),
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Failed(String),
}

impl CommandError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }

    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("cannot seed filesystem: {0}")]
    Seed(#[from] VfsError),
}
