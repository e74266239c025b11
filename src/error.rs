use std::io;
use std::path::PathBuf;

/// Grammar violations found while decoding a single stored record
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("missing '#' comment separator")]
    MissingCommentSeparator,

    #[error("expected '<user>@<host> <port> <options>' before '#', found {found} field(s)")]
    MissingFields { found: usize },

    #[error("missing '@' between user and host in '{0}'")]
    MissingUserHostSeparator(String),

    #[error("empty {0} field")]
    EmptyField(&'static str),
}

/// Errors raised by the registry, the resolver and the interactive prompts
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("{} does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("{} is not a file", .0.display())]
    NotAFile(PathBuf),

    #[error("malformed server entry on line {line}: {source}")]
    MalformedRecord {
        line: usize,
        #[source]
        source: RecordError,
    },

    #[error("invalid server number {position}: expected a value between 1 and {count}")]
    InvalidPosition { position: i64, count: usize },

    #[error("invalid server '{0}': expected a server number or user@host")]
    InvalidIdentifier(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid port '{0}': expected a number between 1 and 65535")]
    InvalidPort(String),

    #[error("cancelled by operator")]
    Cancelled,

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ServerError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ServerError::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit status reported for this failure category
    pub fn exit_code(&self) -> u8 {
        match self {
            ServerError::Cancelled => 0,
            ServerError::Io { .. } => 1,
            ServerError::NotFound(_) => 2,
            ServerError::NotAFile(_) => 3,
            ServerError::MalformedRecord { .. } => 4,
            ServerError::InvalidPosition { .. } => 5,
            ServerError::InvalidIdentifier(_) => 6,
            ServerError::InvalidInput(_) => 7,
            ServerError::InvalidPort(_) => 8,
        }
    }

    /// Check if this error is an operator abort rather than a data error
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ServerError::Cancelled)
    }
}
