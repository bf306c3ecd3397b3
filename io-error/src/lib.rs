use std::io::ErrorKind;
use std::path::Path;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FileError>;

/// Error taxonomy for file handles and streams.
///
/// Platform error codes never reach callers directly: OS-level failures
/// are translated into these variants at the call site, either through
/// [`FileError::from_os`] (open-time errors, where the path is known and
/// the kind matters) or through the blanket `From<std::io::Error>`
/// (read/write failures, surfaced as [`FileError::Io`]).
///
/// There is no `Cancelled` variant because no cancellation path exists:
/// a read blocks until the OS completes or fails it.
#[derive(Error, Debug)]
pub enum FileError {
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("file already exists: {0}")]
    AlreadyExists(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FileError {
    /// Translate an OS-level error raised for `path` into the taxonomy.
    pub fn from_os(path: impl AsRef<Path>, err: std::io::Error) -> Self {
        let path = path.as_ref().display().to_string();
        match err.kind() {
            ErrorKind::NotFound => Self::NotFound(path),
            ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            ErrorKind::AlreadyExists => Self::AlreadyExists(path),
            _ => Self::Io(err),
        }
    }
}

impl From<Box<dyn std::error::Error>> for FileError {
    fn from(e: Box<dyn std::error::Error>) -> Self {
        Self::Other(anyhow::anyhow!(e.to_string()))
    }
}
