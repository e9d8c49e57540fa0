//! Error types for network file handles and the disk interface.
//!
//! Two layers:
//! - [`FileError`] is raised by [`NetworkFile`](crate::NetworkFile). It carries
//!   the repository's own error untouched, plus wrong-kind rejections that
//!   never reach the repository.
//! - [`DiskError`] is what the protocol server sees. It is built only at the
//!   disk-interface boundary, from the [`ErrorCategory`] of the failure.

use repodrive_core::RepositoryError;
use repodrive_mount::ErrorCategory;
use thiserror::Error;

/// Errors raised by network file handles.
#[derive(Debug, Error)]
pub enum FileError {
    /// The repository rejected the operation.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The operation does not apply to this kind of entry (e.g. reading a
    /// directory or searching a file).
    #[error("{operation} is not supported on {path}")]
    WrongKind {
        path: String,
        operation: &'static str,
    },

    /// A caller-supplied buffer range does not fit the buffer.
    #[error("Range {offset}+{length} exceeds buffer of {available} bytes on {path}")]
    InvalidRange {
        path: String,
        offset: usize,
        length: usize,
        available: usize,
    },

    /// A write or truncation would take the file past the buffer limit.
    #[error("Range {offset}+{length} exceeds maximum file length {max} on {path}")]
    FileTooLarge {
        path: String,
        offset: u64,
        length: u64,
        max: u64,
    },

    /// A search pattern could not be compiled.
    #[error("Invalid search pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl FileError {
    /// Protocol-level classification of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            FileError::Repository(e) => ErrorCategory::from(e),
            FileError::WrongKind { .. } => ErrorCategory::AccessDenied,
            FileError::InvalidRange { .. }
            | FileError::FileTooLarge { .. }
            | FileError::InvalidPattern { .. } => ErrorCategory::IoError,
        }
    }

    /// Returns true if the repository reported the target missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FileError::Repository(e) if e.is_not_found())
    }
}

/// Result type for network file operations.
pub type FileResult<T> = Result<T, FileError>;

/// Errors reported to the protocol server.
#[derive(Debug, Error)]
pub enum DiskError {
    /// Permission or security failure.
    #[error("Access denied: {path}")]
    AccessDenied { path: String },

    /// The target already exists.
    #[error("File already exists: {path}")]
    AlreadyExists { path: String },

    /// The target does not exist.
    #[error("File not found: {path}")]
    NotFound { path: String },

    /// Any other failure; the cause is kept for diagnostics.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: FileError,
    },
}

impl DiskError {
    /// Classifies `error` raised while working on `path`.
    pub fn from_file_error(path: &str, error: FileError) -> Self {
        let path = path.to_string();
        match error.category() {
            ErrorCategory::AccessDenied => DiskError::AccessDenied { path },
            ErrorCategory::AlreadyExists => DiskError::AlreadyExists { path },
            ErrorCategory::NotFound => DiskError::NotFound { path },
            ErrorCategory::IoError => DiskError::Io {
                path,
                source: error,
            },
        }
    }

    /// The protocol category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            DiskError::AccessDenied { .. } => ErrorCategory::AccessDenied,
            DiskError::AlreadyExists { .. } => ErrorCategory::AlreadyExists,
            DiskError::NotFound { .. } => ErrorCategory::NotFound,
            DiskError::Io { .. } => ErrorCategory::IoError,
        }
    }

    /// NTSTATUS code for the SMB reply.
    pub fn nt_status(&self) -> u32 {
        self.category().nt_status()
    }

    /// The path the failed operation addressed.
    pub fn path(&self) -> &str {
        match self {
            DiskError::AccessDenied { path }
            | DiskError::AlreadyExists { path }
            | DiskError::NotFound { path }
            | DiskError::Io { path, .. } => path,
        }
    }
}

/// Result type for disk interface operations.
pub type DiskResult<T> = Result<T, DiskError>;
