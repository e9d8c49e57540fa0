//! Error types for repository operations.
//!
//! Lookups that may legitimately find nothing return `Ok(None)` instead of
//! an error; the variants below are reserved for conditions the caller has to
//! handle or report.

use crate::repository::Permissions;
use std::io;
use thiserror::Error;

/// Errors raised by a [`Repository`](crate::Repository) implementation.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// No resource exists at the given path.
    #[error("Resource not found: {path}")]
    NotFound { path: String },

    /// A visible resource already occupies the target path.
    #[error("Resource already exists: {path}")]
    AlreadyExists { path: String },

    /// The user lacks the required permissions on the path.
    #[error("Permission denied for user '{user}' on {path} (required {permissions:?})")]
    PermissionDenied {
        path: String,
        user: String,
        permissions: Permissions,
    },

    /// Mutations are not allowed in the published project.
    #[error("Cannot modify {path} in the online project")]
    WriteInOnlineProject { path: String },

    /// The resource is locked by another user.
    #[error("Resource {path} is locked by '{owner}'")]
    Locked { path: String, owner: String },

    /// A mutation requires a lock the current user does not hold.
    #[error("Resource {path} must be locked before it can be modified")]
    NotLocked { path: String },

    /// A folder was expected.
    #[error("Not a folder: {path}")]
    NotAFolder { path: String },

    /// A file-like resource was expected.
    #[error("Not a file: {path}")]
    NotAFile { path: String },

    /// The path is malformed.
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// The named project does not exist.
    #[error("Unknown project: {name}")]
    UnknownProject { name: String },

    /// Backing store failure.
    #[error("I/O error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl RepositoryError {
    /// Returns true if this error reports a missing resource.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }
}

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;
