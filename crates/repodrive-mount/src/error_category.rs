//! Error category mapping for repository errors.
//!
//! The file-sharing protocol only distinguishes a handful of failure kinds.
//! [`ErrorCategory`] is the single place repository failures are classified
//! into them, so every backend reports the same failure the same way.
//!
//! | Repository failure | Category |
//! |---|---|
//! | permission or project-security violation | [`ErrorCategory::AccessDenied`] |
//! | resource already at the target path | [`ErrorCategory::AlreadyExists`] |
//! | no resource at the path | [`ErrorCategory::NotFound`] |
//! | anything else | [`ErrorCategory::IoError`] |

use repodrive_core::RepositoryError;
use std::io;

/// Semantic category for repository errors.
///
/// # Example
///
/// ```
/// use repodrive_core::RepositoryError;
/// use repodrive_mount::ErrorCategory;
///
/// let err = RepositoryError::NotFound { path: "/test".to_string() };
/// let category = ErrorCategory::from(&err);
///
/// assert_eq!(category, ErrorCategory::NotFound);
/// assert_eq!(category.nt_status(), 0xC000_0034);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Permission or security failure, or an operation on the wrong kind of
    /// entry (STATUS_ACCESS_DENIED)
    AccessDenied,
    /// Target already exists (STATUS_OBJECT_NAME_COLLISION)
    AlreadyExists,
    /// Target not found (STATUS_OBJECT_NAME_NOT_FOUND)
    NotFound,
    /// Any other failure (STATUS_UNEXPECTED_IO_ERROR)
    IoError,
}

impl ErrorCategory {
    /// Converts this category to the NTSTATUS code an SMB server replies with.
    #[inline]
    pub fn nt_status(self) -> u32 {
        match self {
            Self::AccessDenied => 0xC000_0022,
            Self::AlreadyExists => 0xC000_0035,
            Self::NotFound => 0xC000_0034,
            Self::IoError => 0xC000_00E9,
        }
    }

    /// Returns a human-readable name for this error category.
    pub fn name(self) -> &'static str {
        match self {
            Self::AccessDenied => "AccessDenied",
            Self::AlreadyExists => "AlreadyExists",
            Self::NotFound => "NotFound",
            Self::IoError => "IoError",
        }
    }
}

impl From<&RepositoryError> for ErrorCategory {
    fn from(e: &RepositoryError) -> Self {
        match e {
            RepositoryError::PermissionDenied { .. }
            | RepositoryError::WriteInOnlineProject { .. } => Self::AccessDenied,
            RepositoryError::AlreadyExists { .. } => Self::AlreadyExists,
            RepositoryError::NotFound { .. } => Self::NotFound,
            RepositoryError::Io { source, .. } => Self::from(source),
            RepositoryError::Locked { .. }
            | RepositoryError::NotLocked { .. }
            | RepositoryError::NotAFolder { .. }
            | RepositoryError::NotAFile { .. }
            | RepositoryError::InvalidPath { .. }
            | RepositoryError::UnknownProject { .. } => Self::IoError,
        }
    }
}

impl From<RepositoryError> for ErrorCategory {
    fn from(e: RepositoryError) -> Self {
        Self::from(&e)
    }
}

impl From<&io::Error> for ErrorCategory {
    fn from(e: &io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => Self::NotFound,
            io::ErrorKind::AlreadyExists => Self::AlreadyExists,
            io::ErrorKind::PermissionDenied => Self::AccessDenied,
            _ => Self::IoError,
        }
    }
}
