//! Protocol-shaped value types exchanged with the SMB server.

use bitflags::bitflags;
use std::fmt;
use std::time::SystemTime;

/// Identifier of a protocol session, assigned by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An authenticated client session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    /// User name as sent by the client, possibly domain-qualified.
    pub user_name: String,
}

impl Session {
    /// Creates a session for `user_name`.
    pub fn new(id: u64, user_name: impl Into<String>) -> Self {
        Self {
            id: SessionId(id),
            user_name: user_name.into(),
        }
    }
}

bitflags! {
    /// File attributes reported to the client.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FileAttributes: u32 {
        const READONLY = 0x0000_0001;
        const HIDDEN = 0x0000_0002;
        const SYSTEM = 0x0000_0004;
        const DIRECTORY = 0x0000_0010;
        const ARCHIVE = 0x0000_0020;
        const NORMAL = 0x0000_0080;
    }
}

bitflags! {
    /// Which fields of a [`FileInfo`] a set-information request carries.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SetFlags: u32 {
        const FILE_SIZE = 0x0001;
        const ALLOCATION_SIZE = 0x0002;
        const ATTRIBUTES = 0x0004;
        const MODIFY_DATE = 0x0008;
        const CREATION_DATE = 0x0010;
        const ACCESS_DATE = 0x0020;
        const CHANGE_DATE = 0x0040;
        const DELETE_ON_CLOSE = 0x0080;
    }
}

/// Metadata of a file or directory as the protocol sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Final path segment.
    pub name: String,
    /// Content length; directories report a non-zero placeholder.
    pub size: u64,
    pub attributes: FileAttributes,
    pub creation_time: SystemTime,
    pub last_write_time: SystemTime,
    pub change_time: SystemTime,
    /// Stable numeric id derived from the resource's durable identity.
    pub file_id: u64,
    /// Fields to apply when this value is used in a set request.
    pub set_flags: SetFlags,
}

impl FileInfo {
    /// Returns true for directories.
    pub fn is_directory(&self) -> bool {
        self.attributes.contains(FileAttributes::DIRECTORY)
    }

    /// Returns true when the entry cannot be modified.
    pub fn is_read_only(&self) -> bool {
        self.attributes.contains(FileAttributes::READONLY)
    }

    /// Returns true if this is a set request asking for delete-on-close.
    pub fn delete_on_close(&self) -> bool {
        self.set_flags.contains(SetFlags::DELETE_ON_CLOSE)
    }

    /// Builds a set request that only marks the target for delete-on-close.
    pub fn delete_on_close_request(name: impl Into<String>) -> Self {
        let epoch = SystemTime::UNIX_EPOCH;
        Self {
            name: name.into(),
            size: 0,
            attributes: FileAttributes::NORMAL,
            creation_time: epoch,
            last_write_time: epoch,
            change_time: epoch,
            file_id: 0,
            set_flags: SetFlags::DELETE_ON_CLOSE,
        }
    }
}

/// Origin of a seek.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekMode {
    /// From the start of the file.
    Start,
    /// From the current cursor.
    Current,
    /// From the end of the file.
    End,
}

/// Existence probe result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    NotExist,
    FileExists,
    DirectoryExists,
}

/// Parameters of an open or create request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenParams {
    /// Path in protocol form (backslash separated, share relative).
    pub path: String,
    /// Attributes requested by the client.
    pub attributes: FileAttributes,
}

impl OpenParams {
    /// Request for `path` with normal attributes.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            attributes: FileAttributes::NORMAL,
        }
    }

    /// Request for a directory at `path`.
    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            attributes: FileAttributes::DIRECTORY,
        }
    }
}
