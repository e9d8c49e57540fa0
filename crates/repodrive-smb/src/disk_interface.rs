//! The disk interface the SMB server calls into.
//!
//! [`DiskInterface`] is the callback surface of the protocol server: one
//! method per disk operation, each taking the calling session. The
//! repository-backed implementation, [`RepositoryDiskInterface`], keeps no
//! state of its own; per-file state lives in [`NetworkFile`] handles and
//! per-session state in the [`RepositoryContextProvider`].
//!
//! This is the only place failures are classified for the client: handle
//! and repository errors pass through [`DiskError::from_file_error`] here,
//! and nowhere else.

use crate::context::RepositoryContextProvider;
use crate::error::{DiskError, DiskResult, FileError};
use crate::file_info::{FileInfo, FileStatus, OpenParams, SeekMode, Session};
use crate::network_file::NetworkFile;
use crate::search::{SearchAttributes, SearchCursor};
use repodrive_core::{RepositoryContext, ResourceType};
use repodrive_mount::path_mapper::{self, MATCH_ALL};
use std::sync::Arc;
use tracing::{debug, trace};

/// Disk operations invoked by the protocol server.
///
/// Paths are in protocol form: backslash separated and relative to the
/// share. Handles returned by the open and create calls are owned by the
/// server and passed back to the handle-based calls.
pub trait DiskInterface: Send + Sync {
    /// Creates a file and opens it.
    fn create_file(&self, session: &Session, params: &OpenParams) -> DiskResult<NetworkFile>;

    /// Creates a directory.
    fn create_directory(&self, session: &Session, params: &OpenParams) -> DiskResult<NetworkFile>;

    /// Opens an existing file or directory.
    fn open_file(&self, session: &Session, params: &OpenParams) -> DiskResult<NetworkFile>;

    /// Closes a handle, flushing or deleting as the handle requires.
    fn close_file(&self, session: &Session, file: &mut NetworkFile) -> DiskResult<()>;

    /// Reads up to `len` bytes at `file_offset` into `buf[buf_offset..]`.
    ///
    /// Returns `None` at end of file.
    fn read_file(
        &self,
        session: &Session,
        file: &mut NetworkFile,
        buf: &mut [u8],
        buf_offset: usize,
        len: usize,
        file_offset: u64,
    ) -> DiskResult<Option<usize>>;

    /// Writes `data[data_offset..data_offset + len]` at `file_offset`.
    fn write_file(
        &self,
        session: &Session,
        file: &mut NetworkFile,
        data: &[u8],
        data_offset: usize,
        len: usize,
        file_offset: u64,
    ) -> DiskResult<usize>;

    /// Moves the handle's cursor and returns the new position.
    fn seek_file(
        &self,
        session: &Session,
        file: &mut NetworkFile,
        pos: i64,
        mode: SeekMode,
    ) -> DiskResult<u64>;

    /// Sets a file's length.
    fn truncate_file(&self, session: &Session, file: &mut NetworkFile, size: u64) -> DiskResult<()>;

    /// Writes buffered changes back.
    fn flush_file(&self, session: &Session, file: &mut NetworkFile) -> DiskResult<()>;

    /// Deletes a file. Deleting a missing path succeeds.
    fn delete_file(&self, session: &Session, path: &str) -> DiskResult<()>;

    /// Deletes a directory and its contents. Deleting a missing path succeeds.
    fn delete_directory(&self, session: &Session, path: &str) -> DiskResult<()>;

    /// Renames or moves an entry.
    fn rename_file(&self, session: &Session, old_path: &str, new_path: &str) -> DiskResult<()>;

    /// Probes a path. Never fails; anything unexpected reads as absent.
    fn file_exists(&self, session: &Session, path: &str) -> FileStatus;

    /// Metadata of a path, or `None` if nothing is there.
    fn get_file_information(&self, session: &Session, path: &str) -> DiskResult<Option<FileInfo>>;

    /// Applies a set-information request.
    ///
    /// With an open handle the request applies to it. Otherwise a transient
    /// handle is opened, updated and closed, so a delete-on-close request
    /// takes effect immediately.
    fn set_file_information(
        &self,
        session: &Session,
        path: &str,
        info: &FileInfo,
        file: Option<&mut NetworkFile>,
    ) -> DiskResult<()>;

    /// Starts a directory search.
    ///
    /// `path` is either a directory (listed in full), a wildcard pattern in a
    /// directory, or a single exact name.
    fn start_search(
        &self,
        session: &Session,
        path: &str,
        attributes: SearchAttributes,
    ) -> DiskResult<SearchCursor>;

    /// Returns true if the session cannot modify the share.
    fn is_read_only(&self, session: &Session) -> DiskResult<bool>;
}

/// [`DiskInterface`] backed by a content repository.
#[derive(Debug, Clone)]
pub struct RepositoryDiskInterface {
    contexts: Arc<RepositoryContextProvider>,
}

impl RepositoryDiskInterface {
    /// Creates a disk interface for the provider's share.
    pub fn new(contexts: Arc<RepositoryContextProvider>) -> Self {
        Self { contexts }
    }

    /// The session context provider.
    pub fn contexts(&self) -> &Arc<RepositoryContextProvider> {
        &self.contexts
    }

    fn context(&self, session: &Session) -> Arc<RepositoryContext> {
        self.contexts.context_for(session)
    }

    /// Opens the handle for an already translated path.
    fn resolve(&self, session: &Session, path: &str) -> Result<Option<NetworkFile>, FileError> {
        NetworkFile::open(
            Arc::clone(self.contexts.repository()),
            self.context(session),
            path,
        )
    }

    fn create(
        &self,
        session: &Session,
        params: &OpenParams,
        directory: bool,
    ) -> DiskResult<NetworkFile> {
        let path = path_mapper::translate_path(&params.path);
        let resource_type = if directory {
            ResourceType::Folder
        } else {
            let (_, name) = path_mapper::split_path(&path);
            ResourceType::default_for_name(name)
        };
        NetworkFile::create(
            Arc::clone(self.contexts.repository()),
            self.context(session),
            &path,
            resource_type,
        )
        .map_err(|e| DiskError::from_file_error(&params.path, e))
    }

    fn delete(&self, session: &Session, raw: &str) -> DiskResult<()> {
        let path = path_mapper::translate_path(raw);
        let mut file = match self.resolve(session, &path) {
            Ok(Some(file)) => file,
            Ok(None) => {
                debug!(path = %path, "Delete of missing path ignored");
                return Ok(());
            }
            Err(e) => return Err(DiskError::from_file_error(raw, e)),
        };
        match file.delete() {
            Ok(()) => Ok(()),
            // Gone between lookup and delete
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(DiskError::from_file_error(raw, e)),
        }
    }
}

/// Rejects directory handles for content operations before they reach the
/// handle.
fn require_file(file: &NetworkFile, operation: &'static str) -> DiskResult<()> {
    if file.is_directory() {
        return Err(DiskError::AccessDenied {
            path: file.path().to_string(),
        });
    }
    trace!(path = file.path(), operation, "File operation");
    Ok(())
}

impl DiskInterface for RepositoryDiskInterface {
    fn create_file(&self, session: &Session, params: &OpenParams) -> DiskResult<NetworkFile> {
        self.create(session, params, false)
    }

    fn create_directory(&self, session: &Session, params: &OpenParams) -> DiskResult<NetworkFile> {
        self.create(session, params, true)
    }

    fn open_file(&self, session: &Session, params: &OpenParams) -> DiskResult<NetworkFile> {
        let path = path_mapper::translate_path(&params.path);
        match self.resolve(session, &path) {
            Ok(Some(file)) => Ok(file),
            Ok(None) => Err(DiskError::NotFound {
                path: params.path.clone(),
            }),
            Err(e) => Err(DiskError::from_file_error(&params.path, e)),
        }
    }

    fn close_file(&self, _session: &Session, file: &mut NetworkFile) -> DiskResult<()> {
        file.close()
            .map_err(|e| DiskError::from_file_error(file.path(), e))
    }

    fn read_file(
        &self,
        _session: &Session,
        file: &mut NetworkFile,
        buf: &mut [u8],
        buf_offset: usize,
        len: usize,
        file_offset: u64,
    ) -> DiskResult<Option<usize>> {
        require_file(file, "read")?;
        file.read(buf, len, buf_offset, file_offset)
            .map_err(|e| DiskError::from_file_error(file.path(), e))
    }

    fn write_file(
        &self,
        _session: &Session,
        file: &mut NetworkFile,
        data: &[u8],
        data_offset: usize,
        len: usize,
        file_offset: u64,
    ) -> DiskResult<usize> {
        require_file(file, "write")?;
        file.write(data, len, data_offset, file_offset)
            .map_err(|e| DiskError::from_file_error(file.path(), e))
    }

    fn seek_file(
        &self,
        _session: &Session,
        file: &mut NetworkFile,
        pos: i64,
        mode: SeekMode,
    ) -> DiskResult<u64> {
        file.seek(pos, mode)
            .map_err(|e| DiskError::from_file_error(file.path(), e))
    }

    fn truncate_file(&self, _session: &Session, file: &mut NetworkFile, size: u64) -> DiskResult<()> {
        file.truncate(size)
            .map_err(|e| DiskError::from_file_error(file.path(), e))
    }

    fn flush_file(&self, _session: &Session, file: &mut NetworkFile) -> DiskResult<()> {
        file.flush()
            .map_err(|e| DiskError::from_file_error(file.path(), e))
    }

    fn delete_file(&self, session: &Session, path: &str) -> DiskResult<()> {
        self.delete(session, path)
    }

    fn delete_directory(&self, session: &Session, path: &str) -> DiskResult<()> {
        self.delete(session, path)
    }

    fn rename_file(&self, session: &Session, old_path: &str, new_path: &str) -> DiskResult<()> {
        let source = path_mapper::translate_path(old_path);
        let destination = path_mapper::translate_path(new_path);
        let mut file = match self.resolve(session, &source) {
            Ok(Some(file)) => file,
            Ok(None) => {
                return Err(DiskError::NotFound {
                    path: old_path.to_string(),
                });
            }
            Err(e) => return Err(DiskError::from_file_error(old_path, e)),
        };
        file.move_to(&destination)
            .map_err(|e| DiskError::from_file_error(new_path, e))
    }

    fn file_exists(&self, session: &Session, path: &str) -> FileStatus {
        let translated = path_mapper::translate_path(path);
        match self.resolve(session, &translated) {
            Ok(Some(file)) if file.is_directory() => FileStatus::DirectoryExists,
            Ok(Some(_)) => FileStatus::FileExists,
            Ok(None) => FileStatus::NotExist,
            Err(e) => {
                debug!(path = %translated, error = %e, "Existence probe failed");
                FileStatus::NotExist
            }
        }
    }

    fn get_file_information(&self, session: &Session, path: &str) -> DiskResult<Option<FileInfo>> {
        let translated = path_mapper::translate_path(path);
        let mut file = match self.resolve(session, &translated) {
            Ok(Some(file)) => file,
            Ok(None) => return Ok(None),
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(DiskError::from_file_error(path, e)),
        };
        match file.metadata() {
            Ok(info) => Ok(Some(info)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(DiskError::from_file_error(path, e)),
        }
    }

    fn set_file_information(
        &self,
        session: &Session,
        path: &str,
        info: &FileInfo,
        file: Option<&mut NetworkFile>,
    ) -> DiskResult<()> {
        if let Some(file) = file {
            file.set_metadata(info);
            return Ok(());
        }
        let translated = path_mapper::translate_path(path);
        let mut transient = match self.resolve(session, &translated) {
            Ok(Some(file)) => file,
            Ok(None) => {
                return Err(DiskError::NotFound {
                    path: path.to_string(),
                });
            }
            Err(e) => return Err(DiskError::from_file_error(path, e)),
        };
        transient.set_metadata(info);
        transient
            .close()
            .map_err(|e| DiskError::from_file_error(path, e))
    }

    fn start_search(
        &self,
        session: &Session,
        path: &str,
        attributes: SearchAttributes,
    ) -> DiskResult<SearchCursor> {
        let mut translated = path_mapper::translate_path(path);
        if path_mapper::ends_with_separator(path) || translated == "/" {
            translated = path_mapper::join_path(&translated, MATCH_ALL);
        }
        let (parent, pattern) = path_mapper::split_path(&translated);

        if path_mapper::has_wildcards(pattern) {
            let mut dir = match self.resolve(session, parent) {
                Ok(Some(dir)) => dir,
                Ok(None) => {
                    return Err(DiskError::NotFound {
                        path: path.to_string(),
                    });
                }
                Err(e) => return Err(DiskError::from_file_error(path, e)),
            };
            let entries = dir
                .search(pattern, attributes)
                .map_err(|e| DiskError::from_file_error(path, e))?;
            debug!(path = %translated, matched = entries.len(), "Search started");
            return Ok(SearchCursor::new(entries));
        }

        // No wildcards: a lookup of one exact name
        match self.resolve(session, &translated) {
            Ok(Some(mut file)) => {
                let info = file
                    .metadata()
                    .map_err(|e| DiskError::from_file_error(path, e))?;
                Ok(SearchCursor::new(vec![info]))
            }
            Ok(None) => Ok(SearchCursor::empty()),
            Err(e) if e.is_not_found() => Ok(SearchCursor::empty()),
            Err(e) => Err(DiskError::from_file_error(path, e)),
        }
    }

    fn is_read_only(&self, session: &Session) -> DiskResult<bool> {
        Ok(self.context(session).project().online)
    }
}
