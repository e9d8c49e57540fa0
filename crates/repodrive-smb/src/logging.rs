//! Call tracing for disk interfaces.
//!
//! [`LoggingDiskInterface`] wraps any [`DiskInterface`] and logs every call
//! before delegating and its outcome afterwards. Successful calls log at
//! `debug`; failures log at `warn` together with their protocol category.

use crate::disk_interface::DiskInterface;
use crate::error::DiskResult;
use crate::file_info::{FileInfo, FileStatus, OpenParams, SeekMode, Session};
use crate::network_file::NetworkFile;
use crate::search::{SearchAttributes, SearchCursor};
use std::fmt::Debug;
use tracing::{debug, warn};

/// Decorator that traces each disk-interface call.
///
/// ```
/// use repodrive_smb::{DiskInterface, LoggingDiskInterface};
///
/// fn wrap<D: DiskInterface>(inner: D) -> impl DiskInterface {
///     LoggingDiskInterface::new(inner)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct LoggingDiskInterface<D> {
    inner: D,
}

impl<D: DiskInterface> LoggingDiskInterface<D> {
    /// Wraps `inner`.
    pub fn new(inner: D) -> Self {
        Self { inner }
    }

    /// The wrapped interface.
    pub fn inner(&self) -> &D {
        &self.inner
    }

    /// Unwraps the decorator.
    pub fn into_inner(self) -> D {
        self.inner
    }
}

/// Logs the outcome of `operation` and passes the result through.
fn outcome<T: Debug>(
    operation: &'static str,
    session: &Session,
    result: DiskResult<T>,
) -> DiskResult<T> {
    match &result {
        Ok(value) => debug!(session = %session.id, operation, result = ?value, "Disk call succeeded"),
        Err(e) => warn!(
            session = %session.id,
            operation,
            category = e.category().name(),
            status = e.nt_status(),
            error = %e,
            "Disk call failed"
        ),
    }
    result
}

impl<D: DiskInterface> DiskInterface for LoggingDiskInterface<D> {
    fn create_file(&self, session: &Session, params: &OpenParams) -> DiskResult<NetworkFile> {
        debug!(session = %session.id, path = %params.path, attributes = ?params.attributes, "create_file");
        outcome("create_file", session, self.inner.create_file(session, params))
    }

    fn create_directory(&self, session: &Session, params: &OpenParams) -> DiskResult<NetworkFile> {
        debug!(session = %session.id, path = %params.path, "create_directory");
        outcome(
            "create_directory",
            session,
            self.inner.create_directory(session, params),
        )
    }

    fn open_file(&self, session: &Session, params: &OpenParams) -> DiskResult<NetworkFile> {
        debug!(session = %session.id, path = %params.path, "open_file");
        outcome("open_file", session, self.inner.open_file(session, params))
    }

    fn close_file(&self, session: &Session, file: &mut NetworkFile) -> DiskResult<()> {
        debug!(
            session = %session.id,
            path = file.path(),
            dirty = file.is_dirty(),
            delete_on_close = file.is_delete_on_close(),
            "close_file"
        );
        outcome("close_file", session, self.inner.close_file(session, file))
    }

    fn read_file(
        &self,
        session: &Session,
        file: &mut NetworkFile,
        buf: &mut [u8],
        buf_offset: usize,
        len: usize,
        file_offset: u64,
    ) -> DiskResult<Option<usize>> {
        debug!(session = %session.id, path = file.path(), buf_offset, len, file_offset, "read_file");
        outcome(
            "read_file",
            session,
            self.inner
                .read_file(session, file, buf, buf_offset, len, file_offset),
        )
    }

    fn write_file(
        &self,
        session: &Session,
        file: &mut NetworkFile,
        data: &[u8],
        data_offset: usize,
        len: usize,
        file_offset: u64,
    ) -> DiskResult<usize> {
        debug!(session = %session.id, path = file.path(), data_offset, len, file_offset, "write_file");
        outcome(
            "write_file",
            session,
            self.inner
                .write_file(session, file, data, data_offset, len, file_offset),
        )
    }

    fn seek_file(
        &self,
        session: &Session,
        file: &mut NetworkFile,
        pos: i64,
        mode: SeekMode,
    ) -> DiskResult<u64> {
        debug!(session = %session.id, path = file.path(), pos, ?mode, "seek_file");
        outcome("seek_file", session, self.inner.seek_file(session, file, pos, mode))
    }

    fn truncate_file(&self, session: &Session, file: &mut NetworkFile, size: u64) -> DiskResult<()> {
        debug!(session = %session.id, path = file.path(), size, "truncate_file");
        outcome(
            "truncate_file",
            session,
            self.inner.truncate_file(session, file, size),
        )
    }

    fn flush_file(&self, session: &Session, file: &mut NetworkFile) -> DiskResult<()> {
        debug!(session = %session.id, path = file.path(), dirty = file.is_dirty(), "flush_file");
        outcome("flush_file", session, self.inner.flush_file(session, file))
    }

    fn delete_file(&self, session: &Session, path: &str) -> DiskResult<()> {
        debug!(session = %session.id, path, "delete_file");
        outcome("delete_file", session, self.inner.delete_file(session, path))
    }

    fn delete_directory(&self, session: &Session, path: &str) -> DiskResult<()> {
        debug!(session = %session.id, path, "delete_directory");
        outcome(
            "delete_directory",
            session,
            self.inner.delete_directory(session, path),
        )
    }

    fn rename_file(&self, session: &Session, old_path: &str, new_path: &str) -> DiskResult<()> {
        debug!(session = %session.id, old_path, new_path, "rename_file");
        outcome(
            "rename_file",
            session,
            self.inner.rename_file(session, old_path, new_path),
        )
    }

    fn file_exists(&self, session: &Session, path: &str) -> FileStatus {
        debug!(session = %session.id, path, "file_exists");
        let status = self.inner.file_exists(session, path);
        debug!(session = %session.id, operation = "file_exists", result = ?status, "Disk call succeeded");
        status
    }

    fn get_file_information(&self, session: &Session, path: &str) -> DiskResult<Option<FileInfo>> {
        debug!(session = %session.id, path, "get_file_information");
        outcome(
            "get_file_information",
            session,
            self.inner.get_file_information(session, path),
        )
    }

    fn set_file_information(
        &self,
        session: &Session,
        path: &str,
        info: &FileInfo,
        file: Option<&mut NetworkFile>,
    ) -> DiskResult<()> {
        debug!(
            session = %session.id,
            path,
            set_flags = ?info.set_flags,
            open_handle = file.is_some(),
            "set_file_information"
        );
        outcome(
            "set_file_information",
            session,
            self.inner.set_file_information(session, path, info, file),
        )
    }

    fn start_search(
        &self,
        session: &Session,
        path: &str,
        attributes: SearchAttributes,
    ) -> DiskResult<SearchCursor> {
        debug!(session = %session.id, path, ?attributes, "start_search");
        outcome(
            "start_search",
            session,
            self.inner.start_search(session, path, attributes),
        )
    }

    fn is_read_only(&self, session: &Session) -> DiskResult<bool> {
        debug!(session = %session.id, "is_read_only");
        outcome("is_read_only", session, self.inner.is_read_only(session))
    }
}
