//! Network file handles.
//!
//! A [`NetworkFile`] presents one repository resource as an open file or
//! directory. The repository only reads and replaces whole documents, so a
//! handle buffers the content in a [`FileBuffer`]:
//!
//! - content is fetched at most once, on the first operation that needs it
//! - writes and truncations only touch the buffer and bump a write counter
//! - [`flush`](NetworkFile::flush) writes the buffer back only when the write
//!   counter has moved past the last flushed value
//! - the resource lock is taken lazily before the first mutation and
//!   released on close if the handle wrote anything
//!
//! Handles are driven by one session at a time and carry no internal
//! synchronization.

use crate::error::{FileError, FileResult};
use crate::file_info::{FileAttributes, FileInfo, SeekMode, SetFlags};
use crate::search::{SearchAttributes, WildcardPattern};
use repodrive_core::{
    DeleteMode, LockType, Repository, RepositoryContext, RepositoryError, Resource,
    ResourceFilter, ResourceType,
};
use repodrive_mount::{FileBuffer, MAX_FILE_LENGTH};
use repodrive_mount::path_mapper::join_path;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, trace};

/// Length reported for directories.
///
/// Some clients refuse to use a share whose root advertises a zero or
/// negative size.
pub const DIRECTORY_LENGTH: u64 = 1;

/// How much of the resource a handle holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Nothing confirmed; the next metadata access re-reads the resource.
    NotLoaded,
    /// Resource metadata is current; content has not been fetched.
    Metadata,
    /// Content is in the file buffer.
    Content,
}

/// An open file or directory backed by a repository resource.
pub struct NetworkFile {
    repository: Arc<dyn Repository>,
    ctx: Arc<RepositoryContext>,
    resource: Resource,
    /// Site path the client addresses this handle by.
    path: String,
    buffer: FileBuffer,
    load_state: LoadState,
    /// Number of mutations applied to the buffer.
    write_count: u64,
    /// `write_count` at the last successful write-back.
    flushed_count: u64,
    delete_on_close: bool,
    /// Set while this handle holds a lock it took itself.
    acquired_lock: bool,
    closed: bool,
}

impl fmt::Debug for NetworkFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkFile")
            .field("path", &self.path)
            .field("id", &self.resource.id)
            .field("kind", &self.resource.resource_type)
            .field("load_state", &self.load_state)
            .field("write_count", &self.write_count)
            .field("flushed_count", &self.flushed_count)
            .field("delete_on_close", &self.delete_on_close)
            .finish_non_exhaustive()
    }
}

impl NetworkFile {
    /// Wraps a resolved resource. The handle starts with current metadata.
    pub fn new(
        repository: Arc<dyn Repository>,
        ctx: Arc<RepositoryContext>,
        resource: Resource,
    ) -> Self {
        let path = resource.path.clone();
        Self::with_path(repository, ctx, resource, path)
    }

    fn with_path(
        repository: Arc<dyn Repository>,
        ctx: Arc<RepositoryContext>,
        resource: Resource,
        path: String,
    ) -> Self {
        Self {
            repository,
            ctx,
            resource,
            path,
            buffer: FileBuffer::new(),
            load_state: LoadState::Metadata,
            write_count: 0,
            flushed_count: 0,
            delete_on_close: false,
            acquired_lock: false,
            closed: false,
        }
    }

    /// Opens the visible resource at `path`, or `None` if there is none.
    pub fn open(
        repository: Arc<dyn Repository>,
        ctx: Arc<RepositoryContext>,
        path: &str,
    ) -> FileResult<Option<Self>> {
        let resource = repository.read_resource(&ctx, path, ResourceFilter::VisibleNotDeleted)?;
        Ok(resource.map(|resource| Self::with_path(repository, ctx, resource, path.to_string())))
    }

    /// Creates a resource and opens it.
    ///
    /// The repository locks new resources for their creator; the lock is
    /// dropped straight away so other sessions are not blocked by a creator
    /// that never writes.
    pub fn create(
        repository: Arc<dyn Repository>,
        ctx: Arc<RepositoryContext>,
        path: &str,
        resource_type: ResourceType,
    ) -> FileResult<Self> {
        let resource = repository.create_resource(&ctx, path, resource_type, &[])?;
        repository.unlock_resource(&ctx, path)?;
        debug!(path, kind = resource_type.name(), "Created network file");
        Ok(Self::with_path(repository, ctx, resource, path.to_string()))
    }

    /// Site path of this handle.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The resource as last read from the repository.
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// The repository context this handle works in.
    pub fn context(&self) -> &RepositoryContext {
        &self.ctx
    }

    /// Returns true for directory handles.
    pub fn is_directory(&self) -> bool {
        self.resource.is_folder()
    }

    /// Current load state.
    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    /// Number of writes and truncations applied so far.
    pub fn write_count(&self) -> u64 {
        self.write_count
    }

    /// Returns true if the buffer holds changes not yet written back.
    pub fn is_dirty(&self) -> bool {
        self.write_count > self.flushed_count
    }

    /// Returns true if close will delete the resource.
    pub fn is_delete_on_close(&self) -> bool {
        self.delete_on_close
    }

    /// Returns true once the handle has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Forgets cached metadata so the next access re-reads it.
    ///
    /// Loaded content stays authoritative and is never dropped.
    pub fn invalidate(&mut self) {
        if self.load_state == LoadState::Metadata {
            self.load_state = LoadState::NotLoaded;
        }
    }

    /// Reads up to `length` bytes at `file_offset` into `dest[dest_offset..]`.
    ///
    /// Returns `None` at end of file.
    pub fn read(
        &mut self,
        dest: &mut [u8],
        length: usize,
        dest_offset: usize,
        file_offset: u64,
    ) -> FileResult<Option<usize>> {
        self.require_file("read")?;
        self.check_range(dest.len(), dest_offset, length)?;
        self.ensure_content()?;
        let read = self.buffer.read(dest, length, dest_offset, file_offset);
        trace!(path = %self.path, file_offset, length, ?read, "read");
        Ok(read)
    }

    /// Writes `data[pos..pos + length]` at `offset`.
    ///
    /// Writes ending past [`MAX_FILE_LENGTH`] are rejected untouched.
    pub fn write(&mut self, data: &[u8], length: usize, pos: usize, offset: u64) -> FileResult<usize> {
        self.require_file("write")?;
        self.check_range(data.len(), pos, length)?;
        self.check_length(offset, length as u64)?;
        self.ensure_content()?;
        self.buffer.seek(offset);
        let written = self.buffer.write(&data[pos..pos + length]);
        self.write_count += 1;
        trace!(path = %self.path, offset, written, write_count = self.write_count, "write");
        Ok(written)
    }

    /// Moves the cursor and returns the new absolute position.
    ///
    /// Positions before the start of the file clamp to 0.
    pub fn seek(&mut self, pos: i64, mode: SeekMode) -> FileResult<u64> {
        self.require_file("seek")?;
        self.ensure_content()?;
        let base = match mode {
            SeekMode::Start => 0,
            SeekMode::Current => self.buffer.position(),
            SeekMode::End => self.buffer.length(),
        };
        let target = base.saturating_add_signed(pos);
        self.buffer.seek(target);
        trace!(path = %self.path, pos, ?mode, target, "seek");
        Ok(target)
    }

    /// Sets the file length. Sizes above [`MAX_FILE_LENGTH`] are rejected.
    pub fn truncate(&mut self, size: u64) -> FileResult<()> {
        self.require_file("truncate")?;
        self.check_length(size, 0)?;
        self.ensure_content()?;
        self.buffer.truncate(size);
        self.write_count += 1;
        trace!(path = %self.path, size, write_count = self.write_count, "truncate");
        Ok(())
    }

    /// Writes buffered changes back to the repository.
    ///
    /// A no-op unless something changed since the last flush. On failure the
    /// watermark stays put, so the next flush retries the same bytes.
    #[instrument(level = "debug", skip(self), fields(path = %self.path))]
    pub fn flush(&mut self) -> FileResult<()> {
        if !self.is_dirty() {
            return Ok(());
        }
        self.ensure_lock()?;
        let updated = self
            .repository
            .write_content(&self.ctx, &self.resource, self.buffer.contents())?;
        self.resource = updated;
        self.flushed_count = self.write_count;
        debug!(size = self.buffer.length(), write_count = self.write_count, "Flushed");
        Ok(())
    }

    /// Closes the handle.
    ///
    /// Deletes the resource if delete-on-close was requested; otherwise
    /// flushes and, if the handle ever wrote, releases its lock. Closing an
    /// already closed handle does nothing.
    #[instrument(level = "debug", skip(self), fields(path = %self.path))]
    pub fn close(&mut self) -> FileResult<()> {
        if self.closed {
            return Ok(());
        }
        if self.delete_on_close {
            self.delete()?;
        } else {
            self.flush()?;
            if self.write_count > 0 {
                self.release_lock()?;
            }
        }
        self.closed = true;
        Ok(())
    }

    /// Deletes the resource, leaving siblings that share its content alone.
    #[instrument(level = "debug", skip(self), fields(path = %self.path))]
    pub fn delete(&mut self) -> FileResult<()> {
        if !self.is_directory() {
            self.ensure_content()?;
        }
        self.ensure_lock()?;
        self.repository
            .delete_resource(&self.ctx, &self.path, DeleteMode::PreserveSiblings)?;
        // The repository drops locks of deleted resources
        self.acquired_lock = false;
        debug!("Deleted");
        Ok(())
    }

    /// Moves or renames the resource to `new_path`.
    ///
    /// The resource keeps its identity; the handle re-reads it by id
    /// afterwards. A lock taken only for the move is released again.
    #[instrument(level = "debug", skip(self), fields(path = %self.path))]
    pub fn move_to(&mut self, new_path: &str) -> FileResult<()> {
        self.ensure_metadata()?;
        let locked_here = self.ensure_lock()?;
        if let Err(e) = self.repository.move_resource(&self.ctx, &self.path, new_path) {
            if locked_here && !self.is_dirty() {
                self.release_lock()?;
            }
            return Err(e.into());
        }
        self.path = new_path.to_string();

        self.load_state = LoadState::NotLoaded;
        self.ensure_metadata()?;
        if locked_here && !self.is_dirty() {
            self.release_lock()?;
        }
        debug!(new_path, "Moved");
        Ok(())
    }

    /// Lists the children of this directory that pass `attributes` and whose
    /// name matches `pattern`.
    ///
    /// The result is a snapshot taken now.
    #[instrument(level = "debug", skip(self), fields(path = %self.path))]
    pub fn search(
        &mut self,
        pattern: &str,
        attributes: SearchAttributes,
    ) -> FileResult<Vec<FileInfo>> {
        if !self.is_directory() {
            return Err(self.wrong_kind("search"));
        }
        let matcher = WildcardPattern::new(pattern)?;
        let children =
            self.repository
                .list_children(&self.ctx, &self.path, ResourceFilter::VisibleNotDeleted)?;
        let total = children.len();

        let matches: Vec<FileInfo> = children
            .into_iter()
            .map(|child| {
                let child_path = join_path(&self.path, child.name());
                NetworkFile::with_path(
                    Arc::clone(&self.repository),
                    Arc::clone(&self.ctx),
                    child,
                    child_path,
                )
            })
            .filter(|child| attributes.includes(child.is_directory()))
            .filter(|child| matcher.is_match(child.resource.name()))
            .map(|child| child.info())
            .collect();
        debug!(total, matched = matches.len(), "Searched");
        Ok(matches)
    }

    /// Current metadata, re-reading the resource if it was invalidated.
    pub fn metadata(&mut self) -> FileResult<FileInfo> {
        self.ensure_metadata()?;
        Ok(self.info())
    }

    /// Applies a set-information request.
    ///
    /// Only [`SetFlags::DELETE_ON_CLOSE`] is honoured; deletion happens when
    /// the handle closes.
    pub fn set_metadata(&mut self, info: &FileInfo) {
        if info.set_flags.contains(SetFlags::DELETE_ON_CLOSE) {
            debug!(path = %self.path, "Marked for delete on close");
            self.delete_on_close = true;
        }
    }

    fn info(&self) -> FileInfo {
        let size = if self.is_directory() {
            DIRECTORY_LENGTH
        } else if self.load_state == LoadState::Content {
            self.buffer.length()
        } else {
            self.resource.length
        };
        let mut attributes = if self.is_directory() {
            FileAttributes::DIRECTORY
        } else {
            FileAttributes::NORMAL
        };
        if self.ctx.project().online {
            attributes |= FileAttributes::READONLY;
            attributes.remove(FileAttributes::NORMAL);
        }
        FileInfo {
            name: self.resource.name().to_string(),
            size,
            attributes,
            creation_time: self.resource.date_created,
            last_write_time: self.resource.date_last_modified,
            change_time: self.resource.date_content,
            file_id: self.resource.id.fold_u64(),
            set_flags: SetFlags::empty(),
        }
    }

    fn ensure_metadata(&mut self) -> FileResult<()> {
        if self.load_state != LoadState::NotLoaded {
            return Ok(());
        }
        let resource = self
            .repository
            .read_resource_by_id(&self.ctx, self.resource.id, ResourceFilter::VisibleNotDeleted)?
            .ok_or_else(|| RepositoryError::NotFound {
                path: self.path.clone(),
            })?;
        trace!(path = %self.path, "Refreshed metadata");
        self.resource = resource;
        self.load_state = LoadState::Metadata;
        Ok(())
    }

    fn ensure_content(&mut self) -> FileResult<()> {
        if self.load_state == LoadState::Content {
            return Ok(());
        }
        if self.is_directory() {
            return Err(self.wrong_kind("load content"));
        }
        let content = self.repository.read_content(&self.ctx, &self.resource)?;
        self.check_length(0, content.len() as u64)?;
        let mut buffer = FileBuffer::with_capacity(content.len());
        buffer.init(&content);
        self.buffer = buffer;
        self.load_state = LoadState::Content;
        debug!(path = %self.path, size = content.len(), "Loaded content");
        Ok(())
    }

    /// Makes sure the session user holds the lock.
    ///
    /// Returns true if this call took the lock.
    fn ensure_lock(&mut self) -> FileResult<bool> {
        let info = self.repository.lock_info(&self.ctx, &self.path)?;
        if info.is_owned_by(self.ctx.user()) {
            return Ok(false);
        }
        self.repository
            .lock_resource(&self.ctx, &self.path, LockType::Temporary)?;
        self.acquired_lock = true;
        trace!(path = %self.path, "Locked");
        Ok(true)
    }

    /// Releases a lock this handle took.
    fn release_lock(&mut self) -> FileResult<()> {
        if !self.acquired_lock {
            return Ok(());
        }
        self.repository.unlock_resource(&self.ctx, &self.path)?;
        self.acquired_lock = false;
        trace!(path = %self.path, "Unlocked");
        Ok(())
    }

    fn require_file(&self, operation: &'static str) -> FileResult<()> {
        if self.is_directory() {
            Err(self.wrong_kind(operation))
        } else {
            Ok(())
        }
    }

    fn wrong_kind(&self, operation: &'static str) -> FileError {
        FileError::WrongKind {
            path: self.path.clone(),
            operation,
        }
    }

    fn check_length(&self, offset: u64, length: u64) -> FileResult<()> {
        if FileBuffer::fits(offset, length) {
            Ok(())
        } else {
            Err(FileError::FileTooLarge {
                path: self.path.clone(),
                offset,
                length,
                max: MAX_FILE_LENGTH,
            })
        }
    }

    fn check_range(&self, available: usize, offset: usize, length: usize) -> FileResult<()> {
        match offset.checked_add(length) {
            Some(end) if end <= available => Ok(()),
            _ => Err(FileError::InvalidRange {
                path: self.path.clone(),
                offset,
                length,
                available,
            }),
        }
    }
}
