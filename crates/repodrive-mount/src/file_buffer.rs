//! File content buffer for random-access I/O on whole-document resources.
//!
//! The repository can only read or replace a resource's content as a whole,
//! so each open handle keeps the document in a [`FileBuffer`]:
//! 1. On first content access: the existing content is loaded with [`FileBuffer::init`]
//! 2. On write/truncate: the in-memory copy is modified
//! 3. On flush: the handle writes [`FileBuffer::contents`] back
//!
//! Reads take an explicit file offset while writes go to the cursor. Callers
//! always [`seek`](FileBuffer::seek) immediately before writing.

use crate::growable_buffer::GrowableBuffer;

/// Largest file length a buffer will hold.
///
/// Offsets and sizes come from the network client; anything that would end
/// past this limit must be rejected before it reaches [`FileBuffer::write`]
/// or [`FileBuffer::truncate`].
pub const MAX_FILE_LENGTH: u64 = 1 << 31;

/// In-memory file content with a write cursor.
///
/// # Example
///
/// ```
/// use repodrive_mount::FileBuffer;
///
/// let mut buf = FileBuffer::new();
/// buf.seek(0);
/// buf.write(b"Hello, World!");
/// assert_eq!(buf.length(), 13);
/// assert_eq!(buf.position(), 13);
///
/// let mut out = [0u8; 5];
/// assert_eq!(buf.read(&mut out, 5, 0, 0), Some(5));
/// assert_eq!(&out, b"Hello");
///
/// // Reading at or past the end signals end of file
/// assert_eq!(buf.read(&mut out, 5, 0, 13), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FileBuffer {
    /// The buffered file content.
    buffer: GrowableBuffer,
    /// Write cursor.
    position: u64,
}

impl FileBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty buffer with storage pre-allocated.
    ///
    /// Use the resource's known length to avoid regrowing while loading.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: GrowableBuffer::with_capacity(capacity),
            position: 0,
        }
    }

    /// Loads existing content.
    ///
    /// Resets the cursor and writes `data` at offset 0. Meant to be called at
    /// most once per buffer; the owning handle tracks whether it has been.
    pub fn init(&mut self, data: &[u8]) {
        self.position = 0;
        self.buffer.write(data, 0, 0, data.len());
    }

    /// Reads up to `length` bytes at `file_offset` into `dest[dest_offset..]`.
    ///
    /// # Returns
    ///
    /// The number of bytes read, or `None` when `file_offset` is at or past
    /// the end of the file. The read is clamped to the logical length.
    pub fn read(
        &self,
        dest: &mut [u8],
        length: usize,
        dest_offset: usize,
        file_offset: u64,
    ) -> Option<usize> {
        let size = self.buffer.size() as u64;
        if file_offset >= size {
            return None;
        }
        // Safe cast: file_offset < size, which is a usize
        #[allow(clippy::cast_possible_truncation)]
        let start = file_offset as usize;
        let count = length.min(self.buffer.size() - start);
        self.buffer.read(dest, start, dest_offset, count);
        Some(count)
    }

    /// Writes `data` at the cursor and advances the cursor past it.
    ///
    /// Writing beyond the current end extends the file; any gap reads back
    /// as zeros.
    ///
    /// # Returns
    ///
    /// The number of bytes written (always equals `data.len()`).
    ///
    /// # Panics
    ///
    /// Panics if the write would end past [`MAX_FILE_LENGTH`]; see
    /// [`fits`](Self::fits).
    pub fn write(&mut self, data: &[u8]) -> usize {
        assert!(
            Self::fits(self.position, data.len() as u64),
            "write past maximum file length"
        );
        // Safe cast: bounded by MAX_FILE_LENGTH
        #[allow(clippy::cast_possible_truncation)]
        let start = self.position as usize;
        self.buffer.write(data, 0, start, data.len());
        self.position += data.len() as u64;
        data.len()
    }

    /// Moves the cursor to an absolute offset.
    ///
    /// Any offset is accepted; a cursor past the end takes effect on the next
    /// write.
    #[inline]
    pub fn seek(&mut self, position: u64) {
        self.position = position;
    }

    /// Sets the file length and clamps the cursor to it.
    ///
    /// Growing fills the new region with zeros.
    ///
    /// # Panics
    ///
    /// Panics if `size` exceeds [`MAX_FILE_LENGTH`].
    pub fn truncate(&mut self, size: u64) {
        assert!(Self::fits(size, 0), "truncate past maximum file length");
        // Safe cast: bounded by MAX_FILE_LENGTH
        #[allow(clippy::cast_possible_truncation)]
        self.buffer.truncate(size as usize);
        self.position = self.position.min(size);
    }

    /// Returns true if `length` bytes starting at `offset` end within
    /// [`MAX_FILE_LENGTH`].
    ///
    /// ```
    /// use repodrive_mount::{FileBuffer, MAX_FILE_LENGTH};
    ///
    /// assert!(FileBuffer::fits(0, MAX_FILE_LENGTH));
    /// assert!(!FileBuffer::fits(MAX_FILE_LENGTH, 1));
    /// assert!(!FileBuffer::fits(u64::MAX - 1, 4));
    /// ```
    #[inline]
    pub fn fits(offset: u64, length: u64) -> bool {
        offset
            .checked_add(length)
            .is_some_and(|end| end <= MAX_FILE_LENGTH)
    }

    /// Logical file length.
    #[inline]
    pub fn length(&self) -> u64 {
        self.buffer.size() as u64
    }

    /// Current cursor.
    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// The file content, for writing back.
    #[inline]
    pub fn contents(&self) -> &[u8] {
        self.buffer.as_slice()
    }
}
