//! Growable byte buffer.
//!
//! Physical storage is a zero-initialised `Vec<u8>` whose length is the
//! capacity; the logical size is tracked separately. Every byte between the
//! logical size and the capacity is zero, so growing the logical size never
//! exposes stale data.

/// Byte array that grows to accommodate out-of-range writes.
///
/// # Example
///
/// ```
/// use repodrive_mount::GrowableBuffer;
///
/// let mut buf = GrowableBuffer::with_capacity(4);
/// buf.write(b"abcdef", 0, 2, 6);
/// assert_eq!(buf.size(), 8);
/// assert!(buf.capacity() >= 8);
/// assert_eq!(buf.as_slice(), b"\0\0abcdef");
/// ```
#[derive(Debug, Clone, Default)]
pub struct GrowableBuffer {
    /// Physical storage; `storage.len()` is the capacity.
    storage: Vec<u8>,
    /// Logical size, never above the capacity.
    size: usize,
}

impl GrowableBuffer {
    /// Creates an empty buffer with no storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty buffer with `capacity` bytes of storage.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: vec![0; capacity],
            size: 0,
        }
    }

    /// Copies `len` bytes starting at `src_start` into `dest` at `dest_start`.
    ///
    /// # Panics
    ///
    /// Panics if `src_start + len` exceeds [`size`](Self::size) or the
    /// destination range does not fit in `dest`. Callers clamp first.
    pub fn read(&self, dest: &mut [u8], src_start: usize, dest_start: usize, len: usize) {
        let logical = &self.storage[..self.size];
        dest[dest_start..dest_start + len].copy_from_slice(&logical[src_start..src_start + len]);
    }

    /// Copies `src[src_start..src_start + len]` into the buffer at `dest_start`.
    ///
    /// Grows the capacity as needed and advances the logical size when the
    /// write ends past it. A gap between the old size and `dest_start` reads
    /// back as zeros.
    ///
    /// # Panics
    ///
    /// Panics if `dest_start + len` overflows `usize` or `src` is too short.
    pub fn write(&mut self, src: &[u8], src_start: usize, dest_start: usize, len: usize) {
        let end = dest_start
            .checked_add(len)
            .unwrap_or_else(|| panic!("write end overflows: {dest_start}+{len}"));
        self.ensure_capacity(end);
        self.storage[dest_start..end].copy_from_slice(&src[src_start..src_start + len]);
        if end > self.size {
            self.size = end;
        }
    }

    /// Sets the logical size.
    ///
    /// Growing exposes zero bytes; shrinking clears the excluded region so the
    /// zero invariant above the logical size holds.
    pub fn truncate(&mut self, new_size: usize) {
        self.ensure_capacity(new_size);
        if new_size > self.size {
            self.storage[self.size..new_size].fill(0);
        } else if new_size < self.size {
            self.storage[new_size..self.size].fill(0);
        }
        self.size = new_size;
    }

    /// Logical size in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Physical capacity in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// The logical contents.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.storage[..self.size]
    }

    /// Grows storage by factors of 1.5 until it holds `required` bytes.
    fn ensure_capacity(&mut self, required: usize) {
        let mut capacity = self.storage.len();
        if capacity >= required {
            return;
        }
        if capacity == 0 {
            capacity = required;
        }
        while capacity < required {
            capacity = (capacity.saturating_mul(3) / 2).max(capacity.saturating_add(1));
        }
        self.storage.resize(capacity, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_empty() {
        let buf = GrowableBuffer::new();
        assert_eq!(buf.size(), 0);
        assert_eq!(buf.capacity(), 0);
        assert!(buf.as_slice().is_empty());
    }

    #[test]
    fn test_capacity_hint() {
        let buf = GrowableBuffer::with_capacity(64);
        assert_eq!(buf.size(), 0);
        assert_eq!(buf.capacity(), 64);
    }

    #[test]
    fn test_empty_buffer_grows_to_fit() {
        let mut buf = GrowableBuffer::new();
        buf.write(b"hello", 0, 0, 5);
        assert_eq!(buf.capacity(), 5);
        assert_eq!(buf.as_slice(), b"hello");
    }

    #[test]
    fn test_geometric_growth() {
        let mut buf = GrowableBuffer::with_capacity(10);
        buf.write(&[1; 11], 0, 0, 11);
        // 10 * 1.5
        assert_eq!(buf.capacity(), 15);

        let mut buf = GrowableBuffer::with_capacity(10);
        buf.write(&[1; 30], 0, 0, 30);
        // 10 -> 15 -> 22 -> 33
        assert_eq!(buf.capacity(), 33);
    }

    #[test]
    fn test_write_sub_range() {
        let mut buf = GrowableBuffer::new();
        buf.write(b"xxhelloxx", 2, 0, 5);
        assert_eq!(buf.as_slice(), b"hello");
    }

    #[test]
    fn test_write_inside_does_not_shrink() {
        let mut buf = GrowableBuffer::new();
        buf.write(b"hello world", 0, 0, 11);
        buf.write(b"J", 0, 0, 1);
        assert_eq!(buf.size(), 11);
        assert_eq!(buf.as_slice(), b"Jello world");
    }

    #[test]
    fn test_read_into_offset() {
        let mut buf = GrowableBuffer::new();
        buf.write(b"abcdef", 0, 0, 6);
        let mut dest = [b'.'; 6];
        buf.read(&mut dest, 2, 1, 3);
        assert_eq!(&dest, b".cde..");
    }

    #[test]
    #[should_panic]
    fn test_read_past_size_panics() {
        let mut buf = GrowableBuffer::with_capacity(100);
        buf.write(b"abc", 0, 0, 3);
        let mut dest = [0u8; 10];
        // Within capacity but past the logical size
        buf.read(&mut dest, 0, 0, 10);
    }

    #[test]
    #[should_panic(expected = "write end overflows")]
    fn test_write_end_overflow_panics() {
        let mut buf = GrowableBuffer::with_capacity(4);
        buf.write(b"ab", 0, usize::MAX, 2);
    }

    #[test]
    fn test_truncate_shrink_clears_tail() {
        let mut buf = GrowableBuffer::new();
        buf.write(b"hello world", 0, 0, 11);
        buf.truncate(5);
        assert_eq!(buf.as_slice(), b"hello");
        // Re-growing must not resurrect the old bytes
        buf.truncate(11);
        assert_eq!(buf.as_slice(), b"hello\0\0\0\0\0\0");
    }

    #[test]
    fn test_truncate_to_zero() {
        let mut buf = GrowableBuffer::new();
        buf.write(b"data", 0, 0, 4);
        buf.truncate(0);
        assert_eq!(buf.size(), 0);
        assert_eq!(buf.capacity(), 4);
    }

    #[test]
    fn test_write_after_shrink_leaves_zero_gap() {
        let mut buf = GrowableBuffer::new();
        buf.write(b"abcdefgh", 0, 0, 8);
        buf.truncate(2);
        buf.write(b"Z", 0, 6, 1);
        assert_eq!(buf.as_slice(), b"ab\0\0\0\0Z");
    }
}
