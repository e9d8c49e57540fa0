//! Shared building blocks for repodrive share backends.
//!
//! # Components
//!
//! - [`GrowableBuffer`] - byte array with a logical size distinct from its
//!   physical capacity, growing geometrically on out-of-range writes
//! - [`FileBuffer`] - per-handle file content with a write cursor
//! - [`ErrorCategory`] - protocol-level classification of repository errors
//! - [`path_mapper`] - protocol path to repository path translation
//! - [`HandleTable`] - concurrent keyed table for per-session state
//!
//! # Why a file buffer?
//!
//! The content repository only knows whole documents: read everything,
//! replace everything. Network file protocols expect random-access reads,
//! partial writes and truncation. [`FileBuffer`] bridges the two with a
//! read-modify-write pattern:
//! 1. On first access: the full document is loaded into memory
//! 2. On write/truncate: the in-memory copy is modified
//! 3. On flush/close: the whole buffer is written back
//!
//! # Example
//!
//! ```
//! use repodrive_mount::{FileBuffer, HandleTable};
//!
//! let mut buf = FileBuffer::new();
//! buf.init(b"Hello, World!");
//! buf.seek(7);
//! buf.write(b"Rust!");
//!
//! let mut out = [0u8; 12];
//! assert_eq!(buf.read(&mut out, 12, 0, 0), Some(12));
//! assert_eq!(&out, b"Hello, Rust!");
//!
//! let sessions: HandleTable<u64, String> = HandleTable::new();
//! let user = sessions.get_or_insert_with(7, || "editor".to_string());
//! assert_eq!(user, "editor");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error_category;
mod file_buffer;
mod growable_buffer;
mod handle_table;
pub mod path_mapper;

pub use error_category::ErrorCategory;
pub use file_buffer::{FileBuffer, MAX_FILE_LENGTH};
pub use growable_buffer::GrowableBuffer;
pub use handle_table::HandleTable;
