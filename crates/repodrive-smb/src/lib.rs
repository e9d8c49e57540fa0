//! SMB/CIFS disk interface over a content repository.
//!
//! Lets a network file-sharing server expose a hierarchical, versioned
//! content repository as a regular network drive. The server owns sessions
//! and connections and calls into a [`DiskInterface`] for every disk
//! operation; this crate maps those calls onto the [`Repository`] contract.
//!
//! # Data flow
//!
//! ```text
//! protocol server
//!   -> DiskInterface (per call)
//!   -> RepositoryContextProvider (once per session)
//!   -> NetworkFile (per open path)
//!   -> FileBuffer / GrowableBuffer
//!   -> Repository (only on load and flush)
//! ```
//!
//! # Example
//!
//! ```
//! use repodrive_core::{ADMIN_USER, MemoryRepository, Project, RepositoryContext};
//! use repodrive_smb::{
//!     AdminContext, DiskInterface, DomainStrippingTranslator, OpenParams,
//!     RepositoryContextProvider, RepositoryDiskInterface, Session, ShareConfig,
//! };
//! use std::sync::Arc;
//!
//! let repo = Arc::new(MemoryRepository::new());
//! repo.seed_folder("/docs");
//!
//! let admin = AdminContext::new(RepositoryContext::new(ADMIN_USER, Project::offline()));
//! let contexts = RepositoryContextProvider::new(
//!     repo,
//!     admin,
//!     Box::new(DomainStrippingTranslator),
//!     ShareConfig::new("share"),
//! )
//! .unwrap();
//! let disk = RepositoryDiskInterface::new(Arc::new(contexts));
//! let session = Session::new(1, ADMIN_USER);
//!
//! let mut file = disk.create_file(&session, &OpenParams::new(r"\docs\hello.txt")).unwrap();
//! disk.write_file(&session, &mut file, b"hello", 0, 5, 0).unwrap();
//! disk.close_file(&session, &mut file).unwrap();
//!
//! let mut file = disk.open_file(&session, &OpenParams::new(r"\docs\hello.txt")).unwrap();
//! let mut buf = [0u8; 5];
//! assert_eq!(disk.read_file(&session, &mut file, &mut buf, 0, 5, 0).unwrap(), Some(5));
//! assert_eq!(&buf, b"hello");
//! ```
//!
//! [`Repository`]: repodrive_core::Repository

#![warn(clippy::all)]

pub mod config;
mod context;
mod disk_interface;
pub mod error;
mod file_info;
mod logging;
mod network_file;
mod search;

pub use config::{ConfigError, DriveConfig, ShareConfig};
pub use context::{
    AccessDecision, AdminContext, DomainStrippingTranslator, IdentityTranslator,
    RepositoryContextProvider,
};
pub use disk_interface::{DiskInterface, RepositoryDiskInterface};
pub use error::{DiskError, DiskResult, FileError, FileResult};
pub use file_info::{
    FileAttributes, FileInfo, FileStatus, OpenParams, SeekMode, Session, SessionId, SetFlags,
};
pub use logging::LoggingDiskInterface;
pub use network_file::{DIRECTORY_LENGTH, LoadState, NetworkFile};
pub use search::{SearchAttributes, SearchCursor, WildcardPattern};
