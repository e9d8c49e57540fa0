//! Content repository contract for repodrive.
//!
//! The SMB bridge never talks to a concrete store directly. Everything it
//! needs from the hierarchical content repository is expressed by the
//! [`Repository`] trait: path and id lookups with a visibility filter, whole
//! document reads and write-backs, create/delete/move, child listings,
//! resource locks, permission checks and project scoping.
//!
//! [`MemoryRepository`] is a complete implementation of that contract kept in
//! process memory. It backs the test suites and the `repodrive` CLI.

pub mod error;
pub mod repository;

pub use error::{RepositoryError, RepositoryResult};
pub use repository::{
    ADMIN_USER, DeleteMode, LockInfo, LockType, MemoryRepository, Permissions, Project, Repository,
    RepositoryContext, Resource, ResourceFilter, ResourceId, ResourceState, ResourceType,
    UTF8_BOM,
};
