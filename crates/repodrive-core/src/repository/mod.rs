//! The repository collaborator contract.

mod context;
mod memory;
mod resource;

pub use context::{
    DeleteMode, LockInfo, LockType, OFFLINE_PROJECT_NAME, ONLINE_PROJECT_NAME, Permissions,
    Project, RepositoryContext,
};
pub use memory::{ADMIN_USER, MemoryRepository};
pub use resource::{
    Resource, ResourceFilter, ResourceId, ResourceState, ResourceType, UTF8_BOM,
};

use crate::error::RepositoryResult;

/// Operations the bridge needs from the content repository.
///
/// Every call is synchronous and may block on the backing store. Paths are
/// site paths relative to `ctx`, use `/` as separator and start with `/`.
/// Permission and lock checks are the repository's business; callers only
/// react to the errors it raises.
pub trait Repository: Send + Sync {
    /// Reads a resource by path. `Ok(None)` if nothing passes `filter` there.
    fn read_resource(
        &self,
        ctx: &RepositoryContext,
        path: &str,
        filter: ResourceFilter,
    ) -> RepositoryResult<Option<Resource>>;

    /// Reads a resource by its durable id.
    fn read_resource_by_id(
        &self,
        ctx: &RepositoryContext,
        id: ResourceId,
        filter: ResourceFilter,
    ) -> RepositoryResult<Option<Resource>>;

    /// Reads the full content of a file resource.
    fn read_content(&self, ctx: &RepositoryContext, resource: &Resource) -> RepositoryResult<Vec<u8>>;

    /// Replaces the full content of a file resource and returns its new state.
    ///
    /// The resource must be locked by the context user.
    fn write_content(
        &self,
        ctx: &RepositoryContext,
        resource: &Resource,
        content: &[u8],
    ) -> RepositoryResult<Resource>;

    /// Creates a resource. The new resource is locked by the context user.
    fn create_resource(
        &self,
        ctx: &RepositoryContext,
        path: &str,
        resource_type: ResourceType,
        content: &[u8],
    ) -> RepositoryResult<Resource>;

    /// Deletes a resource (recursively for folders).
    fn delete_resource(
        &self,
        ctx: &RepositoryContext,
        path: &str,
        mode: DeleteMode,
    ) -> RepositoryResult<()>;

    /// Moves or renames a resource, keeping its id.
    fn move_resource(
        &self,
        ctx: &RepositoryContext,
        source: &str,
        destination: &str,
    ) -> RepositoryResult<()>;

    /// Lists the immediate children of a folder.
    fn list_children(
        &self,
        ctx: &RepositoryContext,
        folder: &str,
        filter: ResourceFilter,
    ) -> RepositoryResult<Vec<Resource>>;

    /// Locks a resource for the context user.
    fn lock_resource(
        &self,
        ctx: &RepositoryContext,
        path: &str,
        lock_type: LockType,
    ) -> RepositoryResult<()>;

    /// Reports who, if anyone, holds the lock on a resource.
    fn lock_info(&self, ctx: &RepositoryContext, path: &str) -> RepositoryResult<LockInfo>;

    /// Releases the context user's lock. Unlocking an unlocked resource is a no-op.
    fn unlock_resource(&self, ctx: &RepositoryContext, path: &str) -> RepositoryResult<()>;

    /// Checks whether `user` holds `permissions` on `path`.
    fn has_permissions(
        &self,
        ctx: &RepositoryContext,
        user: &str,
        path: &str,
        permissions: Permissions,
    ) -> RepositoryResult<bool>;

    /// Looks up a project by name (case-insensitive).
    fn read_project(&self, ctx: &RepositoryContext, name: &str) -> RepositoryResult<Option<Project>>;
}
