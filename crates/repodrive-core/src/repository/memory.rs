//! In-memory implementation of the repository contract.
//!
//! Resources are keyed by absolute path in a `BTreeMap`, so every subtree is
//! a contiguous key range. Content lives in a separate table keyed by content
//! id; siblings are entries that share one content id.

use super::context::{DeleteMode, LockInfo, LockType, Permissions, Project, RepositoryContext};
use super::resource::{
    Resource, ResourceFilter, ResourceId, ResourceState, ResourceType, UTF8_BOM,
};
use super::Repository;
use crate::error::{RepositoryError, RepositoryResult};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::SystemTime;
use tracing::debug;
use uuid::Uuid;

/// User with every permission on a fresh repository.
pub const ADMIN_USER: &str = "Admin";

#[derive(Debug)]
struct Entry {
    id: ResourceId,
    resource_type: ResourceType,
    state: ResourceState,
    /// Key into the content table; `None` for folders.
    content_id: Option<Uuid>,
    date_created: SystemTime,
    date_last_modified: SystemTime,
    date_content: SystemTime,
}

impl Entry {
    fn new(resource_type: ResourceType, state: ResourceState) -> Self {
        let now = SystemTime::now();
        Self {
            id: ResourceId::new(),
            resource_type,
            state,
            content_id: (!resource_type.is_folder()).then(Uuid::new_v4),
            date_created: now,
            date_last_modified: now,
            date_content: now,
        }
    }

    fn touch(&mut self) {
        let now = SystemTime::now();
        self.date_last_modified = now;
        self.date_content = now;
        if self.state == ResourceState::Unchanged {
            self.state = ResourceState::Changed;
        }
    }
}

#[derive(Debug)]
struct Grant {
    user: String,
    prefix: String,
    permissions: Permissions,
}

#[derive(Debug)]
struct State {
    entries: BTreeMap<String, Entry>,
    paths: HashMap<ResourceId, String>,
    contents: HashMap<Uuid, Vec<u8>>,
    locks: HashMap<ResourceId, (String, LockType)>,
    grants: Vec<Grant>,
    admins: HashSet<String>,
    projects: Vec<Project>,
}

/// Repository kept entirely in process memory.
///
/// Mirrors the semantics the bridge relies on from a real content store:
/// projects with a read-only published project, lock-before-write, per-user
/// permissions, sibling-aware deletion and pending-delete states.
///
/// ```
/// use repodrive_core::{MemoryRepository, Project, Repository, RepositoryContext, ResourceFilter};
///
/// let repo = MemoryRepository::new();
/// repo.seed_file("/docs/readme.txt", b"hello");
///
/// let ctx = RepositoryContext::new("Admin", Project::offline());
/// let resource = repo
///     .read_resource(&ctx, "/docs/readme.txt", ResourceFilter::VisibleNotDeleted)
///     .unwrap()
///     .unwrap();
/// assert_eq!(repo.read_content(&ctx, &resource).unwrap(), b"hello");
/// ```
#[derive(Debug)]
pub struct MemoryRepository {
    state: RwLock<State>,
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRepository {
    /// Creates a repository holding only the root folder.
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        let root = Entry::new(ResourceType::Folder, ResourceState::Unchanged);
        let mut paths = HashMap::new();
        paths.insert(root.id, "/".to_string());
        entries.insert("/".to_string(), root);

        Self {
            state: RwLock::new(State {
                entries,
                paths,
                contents: HashMap::new(),
                locks: HashMap::new(),
                grants: Vec::new(),
                admins: HashSet::from([ADMIN_USER.to_string()]),
                projects: vec![Project::online(), Project::offline()],
            }),
        }
    }

    /// Adds a folder (and any missing parents) as published content.
    pub fn seed_folder(&self, path: &str) -> ResourceId {
        let mut state = self.state.write();
        state.seed(path, ResourceType::Folder, &[])
    }

    /// Adds a file (and any missing parents) as published content.
    pub fn seed_file(&self, path: &str, content: &[u8]) -> ResourceId {
        let name = path.trim_end_matches('/').rsplit('/').next().unwrap_or_default();
        let resource_type = ResourceType::default_for_name(name);
        let mut state = self.state.write();
        state.seed(path, resource_type, content)
    }

    /// Grants `permissions` to `user` on `prefix` and everything below it.
    pub fn grant(&self, user: &str, prefix: &str, permissions: Permissions) {
        self.state.write().grants.push(Grant {
            user: user.to_string(),
            prefix: prefix.trim_end_matches('/').to_string(),
            permissions,
        });
    }

    /// Gives `user` every permission everywhere.
    pub fn add_admin(&self, user: &str) {
        self.state.write().admins.insert(user.to_string());
    }

    /// Publishes the working state: pending deletions disappear, everything
    /// else becomes unchanged, and all locks are released.
    pub fn publish(&self) {
        let mut state = self.state.write();
        let deleted: Vec<String> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.state == ResourceState::Deleted)
            .map(|(path, _)| path.clone())
            .collect();
        for path in deleted {
            state.remove_entry(&path);
        }
        for entry in state.entries.values_mut() {
            entry.state = ResourceState::Unchanged;
        }
        state.locks.clear();
        debug!(resources = state.entries.len(), "Published repository");
    }

    /// Creates `destination` as a sibling sharing the content of `source`.
    pub fn create_sibling(
        &self,
        ctx: &RepositoryContext,
        source: &str,
        destination: &str,
    ) -> RepositoryResult<Resource> {
        let source_abs = normalize(&ctx.add_site_root(source))?;
        let dest_abs = normalize(&ctx.add_site_root(destination))?;
        let mut state = self.state.write();
        state.require_writable(ctx, destination)?;

        let (resource_type, content_id) = {
            let entry = state
                .visible(ctx, &source_abs, ResourceFilter::VisibleNotDeleted)
                .ok_or_else(|| not_found(source))?;
            let content_id = entry.content_id.ok_or_else(|| RepositoryError::NotAFile {
                path: source.to_string(),
            })?;
            (entry.resource_type, content_id)
        };
        state.require_parent_folder(ctx, &dest_abs, destination)?;
        state.require_vacant(ctx, &dest_abs, destination)?;

        let mut entry = Entry::new(resource_type, ResourceState::New);
        entry.content_id = Some(content_id);
        state.insert_entry(dest_abs.clone(), entry);
        debug!(source = %source_abs, destination = %dest_abs, "Created sibling");
        state.present(ctx, &dest_abs).ok_or_else(|| not_found(destination))
    }

    /// Raw stored content of a file by absolute path, bypassing all checks.
    pub fn raw_content(&self, path: &str) -> Option<Vec<u8>> {
        let state = self.state.read();
        let content_id = state.entries.get(path)?.content_id?;
        state.contents.get(&content_id).cloned()
    }

    /// Publication state of a resource by absolute path, bypassing all checks.
    pub fn raw_state(&self, path: &str) -> Option<ResourceState> {
        self.state.read().entries.get(path).map(|entry| entry.state)
    }
}

impl State {
    fn seed(&mut self, path: &str, resource_type: ResourceType, content: &[u8]) -> ResourceId {
        let path = if path.len() > 1 {
            path.trim_end_matches('/')
        } else {
            path
        };
        if let Some(parent) = parent_of(path)
            && !self.entries.contains_key(parent)
        {
            self.seed(parent, ResourceType::Folder, &[]);
        }
        if let Some(existing) = self.entries.get(path) {
            let id = existing.id;
            if let Some(content_id) = existing.content_id {
                self.contents.insert(content_id, content.to_vec());
            }
            return id;
        }
        let entry = Entry::new(resource_type, ResourceState::Unchanged);
        let id = entry.id;
        if let Some(content_id) = entry.content_id {
            self.contents.insert(content_id, content.to_vec());
        }
        self.insert_entry(path.to_string(), entry);
        id
    }

    fn insert_entry(&mut self, path: String, entry: Entry) {
        self.paths.insert(entry.id, path.clone());
        self.entries.insert(path, entry);
    }

    /// Removes an entry without leaving a pending-delete marker.
    fn remove_entry(&mut self, path: &str) {
        let Some(entry) = self.entries.remove(path) else {
            return;
        };
        self.paths.remove(&entry.id);
        self.locks.remove(&entry.id);
        if let Some(content_id) = entry.content_id {
            let shared = self
                .entries
                .values()
                .any(|other| other.content_id == Some(content_id));
            if !shared {
                self.contents.remove(&content_id);
            }
        }
    }

    /// Absolute paths of `path` and everything below it, parents first.
    fn subtree(&self, path: &str) -> Vec<String> {
        let prefix = child_prefix(path);
        let mut result = vec![path.to_string()];
        result.extend(
            self.entries
                .range(prefix.clone()..)
                .take_while(|(key, _)| key.starts_with(&prefix))
                .map(|(key, _)| key.clone()),
        );
        result
    }

    fn visible(
        &self,
        ctx: &RepositoryContext,
        path: &str,
        filter: ResourceFilter,
    ) -> Option<&Entry> {
        let entry = self.entries.get(path)?;
        if !filter.accepts(entry.state) {
            return None;
        }
        // Never-published resources do not exist online
        if ctx.project().online && entry.state == ResourceState::New {
            return None;
        }
        Some(entry)
    }

    fn permissions_of(&self, user: &str, path: &str) -> Permissions {
        if self.admins.contains(user) {
            return Permissions::all();
        }
        self.grants
            .iter()
            .filter(|grant| grant.user == user && is_within(path, &grant.prefix))
            .fold(Permissions::empty(), |acc, grant| acc | grant.permissions)
    }

    fn require(
        &self,
        ctx: &RepositoryContext,
        abs: &str,
        site_path: &str,
        permissions: Permissions,
    ) -> RepositoryResult<()> {
        if self.permissions_of(ctx.user(), abs).contains(permissions) {
            Ok(())
        } else {
            Err(RepositoryError::PermissionDenied {
                path: site_path.to_string(),
                user: ctx.user().to_string(),
                permissions,
            })
        }
    }

    fn require_writable(&self, ctx: &RepositoryContext, site_path: &str) -> RepositoryResult<()> {
        if ctx.project().online {
            return Err(RepositoryError::WriteInOnlineProject {
                path: site_path.to_string(),
            });
        }
        Ok(())
    }

    fn require_lock(
        &self,
        ctx: &RepositoryContext,
        id: ResourceId,
        site_path: &str,
    ) -> RepositoryResult<()> {
        match self.locks.get(&id) {
            Some((owner, _)) if owner == ctx.user() => Ok(()),
            Some((owner, _)) => Err(RepositoryError::Locked {
                path: site_path.to_string(),
                owner: owner.clone(),
            }),
            None => Err(RepositoryError::NotLocked {
                path: site_path.to_string(),
            }),
        }
    }

    fn require_parent_folder(
        &self,
        ctx: &RepositoryContext,
        abs: &str,
        site_path: &str,
    ) -> RepositoryResult<()> {
        let parent = parent_of(abs).ok_or_else(|| RepositoryError::AlreadyExists {
            path: site_path.to_string(),
        })?;
        let parent_site = parent_of(site_path).unwrap_or("/");
        let entry = self
            .visible(ctx, parent, ResourceFilter::VisibleNotDeleted)
            .ok_or_else(|| not_found(parent_site))?;
        if !entry.resource_type.is_folder() {
            return Err(RepositoryError::NotAFolder {
                path: parent_site.to_string(),
            });
        }
        self.require(ctx, parent, parent_site, Permissions::WRITE)
    }

    /// Fails if a visible resource occupies `abs`; clears a pending-delete one.
    fn require_vacant(
        &mut self,
        ctx: &RepositoryContext,
        abs: &str,
        site_path: &str,
    ) -> RepositoryResult<()> {
        if self
            .visible(ctx, abs, ResourceFilter::VisibleNotDeleted)
            .is_some()
        {
            return Err(RepositoryError::AlreadyExists {
                path: site_path.to_string(),
            });
        }
        if self.entries.contains_key(abs) {
            for path in self.subtree(abs).into_iter().rev() {
                self.remove_entry(&path);
            }
        }
        Ok(())
    }

    fn find_by_id(
        &self,
        ctx: &RepositoryContext,
        id: ResourceId,
        filter: ResourceFilter,
    ) -> Option<(&str, &Entry)> {
        let path = self.paths.get(&id)?;
        let entry = self.visible(ctx, path, filter)?;
        Some((path.as_str(), entry))
    }

    fn content_len(&self, entry: &Entry) -> u64 {
        entry
            .content_id
            .and_then(|id| self.contents.get(&id))
            .map_or(0, |content| content.len() as u64)
    }

    fn bom_applies(ctx: &RepositoryContext, entry: &Entry, content: &[u8]) -> bool {
        ctx.add_bom() && entry.resource_type.is_plain_text() && !content.starts_with(&UTF8_BOM)
    }

    /// Builds the context's view of the entry at `abs`.
    fn present(&self, ctx: &RepositoryContext, abs: &str) -> Option<Resource> {
        let entry = self.entries.get(abs)?;
        let path = ctx.remove_site_root(abs)?;
        let mut length = self.content_len(entry);
        if let Some(content) = entry.content_id.and_then(|id| self.contents.get(&id))
            && Self::bom_applies(ctx, entry, content)
        {
            length += UTF8_BOM.len() as u64;
        }
        Some(Resource {
            id: entry.id,
            path,
            resource_type: entry.resource_type,
            state: entry.state,
            length,
            date_created: entry.date_created,
            date_last_modified: entry.date_last_modified,
            date_content: entry.date_content,
        })
    }
}

impl Repository for MemoryRepository {
    fn read_resource(
        &self,
        ctx: &RepositoryContext,
        path: &str,
        filter: ResourceFilter,
    ) -> RepositoryResult<Option<Resource>> {
        let abs = normalize(&ctx.add_site_root(path))?;
        let state = self.state.read();
        if state.visible(ctx, &abs, filter).is_none() {
            return Ok(None);
        }
        state.require(ctx, &abs, path, Permissions::VIEW)?;
        Ok(state.present(ctx, &abs))
    }

    fn read_resource_by_id(
        &self,
        ctx: &RepositoryContext,
        id: ResourceId,
        filter: ResourceFilter,
    ) -> RepositoryResult<Option<Resource>> {
        let state = self.state.read();
        let Some((abs, _)) = state.find_by_id(ctx, id, filter) else {
            return Ok(None);
        };
        let Some(resource) = state.present(ctx, abs) else {
            return Ok(None);
        };
        state.require(ctx, abs, &resource.path, Permissions::VIEW)?;
        Ok(Some(resource))
    }

    fn read_content(&self, ctx: &RepositoryContext, resource: &Resource) -> RepositoryResult<Vec<u8>> {
        let state = self.state.read();
        let (abs, entry) = state
            .find_by_id(ctx, resource.id, ResourceFilter::VisibleNotDeleted)
            .ok_or_else(|| not_found(&resource.path))?;
        state.require(ctx, abs, &resource.path, Permissions::READ)?;
        let content_id = entry.content_id.ok_or_else(|| RepositoryError::NotAFile {
            path: resource.path.clone(),
        })?;
        let stored = state.contents.get(&content_id).map_or(&[][..], Vec::as_slice);
        if State::bom_applies(ctx, entry, stored) {
            let mut content = Vec::with_capacity(stored.len() + UTF8_BOM.len());
            content.extend_from_slice(&UTF8_BOM);
            content.extend_from_slice(stored);
            return Ok(content);
        }
        Ok(stored.to_vec())
    }

    fn write_content(
        &self,
        ctx: &RepositoryContext,
        resource: &Resource,
        content: &[u8],
    ) -> RepositoryResult<Resource> {
        let mut state = self.state.write();
        state.require_writable(ctx, &resource.path)?;
        let (abs, content_id, strip_bom) = {
            let (abs, entry) = state
                .find_by_id(ctx, resource.id, ResourceFilter::VisibleNotDeleted)
                .ok_or_else(|| not_found(&resource.path))?;
            state.require(ctx, abs, &resource.path, Permissions::WRITE)?;
            state.require_lock(ctx, entry.id, &resource.path)?;
            let content_id = entry.content_id.ok_or_else(|| RepositoryError::NotAFile {
                path: resource.path.clone(),
            })?;
            let strip_bom = ctx.add_bom() && entry.resource_type.is_plain_text();
            (abs.to_string(), content_id, strip_bom)
        };

        let stored = if strip_bom {
            content.strip_prefix(&UTF8_BOM[..]).unwrap_or(content)
        } else {
            content
        };
        state.contents.insert(content_id, stored.to_vec());
        if let Some(entry) = state.entries.get_mut(&abs) {
            entry.touch();
        }
        debug!(path = %abs, size = stored.len(), "Wrote resource content");
        state.present(ctx, &abs).ok_or_else(|| not_found(&resource.path))
    }

    fn create_resource(
        &self,
        ctx: &RepositoryContext,
        path: &str,
        resource_type: ResourceType,
        content: &[u8],
    ) -> RepositoryResult<Resource> {
        let abs = normalize(&ctx.add_site_root(path))?;
        let mut state = self.state.write();
        state.require_writable(ctx, path)?;
        state.require_parent_folder(ctx, &abs, path)?;
        state.require_vacant(ctx, &abs, path)?;

        let entry = Entry::new(resource_type, ResourceState::New);
        let id = entry.id;
        if let Some(content_id) = entry.content_id {
            let stored = if ctx.add_bom() && resource_type.is_plain_text() {
                content.strip_prefix(&UTF8_BOM[..]).unwrap_or(content)
            } else {
                content
            };
            state.contents.insert(content_id, stored.to_vec());
        }
        state.insert_entry(abs.clone(), entry);
        state
            .locks
            .insert(id, (ctx.user().to_string(), LockType::Exclusive));
        debug!(path = %abs, kind = resource_type.name(), "Created resource");
        state.present(ctx, &abs).ok_or_else(|| not_found(path))
    }

    fn delete_resource(
        &self,
        ctx: &RepositoryContext,
        path: &str,
        mode: DeleteMode,
    ) -> RepositoryResult<()> {
        let abs = normalize(&ctx.add_site_root(path))?;
        let mut state = self.state.write();
        state.require_writable(ctx, path)?;
        let (id, content_id) = {
            let entry = state
                .visible(ctx, &abs, ResourceFilter::VisibleNotDeleted)
                .ok_or_else(|| not_found(path))?;
            (entry.id, entry.content_id)
        };
        if abs == "/" {
            return Err(RepositoryError::InvalidPath {
                path: path.to_string(),
                reason: "the root folder cannot be deleted".to_string(),
            });
        }
        state.require(ctx, &abs, path, Permissions::WRITE)?;
        state.require_lock(ctx, id, path)?;

        let mut targets = state.subtree(&abs);
        if mode == DeleteMode::DeleteSiblings
            && let Some(content_id) = content_id
        {
            targets.extend(
                state
                    .entries
                    .iter()
                    .filter(|(key, entry)| {
                        entry.content_id == Some(content_id) && key.as_str() != abs
                    })
                    .map(|(key, _)| key.clone()),
            );
        }

        // Deepest first, so a folder sees which children survived as markers
        targets.sort_by(|a, b| b.cmp(a));
        for target in &targets {
            let (is_new, target_id) = match state.entries.get(target) {
                Some(entry) => (entry.state == ResourceState::New, entry.id),
                None => continue,
            };
            let has_children = state.subtree(target).len() > 1;
            if is_new && !has_children {
                state.remove_entry(target);
            } else {
                if let Some(entry) = state.entries.get_mut(target) {
                    entry.state = ResourceState::Deleted;
                }
                state.locks.remove(&target_id);
            }
        }
        debug!(path = %abs, count = targets.len(), ?mode, "Deleted resource");
        Ok(())
    }

    fn move_resource(
        &self,
        ctx: &RepositoryContext,
        source: &str,
        destination: &str,
    ) -> RepositoryResult<()> {
        let source_abs = normalize(&ctx.add_site_root(source))?;
        let dest_abs = normalize(&ctx.add_site_root(destination))?;
        let mut state = self.state.write();
        state.require_writable(ctx, source)?;
        let id = state
            .visible(ctx, &source_abs, ResourceFilter::VisibleNotDeleted)
            .ok_or_else(|| not_found(source))?
            .id;
        if source_abs == dest_abs {
            return Ok(());
        }
        if source_abs == "/" || is_within(&dest_abs, &source_abs) {
            return Err(RepositoryError::InvalidPath {
                path: destination.to_string(),
                reason: format!("cannot move {source} into itself"),
            });
        }
        state.require(ctx, &source_abs, source, Permissions::WRITE)?;
        state.require_lock(ctx, id, source)?;
        state.require_parent_folder(ctx, &dest_abs, destination)?;
        state.require_vacant(ctx, &dest_abs, destination)?;

        for old_path in state.subtree(&source_abs) {
            let Some(mut entry) = state.entries.remove(&old_path) else {
                continue;
            };
            let new_path = format!("{dest_abs}{}", &old_path[source_abs.len()..]);
            if entry.state != ResourceState::New {
                entry.state = ResourceState::Changed;
            }
            if old_path == source_abs {
                entry.date_last_modified = SystemTime::now();
            }
            state.insert_entry(new_path, entry);
        }
        debug!(source = %source_abs, destination = %dest_abs, "Moved resource");
        Ok(())
    }

    fn list_children(
        &self,
        ctx: &RepositoryContext,
        folder: &str,
        filter: ResourceFilter,
    ) -> RepositoryResult<Vec<Resource>> {
        let abs = normalize(&ctx.add_site_root(folder))?;
        let state = self.state.read();
        let entry = state
            .visible(ctx, &abs, ResourceFilter::VisibleNotDeleted)
            .ok_or_else(|| not_found(folder))?;
        if !entry.resource_type.is_folder() {
            return Err(RepositoryError::NotAFolder {
                path: folder.to_string(),
            });
        }
        state.require(ctx, &abs, folder, Permissions::VIEW)?;

        let prefix = child_prefix(&abs);
        let children = state
            .entries
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .filter(|(key, _)| !key[prefix.len()..].contains('/'))
            .filter(|(key, _)| state.visible(ctx, key, filter).is_some())
            .filter(|(key, _)| {
                state
                    .permissions_of(ctx.user(), key)
                    .contains(Permissions::VIEW)
            })
            .filter_map(|(key, _)| state.present(ctx, key))
            .collect();
        Ok(children)
    }

    fn lock_resource(
        &self,
        ctx: &RepositoryContext,
        path: &str,
        lock_type: LockType,
    ) -> RepositoryResult<()> {
        let abs = normalize(&ctx.add_site_root(path))?;
        let mut state = self.state.write();
        state.require_writable(ctx, path)?;
        let id = state
            .visible(ctx, &abs, ResourceFilter::VisibleNotDeleted)
            .ok_or_else(|| not_found(path))?
            .id;
        state.require(ctx, &abs, path, Permissions::WRITE)?;
        if let Some((owner, _)) = state.locks.get(&id)
            && owner != ctx.user()
        {
            return Err(RepositoryError::Locked {
                path: path.to_string(),
                owner: owner.clone(),
            });
        }
        state.locks.insert(id, (ctx.user().to_string(), lock_type));
        debug!(path = %abs, user = ctx.user(), ?lock_type, "Locked resource");
        Ok(())
    }

    fn lock_info(&self, ctx: &RepositoryContext, path: &str) -> RepositoryResult<LockInfo> {
        let abs = normalize(&ctx.add_site_root(path))?;
        let state = self.state.read();
        let id = state
            .visible(ctx, &abs, ResourceFilter::VisibleNotDeleted)
            .ok_or_else(|| not_found(path))?
            .id;
        Ok(state
            .locks
            .get(&id)
            .map_or_else(LockInfo::unlocked, |(owner, lock_type)| LockInfo {
                owner: Some(owner.clone()),
                lock_type: Some(*lock_type),
            }))
    }

    fn unlock_resource(&self, ctx: &RepositoryContext, path: &str) -> RepositoryResult<()> {
        let abs = normalize(&ctx.add_site_root(path))?;
        let mut state = self.state.write();
        let id = state
            .visible(ctx, &abs, ResourceFilter::All)
            .ok_or_else(|| not_found(path))?
            .id;
        match state.locks.get(&id) {
            Some((owner, _)) if owner != ctx.user() => Err(RepositoryError::Locked {
                path: path.to_string(),
                owner: owner.clone(),
            }),
            Some(_) => {
                state.locks.remove(&id);
                debug!(path = %abs, user = ctx.user(), "Unlocked resource");
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn has_permissions(
        &self,
        ctx: &RepositoryContext,
        user: &str,
        path: &str,
        permissions: Permissions,
    ) -> RepositoryResult<bool> {
        let abs = normalize(&ctx.add_site_root(path))?;
        let state = self.state.read();
        if !state.entries.contains_key(&abs) {
            return Err(not_found(path));
        }
        Ok(state.permissions_of(user, &abs).contains(permissions))
    }

    fn read_project(&self, _ctx: &RepositoryContext, name: &str) -> RepositoryResult<Option<Project>> {
        let state = self.state.read();
        Ok(state
            .projects
            .iter()
            .find(|project| project.name.eq_ignore_ascii_case(name))
            .cloned())
    }
}

fn not_found(path: &str) -> RepositoryError {
    RepositoryError::NotFound {
        path: path.to_string(),
    }
}

/// Validates an absolute path and strips a trailing separator.
fn normalize(path: &str) -> RepositoryResult<String> {
    let invalid = |reason: &str| RepositoryError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };
    if !path.starts_with('/') {
        return Err(invalid("path must start with '/'"));
    }
    if path == "/" {
        return Ok(path.to_string());
    }
    let trimmed = path.trim_end_matches('/');
    for segment in trimmed[1..].split('/') {
        match segment {
            "" => return Err(invalid("empty path segment")),
            "." | ".." => return Err(invalid("relative path segment")),
            _ => {}
        }
    }
    Ok(trimmed.to_string())
}

fn parent_of(path: &str) -> Option<&str> {
    if path == "/" {
        return None;
    }
    match path.rsplit_once('/') {
        Some(("", _)) => Some("/"),
        Some((parent, _)) => Some(parent),
        None => None,
    }
}

/// Key prefix shared by every descendant of `folder`.
fn child_prefix(folder: &str) -> String {
    if folder == "/" {
        "/".to_string()
    } else {
        format!("{folder}/")
    }
}

/// Returns true if `path` is `ancestor` or lies below it.
fn is_within(path: &str, ancestor: &str) -> bool {
    if ancestor.is_empty() || ancestor == "/" {
        return true;
    }
    path == ancestor
        || path
            .strip_prefix(ancestor)
            .is_some_and(|rest| rest.starts_with('/'))
}
