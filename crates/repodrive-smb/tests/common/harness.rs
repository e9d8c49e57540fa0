//! Test drive harness for disk-interface integration tests.
//!
//! Provides a `TestDrive` that wires a seeded in-memory repository through
//! the context provider into a `RepositoryDiskInterface`, with a counting
//! repository wrapper so tests can observe when content is loaded and
//! written back.

#![allow(dead_code)]

use repodrive_core::{
    ADMIN_USER, DeleteMode, LockInfo, LockType, MemoryRepository, Permissions, Project,
    Repository, RepositoryContext, RepositoryResult, Resource, ResourceFilter, ResourceId,
    ResourceType,
};
use repodrive_smb::{
    AdminContext, DiskInterface, DomainStrippingTranslator, FileInfo, NetworkFile, OpenParams,
    RepositoryContextProvider, RepositoryDiskInterface, SearchAttributes, Session, ShareConfig,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Content of the seeded readme.
pub const README: &[u8] = b"hello world";

/// Read size of [`TestDrive::get`], small enough to span several reads.
const CHUNK: usize = 4;

/// Share root used by [`TestDrive::rooted`].
pub const SITE_ROOT: &str = "/sites/default";

/// Repository wrapper that counts content transfers.
pub struct CountingRepository {
    inner: Arc<MemoryRepository>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl CountingRepository {
    pub fn new(inner: Arc<MemoryRepository>) -> Self {
        Self {
            inner,
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of `read_content` calls so far.
    pub fn content_reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `write_content` calls so far.
    pub fn content_writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl Repository for CountingRepository {
    fn read_resource(
        &self,
        ctx: &RepositoryContext,
        path: &str,
        filter: ResourceFilter,
    ) -> RepositoryResult<Option<Resource>> {
        self.inner.read_resource(ctx, path, filter)
    }

    fn read_resource_by_id(
        &self,
        ctx: &RepositoryContext,
        id: ResourceId,
        filter: ResourceFilter,
    ) -> RepositoryResult<Option<Resource>> {
        self.inner.read_resource_by_id(ctx, id, filter)
    }

    fn read_content(&self, ctx: &RepositoryContext, resource: &Resource) -> RepositoryResult<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read_content(ctx, resource)
    }

    fn write_content(
        &self,
        ctx: &RepositoryContext,
        resource: &Resource,
        content: &[u8],
    ) -> RepositoryResult<Resource> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.write_content(ctx, resource, content)
    }

    fn create_resource(
        &self,
        ctx: &RepositoryContext,
        path: &str,
        resource_type: ResourceType,
        content: &[u8],
    ) -> RepositoryResult<Resource> {
        self.inner.create_resource(ctx, path, resource_type, content)
    }

    fn delete_resource(
        &self,
        ctx: &RepositoryContext,
        path: &str,
        mode: DeleteMode,
    ) -> RepositoryResult<()> {
        self.inner.delete_resource(ctx, path, mode)
    }

    fn move_resource(
        &self,
        ctx: &RepositoryContext,
        source: &str,
        destination: &str,
    ) -> RepositoryResult<()> {
        self.inner.move_resource(ctx, source, destination)
    }

    fn list_children(
        &self,
        ctx: &RepositoryContext,
        folder: &str,
        filter: ResourceFilter,
    ) -> RepositoryResult<Vec<Resource>> {
        self.inner.list_children(ctx, folder, filter)
    }

    fn lock_resource(
        &self,
        ctx: &RepositoryContext,
        path: &str,
        lock_type: LockType,
    ) -> RepositoryResult<()> {
        self.inner.lock_resource(ctx, path, lock_type)
    }

    fn lock_info(&self, ctx: &RepositoryContext, path: &str) -> RepositoryResult<LockInfo> {
        self.inner.lock_info(ctx, path)
    }

    fn unlock_resource(&self, ctx: &RepositoryContext, path: &str) -> RepositoryResult<()> {
        self.inner.unlock_resource(ctx, path)
    }

    fn has_permissions(
        &self,
        ctx: &RepositoryContext,
        user: &str,
        path: &str,
        permissions: Permissions,
    ) -> RepositoryResult<bool> {
        self.inner.has_permissions(ctx, user, path, permissions)
    }

    fn read_project(&self, ctx: &RepositoryContext, name: &str) -> RepositoryResult<Option<Project>> {
        self.inner.read_project(ctx, name)
    }
}

/// Seeds the standard tree below `root`.
fn seed(repo: &MemoryRepository, root: &str) {
    let at = |path: &str| format!("{}{path}", root.trim_end_matches('/'));
    repo.seed_file(&at("/docs/readme.txt"), README);
    repo.seed_file(&at("/docs/report.pdf"), b"%PDF-1.7");
    repo.seed_file(&at("/docs/report.txt"), b"quarterly");
    repo.seed_file(&at("/docs/notes.md"), b"# notes");
    repo.seed_file(&at("/docs/empty.bin"), b"");
    repo.seed_folder(&at("/docs/archive"));
    repo.seed_file(&at("/docs/archive/old.pdf"), b"%PDF-1.4");
}

/// A share over a seeded repository.
pub struct TestDrive {
    /// The backing store, for inspection behind the disk interface.
    pub repo: Arc<MemoryRepository>,
    /// Counting wrapper the disk interface talks to.
    pub counting: Arc<CountingRepository>,
    /// Context provider shared by every session.
    pub contexts: Arc<RepositoryContextProvider>,
    /// The interface under test.
    pub disk: RepositoryDiskInterface,
    /// Default administrator session.
    pub session: Session,
}

impl TestDrive {
    /// Default share rooted at `/`.
    pub fn new() -> Self {
        Self::with_share(ShareConfig::new("share"), |_| {})
    }

    /// Share rooted at [`SITE_ROOT`].
    pub fn rooted() -> Self {
        Self::with_share(ShareConfig::new("site").with_root(SITE_ROOT), |_| {})
    }

    /// Custom share; `setup` runs against the repository after seeding.
    pub fn with_share(share: ShareConfig, setup: impl FnOnce(&MemoryRepository)) -> Self {
        let repo = Arc::new(MemoryRepository::new());
        seed(&repo, &share.root);
        setup(&repo);

        let counting = Arc::new(CountingRepository::new(Arc::clone(&repo)));
        let admin = AdminContext::new(RepositoryContext::new(ADMIN_USER, Project::offline()));
        let contexts = Arc::new(
            RepositoryContextProvider::new(
                counting.clone(),
                admin,
                Box::new(DomainStrippingTranslator),
                share,
            )
            .expect("Failed to configure test share"),
        );
        let disk = RepositoryDiskInterface::new(Arc::clone(&contexts));

        Self {
            repo,
            counting,
            contexts,
            disk,
            session: Session::new(1, ADMIN_USER),
        }
    }

    /// Session for another user, granted `permissions` on the whole tree.
    pub fn user_session(&self, id: u64, user: &str, permissions: Permissions) -> Session {
        self.repo.grant(user, "/", permissions);
        Session::new(id, user)
    }

    pub fn open(&self, path: &str) -> NetworkFile {
        self.disk
            .open_file(&self.session, &OpenParams::new(path))
            .unwrap_or_else(|e| panic!("Failed to open {path}: {e}"))
    }

    /// Creates `path` with `content` and closes it.
    pub fn put(&self, path: &str, content: &[u8]) {
        let mut file = self
            .disk
            .create_file(&self.session, &OpenParams::new(path))
            .unwrap_or_else(|e| panic!("Failed to create {path}: {e}"));
        let written = self
            .disk
            .write_file(&self.session, &mut file, content, 0, content.len(), 0)
            .unwrap_or_else(|e| panic!("Failed to write {path}: {e}"));
        assert_eq!(written, content.len());
        self.disk
            .close_file(&self.session, &mut file)
            .unwrap_or_else(|e| panic!("Failed to close {path}: {e}"));
    }

    /// Reads a whole file through a fresh handle.
    pub fn get(&self, path: &str) -> Vec<u8> {
        let mut file = self.open(path);
        let mut content = Vec::new();
        let mut chunk = [0u8; CHUNK];
        let mut offset = 0u64;
        while let Some(read) = self
            .disk
            .read_file(&self.session, &mut file, &mut chunk, 0, CHUNK, offset)
            .unwrap_or_else(|e| panic!("Failed to read {path}: {e}"))
        {
            content.extend_from_slice(&chunk[..read]);
            offset += read as u64;
        }
        self.disk
            .close_file(&self.session, &mut file)
            .unwrap_or_else(|e| panic!("Failed to close {path}: {e}"));
        content
    }

    /// Names returned by a search, in cursor order.
    pub fn search_names(&self, path: &str, attributes: SearchAttributes) -> Vec<String> {
        self.disk
            .start_search(&self.session, path, attributes)
            .unwrap_or_else(|e| panic!("Failed to search {path}: {e}"))
            .map(|info| info.name)
            .collect()
    }

    pub fn info(&self, path: &str) -> Option<FileInfo> {
        self.disk
            .get_file_information(&self.session, path)
            .unwrap_or_else(|e| panic!("Failed to stat {path}: {e}"))
    }
}
