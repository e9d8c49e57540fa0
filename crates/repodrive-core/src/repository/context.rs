//! Request context, projects, locks and permissions.

use bitflags::bitflags;

/// Name of the published, read-only project.
pub const ONLINE_PROJECT_NAME: &str = "Online";

/// Name of the default working project.
pub const OFFLINE_PROJECT_NAME: &str = "Offline";

/// Project (version scope) under which reads and writes are evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: u32,
    pub name: String,
    /// Set for the published project, which rejects every mutation.
    pub online: bool,
}

impl Project {
    /// The published project.
    pub fn online() -> Self {
        Self {
            id: 0,
            name: ONLINE_PROJECT_NAME.to_string(),
            online: true,
        }
    }

    /// The default working project.
    pub fn offline() -> Self {
        Self {
            id: 1,
            name: OFFLINE_PROJECT_NAME.to_string(),
            online: false,
        }
    }
}

/// Identity and scope for repository calls.
///
/// Paths handed to the repository together with a context are relative to
/// the context's site root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryContext {
    user: String,
    site_root: String,
    project: Project,
    add_bom: bool,
    wrappers: Vec<String>,
}

impl RepositoryContext {
    /// Creates a context for `user` rooted at `/` in `project`.
    pub fn new(user: impl Into<String>, project: Project) -> Self {
        Self {
            user: user.into(),
            site_root: "/".to_string(),
            project,
            add_bom: false,
            wrappers: Vec::new(),
        }
    }

    /// Builder form of [`set_site_root`](Self::set_site_root).
    #[must_use]
    pub fn with_site_root(mut self, site_root: impl Into<String>) -> Self {
        self.set_site_root(site_root);
        self
    }

    /// The user all calls are performed as.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// The site root paths are resolved against.
    pub fn site_root(&self) -> &str {
        &self.site_root
    }

    /// Sets the site root; an empty root means `/`.
    pub fn set_site_root(&mut self, site_root: impl Into<String>) {
        let root = site_root.into();
        let trimmed = root.trim_end_matches('/');
        self.site_root = if trimmed.is_empty() {
            "/".to_string()
        } else {
            trimmed.to_string()
        };
    }

    /// The active project.
    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Switches the active project.
    pub fn set_project(&mut self, project: Project) {
        self.project = project;
    }

    /// Whether plain-text content is presented with a UTF-8 byte-order mark.
    pub fn add_bom(&self) -> bool {
        self.add_bom
    }

    /// Enables or disables byte-order-mark presentation.
    pub fn set_add_bom(&mut self, add_bom: bool) {
        self.add_bom = add_bom;
    }

    /// Resource-wrapper names forwarded to the repository, in order.
    pub fn wrappers(&self) -> &[String] {
        &self.wrappers
    }

    /// Sets the resource-wrapper names.
    pub fn set_wrappers(&mut self, wrappers: Vec<String>) {
        self.wrappers = wrappers;
    }

    /// Maps a site path to an absolute repository path.
    ///
    /// ```
    /// use repodrive_core::{Project, RepositoryContext};
    ///
    /// let ctx = RepositoryContext::new("editor", Project::offline()).with_site_root("/sites/default");
    /// assert_eq!(ctx.add_site_root("/news/a.txt"), "/sites/default/news/a.txt");
    /// assert_eq!(ctx.add_site_root("/"), "/sites/default");
    /// ```
    pub fn add_site_root(&self, path: &str) -> String {
        if self.site_root == "/" {
            return path.to_string();
        }
        if path == "/" || path.is_empty() {
            return self.site_root.clone();
        }
        format!("{}{}", self.site_root, path)
    }

    /// Maps an absolute repository path back to a site path.
    ///
    /// Returns `None` when the path lies outside the site root.
    pub fn remove_site_root(&self, root_path: &str) -> Option<String> {
        if self.site_root == "/" {
            return Some(root_path.to_string());
        }
        if root_path == self.site_root {
            return Some("/".to_string());
        }
        root_path
            .strip_prefix(&self.site_root)
            .filter(|rest| rest.starts_with('/'))
            .map(str::to_string)
    }
}

bitflags! {
    /// Permission set checked by the repository.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Permissions: u8 {
        /// See that the resource exists.
        const VIEW = 0b0001;
        /// Read content.
        const READ = 0b0010;
        /// Modify, create below, delete, move, lock.
        const WRITE = 0b0100;
        /// Change permissions.
        const CONTROL = 0b1000;
    }
}

/// Kind of lock held on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockType {
    /// Session-scoped lock, taken implicitly by editors.
    Temporary,
    /// Explicit exclusive lock.
    Exclusive,
}

/// Current lock state of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LockInfo {
    /// User holding the lock, if any.
    pub owner: Option<String>,
    pub lock_type: Option<LockType>,
}

impl LockInfo {
    /// An unlocked resource.
    pub fn unlocked() -> Self {
        Self::default()
    }

    /// Returns true if nobody holds a lock.
    pub fn is_unlocked(&self) -> bool {
        self.owner.is_none()
    }

    /// Returns true if `user` holds the lock.
    pub fn is_owned_by(&self, user: &str) -> bool {
        self.owner.as_deref() == Some(user)
    }

    /// Returns true if `user` may take (or already holds) the lock.
    pub fn can_lock(&self, user: &str) -> bool {
        self.is_unlocked() || self.is_owned_by(user)
    }
}

/// How deletion treats other resources sharing the same content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    /// Delete only the addressed resource; siblings keep the content.
    PreserveSiblings,
    /// Delete the addressed resource and every sibling.
    DeleteSiblings,
}


#[cfg(test)]
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn site_root_round_trips(
            root in "(/[a-z]{1,8}){1,3}",
            path in "(/[a-z0-9._]{1,8}){1,4}",
        ) {
            let ctx = RepositoryContext::new("u", Project::offline()).with_site_root(root.clone());
            let root_path = ctx.add_site_root(&path);
            prop_assert!(root_path.starts_with(&root));
            prop_assert_eq!(ctx.remove_site_root(&root_path), Some(path));
        }

        #[test]
        fn sibling_prefixes_stay_outside(root in "(/[a-z]{1,8}){1,3}", suffix in "[a-z]{1,4}") {
            let ctx = RepositoryContext::new("u", Project::offline()).with_site_root(root.clone());
            let sibling = format!("{root}{suffix}/x");
            prop_assert_eq!(ctx.remove_site_root(&sibling), None);
        }
    }
}
