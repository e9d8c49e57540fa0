//! Repository resources and their identity.

use std::fmt;
use std::time::SystemTime;
use uuid::Uuid;

/// UTF-8 byte-order mark.
pub const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Durable identity of a resource.
///
/// The id survives moves and renames; the path does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(Uuid);

impl ResourceId {
    /// Generates a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing uuid.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying uuid.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Folds the 128-bit id into 64 bits.
    ///
    /// Protocol file ids are 64-bit; xor-ing the halves keeps every bit of the
    /// uuid contributing to the result.
    pub fn fold_u64(&self) -> u64 {
        let (high, low) = self.0.as_u64_pair();
        high ^ low
    }
}

impl Default for ResourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Content kind of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    /// Folder-like resource holding children.
    Folder,
    /// Plain text document.
    Plain,
    /// Image document.
    Image,
    /// Any other binary document.
    Binary,
}

impl ResourceType {
    /// Picks the default content kind for a new file from its name.
    ///
    /// ```
    /// use repodrive_core::ResourceType;
    ///
    /// assert_eq!(ResourceType::default_for_name("notes.TXT"), ResourceType::Plain);
    /// assert_eq!(ResourceType::default_for_name("logo.png"), ResourceType::Image);
    /// assert_eq!(ResourceType::default_for_name("archive.zip"), ResourceType::Binary);
    /// ```
    pub fn default_for_name(name: &str) -> Self {
        let extension = match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
            _ => return ResourceType::Binary,
        };
        match extension.as_str() {
            "txt" | "css" | "js" | "json" | "html" | "htm" | "xml" | "md" | "csv" | "jsp"
            | "properties" => ResourceType::Plain,
            "png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" | "bmp" | "ico" => ResourceType::Image,
            _ => ResourceType::Binary,
        }
    }

    /// Returns true for folders.
    #[inline]
    pub fn is_folder(self) -> bool {
        matches!(self, ResourceType::Folder)
    }

    /// Returns true for plain text documents.
    #[inline]
    pub fn is_plain_text(self) -> bool {
        matches!(self, ResourceType::Plain)
    }

    /// Stable lowercase name of the type.
    pub fn name(self) -> &'static str {
        match self {
            ResourceType::Folder => "folder",
            ResourceType::Plain => "plain",
            ResourceType::Image => "image",
            ResourceType::Binary => "binary",
        }
    }
}

/// Publication state of a resource relative to the online project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    /// Created since the last publish.
    New,
    /// Modified since the last publish.
    Changed,
    /// Identical to the published version.
    Unchanged,
    /// Deleted, pending publish.
    Deleted,
}

/// Visibility filter applied by reads and listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResourceFilter {
    /// Only resources visible in the current project and not marked deleted.
    #[default]
    VisibleNotDeleted,
    /// Every resource, including those pending deletion.
    All,
}

impl ResourceFilter {
    /// Returns true if a resource in `state` passes this filter.
    pub fn accepts(self, state: ResourceState) -> bool {
        match self {
            ResourceFilter::All => true,
            ResourceFilter::VisibleNotDeleted => state != ResourceState::Deleted,
        }
    }
}

/// A resource as seen through a [`RepositoryContext`](super::RepositoryContext).
///
/// `path` is relative to the context's site root and always starts with `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub id: ResourceId,
    pub path: String,
    pub resource_type: ResourceType,
    pub state: ResourceState,
    /// Content length in bytes; 0 for folders.
    pub length: u64,
    pub date_created: SystemTime,
    pub date_last_modified: SystemTime,
    /// Time the content (as opposed to attributes) last changed.
    pub date_content: SystemTime,
}

impl Resource {
    /// Last path segment; empty for the root folder.
    pub fn name(&self) -> &str {
        self.path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }

    /// Returns true for folders.
    #[inline]
    pub fn is_folder(&self) -> bool {
        self.resource_type.is_folder()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(path: &str, resource_type: ResourceType) -> Resource {
        let now = SystemTime::now();
        Resource {
            id: ResourceId::new(),
            path: path.to_string(),
            resource_type,
            state: ResourceState::New,
            length: 0,
            date_created: now,
            date_last_modified: now,
            date_content: now,
        }
    }

    #[test]
    fn test_resource_name() {
        assert_eq!(resource("/a/b/report.txt", ResourceType::Plain).name(), "report.txt");
        assert_eq!(resource("/a/b/", ResourceType::Folder).name(), "b");
        assert_eq!(resource("/", ResourceType::Folder).name(), "");
    }

    #[test]
    fn test_default_type_without_extension() {
        assert_eq!(ResourceType::default_for_name("Makefile"), ResourceType::Binary);
        // A leading dot marks a hidden file, not an extension
        assert_eq!(ResourceType::default_for_name(".txt"), ResourceType::Binary);
        assert_eq!(ResourceType::default_for_name("page.HTML"), ResourceType::Plain);
    }

    #[test]
    fn test_fold_is_stable() {
        let id = ResourceId::from_uuid(Uuid::from_u64_pair(0xFF00, 0x00FF));
        assert_eq!(id.fold_u64(), 0xFFFF);
        assert_eq!(id.fold_u64(), id.fold_u64());
    }

    #[test]
    fn test_filter_hides_deleted() {
        assert!(!ResourceFilter::VisibleNotDeleted.accepts(ResourceState::Deleted));
        assert!(ResourceFilter::VisibleNotDeleted.accepts(ResourceState::Changed));
        assert!(ResourceFilter::All.accepts(ResourceState::Deleted));
    }
}
