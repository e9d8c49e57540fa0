//! Per-session repository contexts.
//!
//! Every protocol session works in its own [`RepositoryContext`]: the
//! session's user (after identity translation), rooted at the share root, in
//! the share's project. Contexts are derived on the first call of a session
//! and reused until the session ends.

use crate::config::ShareConfig;
use crate::file_info::{Session, SessionId};
use repodrive_core::{
    Permissions, Project, Repository, RepositoryContext, RepositoryError, RepositoryResult,
};
use repodrive_mount::HandleTable;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Privileged repository context, created once at startup.
///
/// Used for checks the session user cannot perform on their own behalf.
#[derive(Debug, Clone)]
pub struct AdminContext(RepositoryContext);

impl AdminContext {
    /// Wraps a context that has administrative rights.
    pub fn new(ctx: RepositoryContext) -> Self {
        Self(ctx)
    }

    /// The underlying context.
    pub fn context(&self) -> &RepositoryContext {
        &self.0
    }
}

/// Maps protocol user names to repository user names.
pub trait IdentityTranslator: Send + Sync {
    /// Returns the repository user for a protocol user name.
    fn translate(&self, user_name: &str) -> String;
}

/// Strips Windows domain qualifiers: `DOMAIN\user` and `user@realm` both
/// become `user`.
///
/// ```
/// use repodrive_smb::{DomainStrippingTranslator, IdentityTranslator};
///
/// let t = DomainStrippingTranslator;
/// assert_eq!(t.translate(r"CORP\alice"), "alice");
/// assert_eq!(t.translate("bob@corp.example"), "bob");
/// assert_eq!(t.translate("carol"), "carol");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DomainStrippingTranslator;

impl IdentityTranslator for DomainStrippingTranslator {
    fn translate(&self, user_name: &str) -> String {
        let user = user_name.rsplit('\\').next().unwrap_or(user_name);
        let user = user.split('@').next().unwrap_or(user);
        user.to_string()
    }
}

/// Outcome of a share attachment check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    Denied,
}

impl AccessDecision {
    /// Returns true for [`AccessDecision::Allowed`].
    pub fn is_allowed(self) -> bool {
        self == AccessDecision::Allowed
    }
}

/// Derives and caches repository contexts for protocol sessions.
pub struct RepositoryContextProvider {
    repository: Arc<dyn Repository>,
    admin: AdminContext,
    translator: Box<dyn IdentityTranslator>,
    share: ShareConfig,
    project: Project,
    contexts: HandleTable<SessionId, Arc<RepositoryContext>>,
}

impl std::fmt::Debug for RepositoryContextProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryContextProvider")
            .field("share", &self.share.name)
            .field("root", &self.share.root)
            .field("project", &self.project.name)
            .field("sessions", &self.contexts.len())
            .finish_non_exhaustive()
    }
}

impl RepositoryContextProvider {
    /// Creates a provider for `share`.
    ///
    /// Fails if the share's project does not exist.
    pub fn new(
        repository: Arc<dyn Repository>,
        admin: AdminContext,
        translator: Box<dyn IdentityTranslator>,
        share: ShareConfig,
    ) -> RepositoryResult<Self> {
        let name = share.project_name();
        let project = repository
            .read_project(admin.context(), name)?
            .ok_or_else(|| RepositoryError::UnknownProject {
                name: name.to_string(),
            })?;
        info!(share = %share.name, root = %share.root, project = %project.name, "Share configured");
        Ok(Self {
            repository,
            admin,
            translator,
            share,
            project,
            contexts: HandleTable::new(),
        })
    }

    /// The repository every context addresses.
    pub fn repository(&self) -> &Arc<dyn Repository> {
        &self.repository
    }

    /// The share this provider serves.
    pub fn share(&self) -> &ShareConfig {
        &self.share
    }

    /// The project sessions work in.
    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Repository user name for a session.
    pub fn user_for(&self, session: &Session) -> String {
        self.translator.translate(&session.user_name)
    }

    /// The session's context, derived on first use.
    pub fn context_for(&self, session: &Session) -> Arc<RepositoryContext> {
        self.contexts.get_or_insert_with(session.id, || {
            let user = self.user_for(session);
            let mut ctx =
                RepositoryContext::new(user, self.project.clone()).with_site_root(&self.share.root);
            ctx.set_add_bom(self.share.add_bom);
            ctx.set_wrappers(self.share.wrappers.clone());
            debug!(session = %session.id, user = ctx.user(), root = ctx.site_root(), "Derived context");
            Arc::new(ctx)
        })
    }

    /// Forgets a session's context.
    pub fn end_session(&self, id: SessionId) {
        if self.contexts.remove(&id).is_some() {
            debug!(session = %id, "Session ended");
        }
    }

    /// Number of sessions with a cached context.
    pub fn active_sessions(&self) -> usize {
        self.contexts.len()
    }

    /// Decides whether a session may attach to the share.
    ///
    /// The translated user needs view permission on the share root. Failures
    /// of the check itself deny access.
    pub fn check_access(&self, session: &Session) -> AccessDecision {
        let user = self.user_for(session);
        match self.repository.has_permissions(
            self.admin.context(),
            &user,
            &self.share.root,
            Permissions::VIEW,
        ) {
            Ok(true) => AccessDecision::Allowed,
            Ok(false) => {
                info!(user = %user, share = %self.share.name, "Share access denied");
                AccessDecision::Denied
            }
            Err(e) => {
                warn!(user = %user, share = %self.share.name, error = %e, "Share access check failed");
                AccessDecision::Denied
            }
        }
    }
}
