//! Share configuration.
//!
//! A drive exports one or more shares. Each share maps to a root folder in
//! the repository and a project; everything else about a session's view of
//! the repository is derived from these settings.

use repodrive_core::repository::OFFLINE_PROJECT_NAME;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for this schema.
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The configuration is well-formed but unusable.
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// No share with the requested name.
    #[error("Unknown share: {0}")]
    UnknownShare(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Settings of one exported share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareConfig {
    /// Share name clients connect to.
    pub name: String,

    /// Repository folder exposed as the share root.
    #[serde(default = "default_root")]
    pub root: String,

    /// Project sessions work in; the working project when unset.
    #[serde(default)]
    pub project: Option<String>,

    /// Present plain-text files with a UTF-8 byte-order mark.
    #[serde(default)]
    pub add_bom: bool,

    /// Resource wrappers forwarded to the repository, in order.
    #[serde(default)]
    pub wrappers: Vec<String>,
}

fn default_root() -> String {
    "/".to_string()
}

impl ShareConfig {
    /// A share exposing the whole repository in the working project.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root: default_root(),
            project: None,
            add_bom: false,
            wrappers: Vec::new(),
        }
    }

    /// Builder for the share root.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into();
        self
    }

    /// Builder for the project.
    #[must_use]
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Builder for the byte-order-mark option.
    #[must_use]
    pub fn with_bom(mut self, add_bom: bool) -> Self {
        self.add_bom = add_bom;
        self
    }

    /// The configured project, or the working project if none is set.
    pub fn project_name(&self) -> &str {
        self.project.as_deref().unwrap_or(OFFLINE_PROJECT_NAME)
    }

    /// Checks this share on its own.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("share name must not be empty".to_string()));
        }
        if !self.root.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "share '{}': root '{}' must start with '/'",
                self.name, self.root
            )));
        }
        Ok(())
    }
}

/// All exported shares.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveConfig {
    pub shares: Vec<ShareConfig>,
}

impl DriveConfig {
    /// Loads and validates a JSON configuration file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: DriveConfig =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        debug!(path = %path.display(), shares = config.shares.len(), "Loaded drive config");
        Ok(config)
    }

    /// Rejects empty share lists, duplicate names and invalid shares.
    ///
    /// Share names compare case-insensitively, as SMB clients treat them.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.shares.is_empty() {
            return Err(ConfigError::Invalid("no shares configured".to_string()));
        }
        let mut seen = HashSet::new();
        for share in &self.shares {
            share.validate()?;
            if !seen.insert(share.name.to_lowercase()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate share name '{}'",
                    share.name
                )));
            }
        }
        Ok(())
    }

    /// Looks up a share by name, ignoring case.
    pub fn share(&self, name: &str) -> ConfigResult<&ShareConfig> {
        self.shares
            .iter()
            .find(|share| share.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| ConfigError::UnknownShare(name.to_string()))
    }
}
