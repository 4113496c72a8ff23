use std::fmt;
use std::ops::Deref;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod manifest;
mod site;

pub use manifest::{
    ClassicWorkflowCreator, ContentTypeCreator, CustomActionCreator, FieldCreator, FileCreator,
    GroupCreator, ListCreator, LookAndFeel, Manifest, Navigation, NavigationNode,
    RemoteEventRegistrationCreator, RoleDefinitionCreator, StorageKind,
};
pub use site::{SiteDefinition, WebDefinition};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainValidationError {
    #[error("web url must be server-relative (start with '/'): {url}")]
    WebUrlMustBeServerRelative { url: String },
    #[error("manifest name must not be empty")]
    EmptyManifestName,
}

/// Server-relative url of a web, always starting with `/` and never ending
/// with one unless it is the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WebUrl(String);

impl WebUrl {
    /// Create a web url, rejecting values that are not server-relative.
    ///
    /// # Errors
    ///
    /// Returns an error when `url` does not start with `/`.
    pub fn new(url: String) -> Result<Self, DomainValidationError> {
        if !url.starts_with('/') {
            return Err(DomainValidationError::WebUrlMustBeServerRelative { url });
        }
        let trimmed = url.trim_end_matches('/');
        if trimmed.is_empty() {
            Ok(Self::root())
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    #[must_use]
    pub fn root() -> Self {
        Self("/".to_string())
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Append a relative segment, ignoring leading and trailing slashes on it.
    #[must_use]
    pub fn join(&self, segment: &str) -> Self {
        let segment = segment.trim_matches('/');
        if segment.is_empty() {
            return self.clone();
        }
        if self.is_root() {
            Self(format!("/{segment}"))
        } else {
            Self(format!("{}/{segment}", self.0))
        }
    }

    /// Web urls compare case-insensitively on the remote platform.
    #[must_use]
    pub fn same_web(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for WebUrl {
    type Error = DomainValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for WebUrl {
    type Error = DomainValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_string())
    }
}

impl AsRef<str> for WebUrl {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Deref for WebUrl {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl fmt::Display for WebUrl {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(formatter)
    }
}

impl From<WebUrl> for String {
    fn from(value: WebUrl) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ManifestName(String);

impl ManifestName {
    /// Create a manifest name wrapper, rejecting blank names.
    ///
    /// # Errors
    ///
    /// Returns an error when `name` is empty after trimming.
    pub fn new(name: String) -> Result<Self, DomainValidationError> {
        if name.trim().is_empty() {
            Err(DomainValidationError::EmptyManifestName)
        } else {
            Ok(Self(name))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ManifestName {
    type Error = DomainValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ManifestName {
    type Error = DomainValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_string())
    }
}

impl Deref for ManifestName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl fmt::Display for ManifestName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(formatter)
    }
}

impl From<ManifestName> for String {
    fn from(value: ManifestName) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Feature,
    Field,
    ContentType,
    List,
    Folder,
    File,
    Navigation,
    CustomAction,
    Workflow,
    RoleDefinition,
    Group,
    RemoteEventRegistration,
    LookAndFeel,
    WebProperty,
}

impl ArtifactKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Feature => "feature",
            Self::Field => "field",
            Self::ContentType => "content type",
            Self::List => "list",
            Self::Folder => "folder",
            Self::File => "file",
            Self::Navigation => "navigation",
            Self::CustomAction => "custom action",
            Self::Workflow => "workflow association",
            Self::RoleDefinition => "role definition",
            Self::Group => "group",
            Self::RemoteEventRegistration => "remote event registration",
            Self::LookAndFeel => "look and feel",
            Self::WebProperty => "web property",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Normal,
    Verbose,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub detail: String,
}

impl Notification {
    #[must_use]
    pub fn normal(detail: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Normal,
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn verbose(detail: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Verbose,
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn is_verbose(&self) -> bool {
        self.level == NotificationLevel::Verbose
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOperation {
    Provision,
    Deprovision,
    Validate,
}

impl RunOperation {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Provision => "provision",
            Self::Deprovision => "deprovision",
            Self::Validate => "validate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub operation: RunOperation,
    pub source: PathBuf,
    pub target: Option<WebUrl>,
    pub notifications: Vec<Notification>,
    pub injected_custom_actions: Vec<String>,
    pub errors: Vec<String>,
}

impl RunReport {
    #[must_use]
    pub const fn new(operation: RunOperation, source: PathBuf, target: Option<WebUrl>) -> Self {
        Self {
            operation,
            source,
            target,
            notifications: Vec::new(),
            injected_custom_actions: Vec::new(),
            errors: Vec::new(),
        }
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.errors.is_empty()
    }

    #[must_use]
    pub fn normal_notifications(&self) -> usize {
        self.notifications
            .iter()
            .filter(|notification| !notification.is_verbose())
            .count()
    }
}
