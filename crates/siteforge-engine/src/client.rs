use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use siteforge_domain::{ArtifactKind, LookAndFeel, Navigation, WebUrl};

use crate::error::RemoteError;

/// Credentials the client acts with. App-only identities cannot call the
/// legacy workflow association service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    #[default]
    Interactive,
    AppOnly,
}

impl AuthMode {
    #[must_use]
    pub const fn is_anonymous(self) -> bool {
        matches!(self, Self::AppOnly)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebInfo {
    pub server_relative_url: WebUrl,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub language: u32,
    pub web_template: String,
    #[serde(default)]
    pub has_unique_permissions: bool,
    #[serde(default)]
    pub app_instance_id: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl WebInfo {
    /// App webs carry a non-empty application instance id.
    #[must_use]
    pub fn is_app_web(&self) -> bool {
        self.app_instance_id
            .as_deref()
            .is_some_and(|id| !id.trim().is_empty())
    }
}

/// Baseline properties loaded in one round trip before any phase runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteContext {
    pub site_url: String,
    pub root_web_url: WebUrl,
    pub web: WebInfo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebCreation {
    pub url: WebUrl,
    pub title: String,
    pub description: String,
    pub language: u32,
    pub web_template: String,
    pub use_same_permissions_as_parent: bool,
}

/// Remote representation of one provisioned artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub kind: ArtifactKind,
    pub identity: String,
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl ArtifactRecord {
    #[must_use]
    pub fn new(kind: ArtifactKind, identity: impl Into<String>) -> Self {
        Self {
            kind,
            identity: identity.into(),
            properties: serde_json::Map::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).and_then(serde_json::Value::as_str)
    }
}

/// Capability the orchestrators use to reach a remote site. Every method is
/// one blocking round trip.
pub trait SiteClient {
    fn authentication_mode(&self) -> AuthMode;

    /// Load site url, root web url and the web's own properties in one batch.
    ///
    /// # Errors
    ///
    /// Returns an error when the web does not exist or the call fails.
    fn load_context(&mut self, web: &WebUrl) -> Result<SiteContext, RemoteError>;

    /// # Errors
    ///
    /// Returns an error when the parent web does not exist or the call fails.
    fn child_webs(&mut self, parent: &WebUrl) -> Result<Vec<WebInfo>, RemoteError>;

    /// # Errors
    ///
    /// Returns an error when the parent is missing or the url is taken.
    fn add_child_web(
        &mut self,
        parent: &WebUrl,
        creation: &WebCreation,
    ) -> Result<WebInfo, RemoteError>;

    /// # Errors
    ///
    /// Returns an error when the web is missing or still has child webs.
    fn delete_web(&mut self, web: &WebUrl) -> Result<(), RemoteError>;

    /// # Errors
    ///
    /// Returns an error when the call fails.
    fn active_features(&mut self, web: &WebUrl) -> Result<BTreeSet<String>, RemoteError>;

    /// # Errors
    ///
    /// Returns an error when the call fails.
    fn activate_feature(&mut self, web: &WebUrl, feature_id: &str) -> Result<(), RemoteError>;

    /// # Errors
    ///
    /// Returns an error when the call fails.
    fn deactivate_feature(&mut self, web: &WebUrl, feature_id: &str) -> Result<(), RemoteError>;

    /// # Errors
    ///
    /// Returns an error when the call fails.
    fn find_artifact(
        &mut self,
        web: &WebUrl,
        kind: ArtifactKind,
        identity: &str,
    ) -> Result<Option<ArtifactRecord>, RemoteError>;

    /// Run a query returning every artifact of one kind.
    ///
    /// # Errors
    ///
    /// Returns an error when the call fails.
    fn query_artifacts(
        &mut self,
        web: &WebUrl,
        kind: ArtifactKind,
    ) -> Result<Vec<ArtifactRecord>, RemoteError>;

    /// Create or replace an artifact.
    ///
    /// # Errors
    ///
    /// Returns an error when the call fails.
    fn put_artifact(&mut self, web: &WebUrl, record: ArtifactRecord) -> Result<(), RemoteError>;

    /// Returns whether an artifact was removed.
    ///
    /// # Errors
    ///
    /// Returns an error when the call fails.
    fn delete_artifact(
        &mut self,
        web: &WebUrl,
        kind: ArtifactKind,
        identity: &str,
    ) -> Result<bool, RemoteError>;

    /// # Errors
    ///
    /// Returns an error when the call fails.
    fn navigation(&mut self, web: &WebUrl) -> Result<Option<Navigation>, RemoteError>;

    /// # Errors
    ///
    /// Returns an error when the call fails.
    fn set_navigation(&mut self, web: &WebUrl, navigation: &Navigation) -> Result<(), RemoteError>;

    /// # Errors
    ///
    /// Returns an error when the call fails.
    fn look_and_feel(&mut self, web: &WebUrl) -> Result<Option<LookAndFeel>, RemoteError>;

    /// # Errors
    ///
    /// Returns an error when the call fails.
    fn apply_look_and_feel(
        &mut self,
        web: &WebUrl,
        settings: &LookAndFeel,
    ) -> Result<(), RemoteError>;

    /// Call the legacy workflow association service.
    ///
    /// # Errors
    ///
    /// Returns an error when the identity may not call the service or the list is missing.
    fn associate_workflow(
        &mut self,
        web: &WebUrl,
        association: ArtifactRecord,
    ) -> Result<(), RemoteError>;

    /// # Errors
    ///
    /// Returns an error when the call fails.
    fn set_web_property(&mut self, web: &WebUrl, key: &str, value: &str)
    -> Result<(), RemoteError>;
}
