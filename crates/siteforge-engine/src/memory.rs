use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use siteforge_domain::{ArtifactKind, LookAndFeel, Navigation, WebUrl};
use tracing::debug;

use crate::client::{ArtifactRecord, AuthMode, SiteClient, SiteContext, WebCreation, WebInfo};
use crate::error::{RemoteError, StateFileError};

/// Persistable contents of an emulated site collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteState {
    pub site_url: String,
    pub webs: Vec<WebState>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebState {
    pub info: WebInfo,
    #[serde(default)]
    pub features: BTreeSet<String>,
    #[serde(default)]
    pub artifacts: Vec<ArtifactRecord>,
    #[serde(default)]
    pub navigation: Option<Navigation>,
    #[serde(default)]
    pub look_and_feel: Option<LookAndFeel>,
}

impl WebState {
    fn new(info: WebInfo) -> Self {
        Self {
            info,
            features: BTreeSet::new(),
            artifacts: Vec::new(),
            navigation: None,
            look_and_feel: None,
        }
    }

    fn position(&self, kind: ArtifactKind, identity: &str) -> Option<usize> {
        self.artifacts.iter().position(|record| {
            record.kind == kind && record.identity.eq_ignore_ascii_case(identity)
        })
    }
}

/// In-process site emulator. Every trait call is logged and may be made to
/// fail through [`MemorySite::fail_next`].
#[derive(Debug, Clone)]
pub struct MemorySite {
    state: SiteState,
    auth: AuthMode,
    calls: Vec<String>,
    faults: VecDeque<RemoteError>,
}

impl MemorySite {
    /// Create a site holding only its root web.
    #[must_use]
    pub fn new(site_url: impl Into<String>) -> Self {
        let root = WebInfo {
            server_relative_url: WebUrl::root(),
            title: "Root".to_string(),
            description: String::new(),
            language: 1033,
            web_template: "STS#0".to_string(),
            has_unique_permissions: true,
            app_instance_id: None,
            properties: BTreeMap::new(),
        };
        Self::from_state(SiteState {
            site_url: site_url.into(),
            webs: vec![WebState::new(root)],
        })
    }

    #[must_use]
    pub const fn from_state(state: SiteState) -> Self {
        Self {
            state,
            auth: AuthMode::Interactive,
            calls: Vec::new(),
            faults: VecDeque::new(),
        }
    }

    #[must_use]
    pub const fn with_auth_mode(mut self, auth: AuthMode) -> Self {
        self.auth = auth;
        self
    }

    /// Load a site previously written by [`MemorySite::save`].
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or is not valid state JSON.
    pub fn load(path: &Path) -> Result<Self, StateFileError> {
        let contents = fs::read_to_string(path).map_err(|source| StateFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let state = serde_json::from_str(&contents).map_err(|source| StateFileError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_state(state))
    }

    /// # Errors
    ///
    /// Returns an error when the state cannot be encoded or written.
    pub fn save(&self, path: &Path) -> Result<(), StateFileError> {
        let mut contents = serde_json::to_string_pretty(&self.state)
            .map_err(|source| StateFileError::Encode { source })?;
        contents.push('\n');
        fs::write(path, contents).map_err(|source| StateFileError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    #[must_use]
    pub const fn state(&self) -> &SiteState {
        &self.state
    }

    /// Insert or replace a web directly, bypassing the call log.
    pub fn insert_web(&mut self, info: WebInfo) {
        let url = info.server_relative_url.clone();
        match self.web_index(&url) {
            Some(index) => self.state.webs[index].info = info,
            None => self.state.webs.push(WebState::new(info)),
        }
    }

    #[must_use]
    pub fn web(&self, url: &WebUrl) -> Option<&WebState> {
        self.web_index(url).map(|index| &self.state.webs[index])
    }

    #[must_use]
    pub fn artifact(
        &self,
        url: &WebUrl,
        kind: ArtifactKind,
        identity: &str,
    ) -> Option<&ArtifactRecord> {
        let web = self.web(url)?;
        web.position(kind, identity).map(|index| &web.artifacts[index])
    }

    #[must_use]
    pub fn artifacts(&self, url: &WebUrl, kind: ArtifactKind) -> Vec<&ArtifactRecord> {
        self.web(url)
            .map(|web| {
                web.artifacts
                    .iter()
                    .filter(|record| record.kind == kind)
                    .collect()
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn calls(&self) -> &[String] {
        &self.calls
    }

    /// Calls whose operation name equals `operation`.
    #[must_use]
    pub fn calls_to(&self, operation: &str) -> Vec<&str> {
        self.calls
            .iter()
            .filter(|call| call.split(' ').next() == Some(operation))
            .map(String::as_str)
            .collect()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Queue an error returned by the next trait call instead of running it.
    pub fn fail_next(&mut self, error: RemoteError) {
        self.faults.push_back(error);
    }

    #[must_use]
    pub fn pending_faults(&self) -> usize {
        self.faults.len()
    }

    fn web_index(&self, url: &WebUrl) -> Option<usize> {
        self.state
            .webs
            .iter()
            .position(|web| web.info.server_relative_url.same_web(url))
    }

    fn begin(&mut self, operation: &str, web: &WebUrl, detail: &str) -> Result<(), RemoteError> {
        let call = if detail.is_empty() {
            format!("{operation} {web}")
        } else {
            format!("{operation} {web} {detail}")
        };
        debug!(%call, "memory site call");
        self.calls.push(call);
        match self.faults.pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn web_mut(&mut self, url: &WebUrl) -> Result<&mut WebState, RemoteError> {
        let index = self.web_index(url).ok_or_else(|| missing_web(url))?;
        Ok(&mut self.state.webs[index])
    }

    fn existing_web(&self, url: &WebUrl) -> Result<&WebState, RemoteError> {
        self.web(url).ok_or_else(|| missing_web(url))
    }
}

fn missing_web(url: &WebUrl) -> RemoteError {
    RemoteError::NotFound {
        message: format!("web {url} does not exist"),
    }
}

fn parent_url(url: &WebUrl) -> Option<WebUrl> {
    if url.is_root() {
        return None;
    }
    let (parent, _) = url.as_str().rsplit_once('/')?;
    if parent.is_empty() {
        Some(WebUrl::root())
    } else {
        WebUrl::try_from(parent).ok()
    }
}

fn is_child_of(candidate: &WebUrl, parent: &WebUrl) -> bool {
    parent_url(candidate).is_some_and(|found| found.same_web(parent))
}

impl SiteClient for MemorySite {
    fn authentication_mode(&self) -> AuthMode {
        self.auth
    }

    fn load_context(&mut self, web: &WebUrl) -> Result<SiteContext, RemoteError> {
        self.begin("load_context", web, "")?;
        let info = self.existing_web(web)?.info.clone();
        Ok(SiteContext {
            site_url: self.state.site_url.clone(),
            root_web_url: WebUrl::root(),
            web: info,
        })
    }

    fn child_webs(&mut self, parent: &WebUrl) -> Result<Vec<WebInfo>, RemoteError> {
        self.begin("child_webs", parent, "")?;
        self.existing_web(parent)?;
        Ok(self
            .state
            .webs
            .iter()
            .filter(|web| is_child_of(&web.info.server_relative_url, parent))
            .map(|web| web.info.clone())
            .collect())
    }

    fn add_child_web(
        &mut self,
        parent: &WebUrl,
        creation: &WebCreation,
    ) -> Result<WebInfo, RemoteError> {
        self.begin("add_child_web", parent, creation.url.as_str())?;
        self.existing_web(parent)?;
        if !is_child_of(&creation.url, parent) {
            return Err(RemoteError::Conflict {
                message: format!("{} is not a direct child of {parent}", creation.url),
            });
        }
        if self.web(&creation.url).is_some() {
            return Err(RemoteError::Conflict {
                message: format!("web {} already exists", creation.url),
            });
        }
        let info = WebInfo {
            server_relative_url: creation.url.clone(),
            title: creation.title.clone(),
            description: creation.description.clone(),
            language: creation.language,
            web_template: creation.web_template.clone(),
            has_unique_permissions: !creation.use_same_permissions_as_parent,
            app_instance_id: None,
            properties: BTreeMap::new(),
        };
        self.state.webs.push(WebState::new(info.clone()));
        Ok(info)
    }

    fn delete_web(&mut self, web: &WebUrl) -> Result<(), RemoteError> {
        self.begin("delete_web", web, "")?;
        let index = self.web_index(web).ok_or_else(|| missing_web(web))?;
        if web.is_root() {
            return Err(RemoteError::Conflict {
                message: "the root web cannot be deleted".to_string(),
            });
        }
        let has_children = self
            .state
            .webs
            .iter()
            .any(|candidate| is_child_of(&candidate.info.server_relative_url, web));
        if has_children {
            return Err(RemoteError::Conflict {
                message: format!("web {web} still has child webs"),
            });
        }
        self.state.webs.remove(index);
        Ok(())
    }

    fn active_features(&mut self, web: &WebUrl) -> Result<BTreeSet<String>, RemoteError> {
        self.begin("active_features", web, "")?;
        Ok(self.existing_web(web)?.features.clone())
    }

    fn activate_feature(&mut self, web: &WebUrl, feature_id: &str) -> Result<(), RemoteError> {
        self.begin("activate_feature", web, feature_id)?;
        self.web_mut(web)?.features.insert(feature_id.to_string());
        Ok(())
    }

    fn deactivate_feature(&mut self, web: &WebUrl, feature_id: &str) -> Result<(), RemoteError> {
        self.begin("deactivate_feature", web, feature_id)?;
        self.web_mut(web)?.features.remove(feature_id);
        Ok(())
    }

    fn find_artifact(
        &mut self,
        web: &WebUrl,
        kind: ArtifactKind,
        identity: &str,
    ) -> Result<Option<ArtifactRecord>, RemoteError> {
        self.begin("find_artifact", web, identity)?;
        let state = self.existing_web(web)?;
        Ok(state
            .position(kind, identity)
            .map(|index| state.artifacts[index].clone()))
    }

    fn query_artifacts(
        &mut self,
        web: &WebUrl,
        kind: ArtifactKind,
    ) -> Result<Vec<ArtifactRecord>, RemoteError> {
        self.begin("query_artifacts", web, kind.label())?;
        Ok(self
            .existing_web(web)?
            .artifacts
            .iter()
            .filter(|record| record.kind == kind)
            .cloned()
            .collect())
    }

    fn put_artifact(&mut self, web: &WebUrl, record: ArtifactRecord) -> Result<(), RemoteError> {
        self.begin("put_artifact", web, &record.identity)?;
        let state = self.web_mut(web)?;
        match state.position(record.kind, &record.identity) {
            Some(index) => state.artifacts[index] = record,
            None => state.artifacts.push(record),
        }
        Ok(())
    }

    fn delete_artifact(
        &mut self,
        web: &WebUrl,
        kind: ArtifactKind,
        identity: &str,
    ) -> Result<bool, RemoteError> {
        self.begin("delete_artifact", web, identity)?;
        let state = self.web_mut(web)?;
        Ok(match state.position(kind, identity) {
            Some(index) => {
                state.artifacts.remove(index);
                true
            }
            None => false,
        })
    }

    fn navigation(&mut self, web: &WebUrl) -> Result<Option<Navigation>, RemoteError> {
        self.begin("navigation", web, "")?;
        Ok(self.existing_web(web)?.navigation.clone())
    }

    fn set_navigation(&mut self, web: &WebUrl, navigation: &Navigation) -> Result<(), RemoteError> {
        self.begin("set_navigation", web, "")?;
        self.web_mut(web)?.navigation = Some(navigation.clone());
        Ok(())
    }

    fn look_and_feel(&mut self, web: &WebUrl) -> Result<Option<LookAndFeel>, RemoteError> {
        self.begin("look_and_feel", web, "")?;
        Ok(self.existing_web(web)?.look_and_feel.clone())
    }

    fn apply_look_and_feel(
        &mut self,
        web: &WebUrl,
        settings: &LookAndFeel,
    ) -> Result<(), RemoteError> {
        self.begin("apply_look_and_feel", web, "")?;
        self.web_mut(web)?.look_and_feel = Some(settings.clone());
        Ok(())
    }

    fn associate_workflow(
        &mut self,
        web: &WebUrl,
        association: ArtifactRecord,
    ) -> Result<(), RemoteError> {
        self.begin("associate_workflow", web, &association.identity)?;
        if self.auth.is_anonymous() {
            return Err(RemoteError::AccessDenied {
                message: "app-only identities cannot call the workflow association service"
                    .to_string(),
            });
        }
        let list_title = association.property("list_title").unwrap_or_default().to_string();
        let state = self.web_mut(web)?;
        if state.position(ArtifactKind::List, &list_title).is_none() {
            return Err(RemoteError::NotFound {
                message: format!("list {list_title} does not exist"),
            });
        }
        match state.position(ArtifactKind::Workflow, &association.identity) {
            Some(index) => state.artifacts[index] = association,
            None => state.artifacts.push(association),
        }
        Ok(())
    }

    fn set_web_property(
        &mut self,
        web: &WebUrl,
        key: &str,
        value: &str,
    ) -> Result<(), RemoteError> {
        self.begin("set_web_property", web, key)?;
        self.web_mut(web)?
            .info
            .properties
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use siteforge_domain::{ArtifactKind, WebUrl};
    use tempfile::TempDir;

    use super::MemorySite;
    use crate::client::{ArtifactRecord, SiteClient, WebCreation};
    use crate::error::RemoteError;

    fn url(value: &str) -> WebUrl {
        WebUrl::try_from(value).expect("url")
    }

    fn creation(value: &str) -> WebCreation {
        WebCreation {
            url: url(value),
            title: "Sub".to_string(),
            description: String::new(),
            language: 1033,
            web_template: "STS#0".to_string(),
            use_same_permissions_as_parent: true,
        }
    }

    #[test]
    fn child_webs_only_lists_direct_children() {
        let mut site = MemorySite::new("https://contoso.example");
        site.add_child_web(&WebUrl::root(), &creation("/a"))
            .expect("add /a");
        site.add_child_web(&url("/a"), &creation("/a/b"))
            .expect("add /a/b");

        let children = site.child_webs(&WebUrl::root()).expect("children");
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].server_relative_url.as_str(), "/a");
    }

    #[test]
    fn webs_with_children_cannot_be_deleted() {
        let mut site = MemorySite::new("https://contoso.example");
        site.add_child_web(&WebUrl::root(), &creation("/a"))
            .expect("add /a");
        site.add_child_web(&url("/a"), &creation("/a/b"))
            .expect("add /a/b");

        let error = site.delete_web(&url("/a")).expect_err("child exists");
        assert!(matches!(error, RemoteError::Conflict { .. }));
        site.delete_web(&url("/a/b")).expect("leaf delete");
        site.delete_web(&url("/a")).expect("parent delete");
    }

    #[test]
    fn artifact_identity_matches_case_insensitively() {
        let mut site = MemorySite::new("https://contoso.example");
        site.put_artifact(&WebUrl::root(), ArtifactRecord::new(ArtifactKind::List, "Projects"))
            .expect("put");
        let found = site
            .find_artifact(&WebUrl::root(), ArtifactKind::List, "projects")
            .expect("find");
        assert!(found.is_some());
        assert!(
            site.delete_artifact(&WebUrl::root(), ArtifactKind::List, "PROJECTS")
                .expect("delete")
        );
    }

    #[test]
    fn state_survives_save_and_load() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("site.json");
        let mut site = MemorySite::new("https://contoso.example");
        site.activate_feature(&WebUrl::root(), "publishing")
            .expect("activate");
        site.save(&path).expect("save");

        let loaded = MemorySite::load(&path).expect("load");
        assert_eq!(loaded.state(), site.state());
        assert!(loaded.calls().is_empty());
    }
}
