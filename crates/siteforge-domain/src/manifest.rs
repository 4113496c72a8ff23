use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ManifestName;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    #[default]
    FileSystem,
    CloudBlob,
}

/// Declarative description of everything provisioned into one web.
///
/// Collections are keyed by logical name. Creators that do not carry an
/// explicit title or internal name use their key as identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub manifest_name: ManifestName,
    #[serde(default)]
    pub base_file_path: Option<PathBuf>,
    #[serde(default)]
    pub storage_type: StorageKind,
    #[serde(default)]
    pub features_to_add: BTreeSet<String>,
    #[serde(default)]
    pub features_to_remove: BTreeSet<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldCreator>,
    #[serde(default)]
    pub content_types: BTreeMap<String, ContentTypeCreator>,
    #[serde(default)]
    pub list_creators: BTreeMap<String, ListCreator>,
    #[serde(default)]
    pub files: BTreeMap<String, FileCreator>,
    #[serde(default)]
    pub folders: BTreeSet<String>,
    #[serde(default)]
    pub custom_actions: BTreeMap<String, CustomActionCreator>,
    #[serde(default)]
    pub classic_workflows: BTreeMap<String, ClassicWorkflowCreator>,
    #[serde(default)]
    pub role_definitions: BTreeMap<String, RoleDefinitionCreator>,
    #[serde(default)]
    pub groups: BTreeMap<String, GroupCreator>,
    #[serde(default)]
    pub remote_event_registrations: BTreeMap<String, RemoteEventRegistrationCreator>,
    #[serde(default)]
    pub navigation: Option<Navigation>,
    #[serde(default)]
    pub look_and_feel: Option<LookAndFeel>,
    #[serde(default)]
    pub remote_host: Option<String>,
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
}

impl Manifest {
    #[must_use]
    pub fn new(manifest_name: ManifestName) -> Self {
        Self {
            manifest_name,
            base_file_path: None,
            storage_type: StorageKind::FileSystem,
            features_to_add: BTreeSet::new(),
            features_to_remove: BTreeSet::new(),
            fields: BTreeMap::new(),
            content_types: BTreeMap::new(),
            list_creators: BTreeMap::new(),
            files: BTreeMap::new(),
            folders: BTreeSet::new(),
            custom_actions: BTreeMap::new(),
            classic_workflows: BTreeMap::new(),
            role_definitions: BTreeMap::new(),
            groups: BTreeMap::new(),
            remote_event_registrations: BTreeMap::new(),
            navigation: None,
            look_and_feel: None,
            remote_host: None,
            settings: BTreeMap::new(),
        }
    }

    /// Base path is blank when absent or whitespace-only.
    #[must_use]
    pub fn has_base_file_path(&self) -> bool {
        self.base_file_path
            .as_ref()
            .is_some_and(|path| !path.as_os_str().to_string_lossy().trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCreator {
    pub schema_xml: String,
    #[serde(default)]
    pub internal_name: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
}

impl FieldCreator {
    #[must_use]
    pub fn internal_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.internal_name.as_deref().unwrap_or(key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTypeCreator {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Internal names of fields the content type links to.
    #[serde(default)]
    pub field_refs: Vec<String>,
}

impl ContentTypeCreator {
    #[must_use]
    pub fn name<'a>(&'a self, key: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListCreator {
    #[serde(default)]
    pub title: Option<String>,
    pub url: String,
    #[serde(default = "default_list_template")]
    pub template_type: u32,
    #[serde(default)]
    pub description: Option<String>,
    /// Names of content types bound to the list.
    #[serde(default)]
    pub content_types: Vec<String>,
    #[serde(default)]
    pub on_quick_launch: bool,
    /// Web-relative url of a provisioned file used as the list's document template.
    #[serde(default)]
    pub document_template: Option<String>,
    #[serde(default)]
    pub update_existing: bool,
}

const fn default_list_template() -> u32 {
    100
}

impl ListCreator {
    #[must_use]
    pub fn title<'a>(&'a self, key: &'a str) -> &'a str {
        self.title.as_deref().unwrap_or(key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCreator {
    /// Path of the source file relative to the manifest base path. Defaults to the target url.
    #[serde(default)]
    pub source: Option<PathBuf>,
    #[serde(default)]
    pub force_overwrite: bool,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomActionCreator {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub location: String,
    #[serde(default)]
    pub sequence: i32,
    #[serde(default)]
    pub script_block: Option<String>,
    #[serde(default)]
    pub script_src: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl CustomActionCreator {
    #[must_use]
    pub fn title<'a>(&'a self, key: &'a str) -> &'a str {
        self.title.as_deref().unwrap_or(key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassicWorkflowCreator {
    pub list_title: String,
    pub workflow_template: String,
    #[serde(default)]
    pub task_list_title: Option<String>,
    #[serde(default)]
    pub history_list_title: Option<String>,
    #[serde(default)]
    pub start_on_create: bool,
    #[serde(default)]
    pub start_on_change: bool,
    #[serde(default)]
    pub allow_manual_start: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinitionCreator {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub base_permissions: BTreeSet<String>,
    #[serde(default)]
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCreator {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub owner_title: Option<String>,
    #[serde(default)]
    pub allow_members_edit_membership: bool,
    #[serde(default)]
    pub only_allow_members_view_membership: bool,
}

impl GroupCreator {
    #[must_use]
    pub fn title<'a>(&'a self, key: &'a str) -> &'a str {
        self.title.as_deref().unwrap_or(key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEventRegistrationCreator {
    /// List the receiver attaches to; web-scoped when absent.
    #[serde(default)]
    pub list_title: Option<String>,
    pub event_receiver_type: String,
    /// Absolute callback url, or a path resolved against the manifest remote host.
    pub endpoint_url: String,
    #[serde(default = "default_event_sequence")]
    pub sequence: u32,
}

const fn default_event_sequence() -> u32 {
    10_000
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Navigation {
    #[serde(default)]
    pub top_nav: Vec<NavigationNode>,
    #[serde(default)]
    pub left_nav: Vec<NavigationNode>,
    #[serde(default)]
    pub clear_top_menu: bool,
    #[serde(default)]
    pub clear_left_menu: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationNode {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub is_external: bool,
    #[serde(default)]
    pub children: Vec<NavigationNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LookAndFeel {
    #[serde(default)]
    pub site_logo_url: Option<String>,
    #[serde(default)]
    pub alternate_css_url: Option<String>,
    #[serde(default)]
    pub master_page_url: Option<String>,
    #[serde(default)]
    pub custom_master_page_url: Option<String>,
    #[serde(default)]
    pub color_palette_url: Option<String>,
    #[serde(default)]
    pub font_scheme_url: Option<String>,
    #[serde(default)]
    pub background_image_url: Option<String>,
}
