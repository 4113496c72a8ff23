use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{Manifest, StorageKind};

/// Recursive description of a web tree rooted at an existing web.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteDefinition {
    #[serde(default)]
    pub storage_type: StorageKind,
    #[serde(default)]
    pub base_file_path: Option<PathBuf>,
    #[serde(default)]
    pub root_web_only: bool,
    pub web_definition: WebDefinition,
}

impl SiteDefinition {
    #[must_use]
    pub fn has_base_file_path(&self) -> bool {
        self.base_file_path
            .as_ref()
            .is_some_and(|path| !path.as_os_str().to_string_lossy().trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebDefinition {
    /// Url segment relative to the parent web. Empty (or `/`) for the root definition.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_language")]
    pub language: u32,
    #[serde(default = "default_web_template")]
    pub web_template: String,
    #[serde(default = "default_true")]
    pub use_same_permissions_as_parent: bool,
    #[serde(default)]
    pub manifest: Option<Manifest>,
    #[serde(default)]
    pub web_definitions: BTreeMap<String, WebDefinition>,
}

const fn default_language() -> u32 {
    1033
}

fn default_web_template() -> String {
    "STS#0".to_string()
}

const fn default_true() -> bool {
    true
}

impl WebDefinition {
    /// The url segment with one leading `/` removed.
    #[must_use]
    pub fn relative_url(&self) -> &str {
        self.url.strip_prefix('/').unwrap_or(&self.url)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::SiteDefinition;

    #[test]
    fn nested_definitions_parse_with_defaults() {
        let definition: SiteDefinition = serde_json::from_str(
            r#"{
                "base_file_path": "/srv/assets",
                "web_definition": {
                    "url": "/",
                    "web_definitions": {
                        "hr": { "url": "/hr", "title": "Human Resources" }
                    }
                }
            }"#,
        )
        .expect("parse");

        let child = &definition.web_definition.web_definitions["hr"];
        assert_eq!(child.relative_url(), "hr");
        assert_eq!(child.language, 1033);
        assert_eq!(child.web_template, "STS#0");
        assert!(child.use_same_permissions_as_parent);
        assert_eq!(definition.web_definition.relative_url(), "");
        assert!(definition.has_base_file_path());
    }
}
