use std::collections::BTreeMap;

use siteforge_domain::Manifest;

use crate::artifacts::{ArtifactScope, Folder};
use crate::client::SiteClient;
use crate::error::ArtifactError;
use crate::managers::ArtifactManager;
use crate::notify::Notifier;

/// Uploads files and the folders that hold them.
#[derive(Debug)]
pub struct FileManager<'m> {
    manifest: &'m Manifest,
    notifier: &'m Notifier,
}

fn push_ancestors(folders: &mut BTreeMap<String, Folder>, url: &str, include_self: bool) {
    let segments: Vec<&str> = url
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();
    let last = if include_self {
        segments.len()
    } else {
        segments.len().saturating_sub(1)
    };
    // The first segment is the library itself.
    for end in 2..=last {
        folders.insert(segments[..end].join("/"), Folder);
    }
}

impl<'m> FileManager<'m> {
    #[must_use]
    pub const fn new(manifest: &'m Manifest, notifier: &'m Notifier) -> Self {
        Self { manifest, notifier }
    }

    /// Folders implied by file urls plus declared folders, keyed so that
    /// parents sort before their children.
    #[must_use]
    pub fn folders(&self) -> BTreeMap<String, Folder> {
        let mut folders = BTreeMap::new();
        for url in self.manifest.files.keys() {
            push_ancestors(&mut folders, url, false);
        }
        for url in &self.manifest.folders {
            push_ancestors(&mut folders, url, true);
        }
        folders
    }

    /// # Errors
    ///
    /// Stops at the first folder or file that cannot be created.
    pub fn provision(
        &self,
        client: &mut dyn SiteClient,
        scope: ArtifactScope<'_>,
    ) -> Result<(), ArtifactError> {
        let folders = self.folders();
        ArtifactManager::new(&folders, self.notifier).create_all(client, scope)?;
        ArtifactManager::new(&self.manifest.files, self.notifier).create_all(client, scope)
    }

    /// Files first, then folders with children before parents.
    ///
    /// # Errors
    ///
    /// Stops at the first folder or file that cannot be deleted.
    pub fn deprovision(
        &self,
        client: &mut dyn SiteClient,
        scope: ArtifactScope<'_>,
    ) -> Result<(), ArtifactError> {
        ArtifactManager::new(&self.manifest.files, self.notifier).delete_all(client, scope)?;
        let folders = self.folders();
        ArtifactManager::new(&folders, self.notifier).delete_all(client, scope)
    }
}
