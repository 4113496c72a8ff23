use std::fs;

use sha2::{Digest, Sha256};
use siteforge_domain::{ArtifactKind, FileCreator};

use super::{Artifact, ArtifactScope, put};
use crate::client::{ArtifactRecord, SiteClient};
use crate::error::{ArtifactError, ConfigurationError};

/// Lowercase hex SHA-256 of `contents`.
#[must_use]
pub fn content_hash(contents: &[u8]) -> String {
    Sha256::digest(contents)
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

impl Artifact for FileCreator {
    const KIND: ArtifactKind = ArtifactKind::File;

    fn identity(&self, key: &str) -> String {
        key.trim_start_matches('/').to_string()
    }

    fn desired_record(
        &self,
        key: &str,
        scope: ArtifactScope<'_>,
    ) -> Result<ArtifactRecord, ArtifactError> {
        let identity = self.identity(key);
        let base = scope
            .manifest
            .base_file_path
            .as_deref()
            .filter(|_| scope.manifest.has_base_file_path())
            .ok_or(ConfigurationError::MissingBaseFilePath)?;
        let path = match &self.source {
            Some(source) => base.join(source),
            None => base.join(&identity),
        };
        let contents = fs::read(&path).map_err(|source| ArtifactError::ReadSource {
            kind: Self::KIND,
            identity: identity.clone(),
            path: path.clone(),
            source,
        })?;
        let properties = serde_json::to_value(&self.properties).map_err(|source| {
            ArtifactError::Encode {
                what: "file properties",
                source,
            }
        })?;

        Ok(ArtifactRecord::new(Self::KIND, identity)
            .with("source", path.display().to_string())
            .with("hash", content_hash(&contents))
            .with("size", contents.len())
            .with("properties", properties))
    }

    /// Re-upload only when overwriting is forced and the content changed.
    fn update(
        &self,
        client: &mut dyn SiteClient,
        key: &str,
        scope: ArtifactScope<'_>,
        existing: &ArtifactRecord,
    ) -> Result<bool, ArtifactError> {
        if !self.force_overwrite {
            return Ok(false);
        }
        let desired = self.desired_record(key, scope)?;
        if existing.property("hash") == desired.property("hash") {
            return Ok(false);
        }
        put(client, scope.web, desired)?;
        Ok(true)
    }
}

/// A folder inside a document library, identified by its web-relative url.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Folder;

impl Artifact for Folder {
    const KIND: ArtifactKind = ArtifactKind::Folder;

    fn identity(&self, key: &str) -> String {
        key.trim_matches('/').to_string()
    }

    fn desired_record(
        &self,
        key: &str,
        _scope: ArtifactScope<'_>,
    ) -> Result<ArtifactRecord, ArtifactError> {
        Ok(ArtifactRecord::new(Self::KIND, self.identity(key)))
    }
}
