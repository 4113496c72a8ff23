use siteforge_domain::{ArtifactKind, Manifest, WebUrl};

use crate::client::{ArtifactRecord, SiteClient};
use crate::error::ArtifactError;

mod content_types;
mod custom_actions;
mod events;
mod fields;
mod files;
mod groups;
mod lists;
mod role_definitions;
mod workflows;

pub use files::{Folder, content_hash};
pub(crate) use lists::DOCUMENT_TEMPLATE_PROPERTY;
pub(crate) use workflows::{scripted_association, workflow_identity};

/// Where an artifact is provisioned and the manifest it came from.
#[derive(Debug, Clone, Copy)]
pub struct ArtifactScope<'a> {
    pub web: &'a WebUrl,
    pub manifest: &'a Manifest,
}

/// Per-kind provisioning capability. Creators are keyed by their logical
/// name in the manifest; `key` is passed to every call so identities can
/// fall back to it.
pub trait Artifact {
    const KIND: ArtifactKind;

    fn identity(&self, key: &str) -> String;

    /// Remote state this creator declares.
    ///
    /// # Errors
    ///
    /// Returns an error when the declared state cannot be assembled.
    fn desired_record(&self, key: &str, scope: ArtifactScope<'_>)
    -> Result<ArtifactRecord, ArtifactError>;

    /// # Errors
    ///
    /// Returns an error when the lookup fails.
    fn find(
        &self,
        client: &mut dyn SiteClient,
        key: &str,
        scope: ArtifactScope<'_>,
    ) -> Result<Option<ArtifactRecord>, ArtifactError> {
        let identity = self.identity(key);
        client
            .find_artifact(scope.web, Self::KIND, &identity)
            .map_err(|source| ArtifactError::remote(Self::KIND, identity, source))
    }

    /// # Errors
    ///
    /// Returns an error when the lookup fails.
    fn exists(
        &self,
        client: &mut dyn SiteClient,
        key: &str,
        scope: ArtifactScope<'_>,
    ) -> Result<bool, ArtifactError> {
        Ok(self.find(client, key, scope)?.is_some())
    }

    /// # Errors
    ///
    /// Returns an error when a dependency is missing or the write fails.
    fn create(
        &self,
        client: &mut dyn SiteClient,
        key: &str,
        scope: ArtifactScope<'_>,
    ) -> Result<(), ArtifactError> {
        let record = self.desired_record(key, scope)?;
        put(client, scope.web, record)
    }

    /// Bring an existing artifact in line with the creator. Returns whether
    /// anything was written.
    ///
    /// # Errors
    ///
    /// Returns an error when the write fails.
    fn update(
        &self,
        _client: &mut dyn SiteClient,
        _key: &str,
        _scope: ArtifactScope<'_>,
        _existing: &ArtifactRecord,
    ) -> Result<bool, ArtifactError> {
        Ok(false)
    }

    /// Returns whether the artifact existed.
    ///
    /// # Errors
    ///
    /// Returns an error when the delete fails.
    fn delete(
        &self,
        client: &mut dyn SiteClient,
        key: &str,
        scope: ArtifactScope<'_>,
    ) -> Result<bool, ArtifactError> {
        let identity = self.identity(key);
        client
            .delete_artifact(scope.web, Self::KIND, &identity)
            .map_err(|source| ArtifactError::remote(Self::KIND, identity, source))
    }
}

pub(crate) fn put(
    client: &mut dyn SiteClient,
    web: &WebUrl,
    record: ArtifactRecord,
) -> Result<(), ArtifactError> {
    let kind = record.kind;
    let identity = record.identity.clone();
    client
        .put_artifact(web, record)
        .map_err(|source| ArtifactError::remote(kind, identity, source))
}

/// Fail with `MissingDependency` unless `dependency` exists on the web.
pub(crate) fn require(
    client: &mut dyn SiteClient,
    web: &WebUrl,
    (kind, identity): (ArtifactKind, &str),
    (dependency_kind, dependency): (ArtifactKind, &str),
) -> Result<ArtifactRecord, ArtifactError> {
    client
        .find_artifact(web, dependency_kind, dependency)
        .map_err(|source| ArtifactError::remote(dependency_kind, dependency, source))?
        .ok_or_else(|| ArtifactError::MissingDependency {
            kind,
            identity: identity.to_string(),
            dependency_kind,
            dependency: dependency.to_string(),
        })
}

/// Whether every property of `desired` already holds on `existing`.
pub(crate) fn is_up_to_date(existing: &ArtifactRecord, desired: &ArtifactRecord) -> bool {
    desired
        .properties
        .iter()
        .all(|(name, value)| existing.properties.get(name) == Some(value))
}
