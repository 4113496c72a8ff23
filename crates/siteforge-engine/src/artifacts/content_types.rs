use siteforge_domain::{ArtifactKind, ContentTypeCreator};

use super::{Artifact, ArtifactScope, put, require};
use crate::client::{ArtifactRecord, SiteClient};
use crate::error::ArtifactError;

impl Artifact for ContentTypeCreator {
    const KIND: ArtifactKind = ArtifactKind::ContentType;

    fn identity(&self, key: &str) -> String {
        self.name(key).to_string()
    }

    fn desired_record(
        &self,
        key: &str,
        _scope: ArtifactScope<'_>,
    ) -> Result<ArtifactRecord, ArtifactError> {
        let mut record = ArtifactRecord::new(Self::KIND, self.identity(key))
            .with("id", self.id.as_str())
            .with("field_refs", self.field_refs.clone());
        if let Some(group) = &self.group {
            record = record.with("group", group.as_str());
        }
        if let Some(description) = &self.description {
            record = record.with("description", description.as_str());
        }
        Ok(record)
    }

    /// Linked fields must already exist on the web.
    fn create(
        &self,
        client: &mut dyn SiteClient,
        key: &str,
        scope: ArtifactScope<'_>,
    ) -> Result<(), ArtifactError> {
        let identity = self.identity(key);
        for field in &self.field_refs {
            require(
                client,
                scope.web,
                (Self::KIND, identity.as_str()),
                (ArtifactKind::Field, field.as_str()),
            )?;
        }
        let record = self.desired_record(key, scope)?;
        put(client, scope.web, record)
    }
}
