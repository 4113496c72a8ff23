use siteforge_domain::{ArtifactKind, RoleDefinitionCreator};

use super::{Artifact, ArtifactScope};
use crate::client::ArtifactRecord;
use crate::error::ArtifactError;

impl Artifact for RoleDefinitionCreator {
    const KIND: ArtifactKind = ArtifactKind::RoleDefinition;

    fn identity(&self, key: &str) -> String {
        key.to_string()
    }

    fn desired_record(
        &self,
        key: &str,
        _scope: ArtifactScope<'_>,
    ) -> Result<ArtifactRecord, ArtifactError> {
        let permissions: Vec<&str> = self.base_permissions.iter().map(String::as_str).collect();
        let mut record = ArtifactRecord::new(Self::KIND, key)
            .with("base_permissions", permissions)
            .with("order", self.order);
        if let Some(description) = &self.description {
            record = record.with("description", description.as_str());
        }
        Ok(record)
    }
}
