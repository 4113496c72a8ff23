use siteforge_domain::{ArtifactKind, FieldCreator};

use super::{Artifact, ArtifactScope};
use crate::client::ArtifactRecord;
use crate::error::ArtifactError;

impl Artifact for FieldCreator {
    const KIND: ArtifactKind = ArtifactKind::Field;

    fn identity(&self, key: &str) -> String {
        self.internal_name(key).to_string()
    }

    fn desired_record(
        &self,
        key: &str,
        _scope: ArtifactScope<'_>,
    ) -> Result<ArtifactRecord, ArtifactError> {
        let record = ArtifactRecord::new(Self::KIND, self.identity(key))
            .with("schema_xml", self.schema_xml.as_str());
        Ok(match &self.group {
            Some(group) => record.with("group", group.as_str()),
            None => record,
        })
    }
}
