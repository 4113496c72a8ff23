use siteforge_domain::{ArtifactKind, GroupCreator};

use super::{Artifact, ArtifactScope};
use crate::client::ArtifactRecord;
use crate::error::ArtifactError;

impl Artifact for GroupCreator {
    const KIND: ArtifactKind = ArtifactKind::Group;

    fn identity(&self, key: &str) -> String {
        self.title(key).to_string()
    }

    fn desired_record(
        &self,
        key: &str,
        _scope: ArtifactScope<'_>,
    ) -> Result<ArtifactRecord, ArtifactError> {
        let mut record = ArtifactRecord::new(Self::KIND, self.identity(key))
            .with(
                "allow_members_edit_membership",
                self.allow_members_edit_membership,
            )
            .with(
                "only_allow_members_view_membership",
                self.only_allow_members_view_membership,
            );
        if let Some(description) = &self.description {
            record = record.with("description", description.as_str());
        }
        if let Some(owner) = &self.owner_title {
            record = record.with("owner_title", owner.as_str());
        }
        Ok(record)
    }
}
