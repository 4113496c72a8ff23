use siteforge_domain::{ArtifactKind, CustomActionCreator};
use tracing::debug;

use super::{Artifact, ArtifactScope, is_up_to_date, put};
use crate::client::{ArtifactRecord, SiteClient};
use crate::error::ArtifactError;

impl Artifact for CustomActionCreator {
    const KIND: ArtifactKind = ArtifactKind::CustomAction;

    fn identity(&self, key: &str) -> String {
        self.title(key).to_string()
    }

    fn desired_record(
        &self,
        key: &str,
        _scope: ArtifactScope<'_>,
    ) -> Result<ArtifactRecord, ArtifactError> {
        let optional = [
            ("description", &self.description),
            ("script_block", &self.script_block),
            ("script_src", &self.script_src),
            ("url", &self.url),
        ];
        let record = ArtifactRecord::new(Self::KIND, self.identity(key))
            .with("location", self.location.as_str())
            .with("sequence", self.sequence);
        Ok(optional
            .into_iter()
            .fold(record, |record, (name, value)| match value {
                Some(value) => record.with(name, value.as_str()),
                None => record,
            }))
    }

    /// Re-puts the action when any declared property differs.
    fn update(
        &self,
        client: &mut dyn SiteClient,
        key: &str,
        scope: ArtifactScope<'_>,
        existing: &ArtifactRecord,
    ) -> Result<bool, ArtifactError> {
        let desired = self.desired_record(key, scope)?;
        if is_up_to_date(existing, &desired) {
            return Ok(false);
        }
        debug!(action = %desired.identity, "updating custom action");
        let mut merged = existing.clone();
        merged.properties.extend(desired.properties);
        put(client, scope.web, merged)?;
        Ok(true)
    }
}
