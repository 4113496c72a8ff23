use siteforge_domain::{ArtifactKind, ListCreator};
use tracing::debug;

use super::{Artifact, ArtifactScope, is_up_to_date, put, require};
use crate::client::{ArtifactRecord, SiteClient};
use crate::error::ArtifactError;

pub(crate) const DOCUMENT_TEMPLATE_PROPERTY: &str = "document_template_url";

impl Artifact for ListCreator {
    const KIND: ArtifactKind = ArtifactKind::List;

    fn identity(&self, key: &str) -> String {
        self.title(key).to_string()
    }

    fn desired_record(
        &self,
        key: &str,
        _scope: ArtifactScope<'_>,
    ) -> Result<ArtifactRecord, ArtifactError> {
        let mut record = ArtifactRecord::new(Self::KIND, self.identity(key))
            .with("url", self.url.as_str())
            .with("template_type", self.template_type)
            .with("content_types", self.content_types.clone())
            .with("on_quick_launch", self.on_quick_launch);
        if let Some(description) = &self.description {
            record = record.with("description", description.as_str());
        }
        Ok(record)
    }

    fn create(
        &self,
        client: &mut dyn SiteClient,
        key: &str,
        scope: ArtifactScope<'_>,
    ) -> Result<(), ArtifactError> {
        let identity = self.identity(key);
        for content_type in &self.content_types {
            require(
                client,
                scope.web,
                (Self::KIND, identity.as_str()),
                (ArtifactKind::ContentType, content_type.as_str()),
            )?;
        }
        let record = self.desired_record(key, scope)?;
        put(client, scope.web, record)
    }

    /// Lists flagged `update_existing` get their declared properties
    /// re-applied. Properties set by later phases are kept.
    fn update(
        &self,
        client: &mut dyn SiteClient,
        key: &str,
        scope: ArtifactScope<'_>,
        existing: &ArtifactRecord,
    ) -> Result<bool, ArtifactError> {
        if !self.update_existing {
            return Ok(false);
        }
        let desired = self.desired_record(key, scope)?;
        if is_up_to_date(existing, &desired) {
            return Ok(false);
        }
        debug!(list = %desired.identity, "updating list properties");
        let mut merged = existing.clone();
        merged.properties.extend(desired.properties);
        put(client, scope.web, merged)?;
        Ok(true)
    }
}
