use siteforge_domain::{ArtifactKind, ListCreator};

use crate::artifacts::{ArtifactScope, DOCUMENT_TEMPLATE_PROPERTY, put, require};
use crate::client::SiteClient;
use crate::error::ArtifactError;
use crate::notify::Notifier;

/// Points document libraries at template files uploaded earlier in the run.
#[derive(Debug)]
pub struct DocumentTemplateManager<'m> {
    notifier: &'m Notifier,
}

impl<'m> DocumentTemplateManager<'m> {
    #[must_use]
    pub const fn new(notifier: &'m Notifier) -> Self {
        Self { notifier }
    }

    /// Lists that declare a document template, with their template url.
    pub fn templated_lists<'s>(
        lists: impl IntoIterator<Item = (&'s String, &'s ListCreator)>,
    ) -> impl Iterator<Item = (&'s str, &'s ListCreator, &'s str)> {
        lists.into_iter().filter_map(|(key, list)| {
            list.document_template
                .as_deref()
                .map(|template| (key.as_str(), list, template))
        })
    }

    /// # Errors
    ///
    /// Returns an error when a list or its template file is missing, or the list cannot be written.
    pub fn apply(
        &self,
        client: &mut dyn SiteClient,
        scope: ArtifactScope<'_>,
    ) -> Result<(), ArtifactError> {
        for (key, list, template) in Self::templated_lists(&scope.manifest.list_creators) {
            let title = list.title(key);
            let template_file = template.trim_start_matches('/');
            require(
                client,
                scope.web,
                (ArtifactKind::List, title),
                (ArtifactKind::File, template_file),
            )?;
            let existing = require(
                client,
                scope.web,
                (ArtifactKind::List, title),
                (ArtifactKind::List, title),
            )?;

            let template_url = scope.web.join(template_file).to_string();
            if existing.property(DOCUMENT_TEMPLATE_PROPERTY) == Some(template_url.as_str()) {
                self.notifier.verbose(format!(
                    "Document template of list {title} is already {template_url}"
                ));
                continue;
            }
            put(
                client,
                scope.web,
                existing.with(DOCUMENT_TEMPLATE_PROPERTY, template_url.as_str()),
            )?;
            self.notifier.normal(format!(
                "Set document template of list {title} to {template_url}"
            ));
        }
        Ok(())
    }
}
