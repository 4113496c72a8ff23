use std::collections::BTreeMap;

use tracing::debug;

use crate::artifacts::{Artifact, ArtifactScope};
use crate::client::SiteClient;
use crate::error::ArtifactError;
use crate::notify::Notifier;

mod document_templates;
mod features;
mod files;
mod look_and_feel;
mod navigation;
mod workflows;

pub use document_templates::DocumentTemplateManager;
pub use features::FeatureManager;
pub use files::FileManager;
pub use look_and_feel::LookAndFeelManager;
pub use navigation::{NavigationManager, navigation_action_title};
pub use workflows::{WorkflowManager, workflow_action_title};

/// Creates or deletes every creator of one kind, in key order.
#[derive(Debug)]
pub struct ArtifactManager<'m, A> {
    creators: &'m BTreeMap<String, A>,
    notifier: &'m Notifier,
}

impl<'m, A: Artifact> ArtifactManager<'m, A> {
    #[must_use]
    pub const fn new(creators: &'m BTreeMap<String, A>, notifier: &'m Notifier) -> Self {
        Self { creators, notifier }
    }

    /// Create missing artifacts and offer existing ones an update.
    ///
    /// # Errors
    ///
    /// Stops at the first artifact that cannot be read or written.
    pub fn create_all(
        &self,
        client: &mut dyn SiteClient,
        scope: ArtifactScope<'_>,
    ) -> Result<(), ArtifactError> {
        for (key, creator) in self.creators {
            let identity = creator.identity(key);
            match creator.find(client, key, scope)? {
                Some(existing) => {
                    if creator.update(client, key, scope, &existing)? {
                        self.notifier.normal(format!("Updated {} {identity}", A::KIND));
                    } else {
                        self.notifier.verbose(format!("{} {identity} already exists", A::KIND));
                    }
                }
                None => {
                    debug!(kind = %A::KIND, %identity, web = %scope.web, "creating artifact");
                    creator.create(client, key, scope)?;
                    self.notifier.normal(format!("Created {} {identity}", A::KIND));
                }
            }
        }
        Ok(())
    }

    /// Delete artifacts in reverse key order. Absent artifacts are skipped.
    ///
    /// # Errors
    ///
    /// Stops at the first artifact that cannot be deleted.
    pub fn delete_all(
        &self,
        client: &mut dyn SiteClient,
        scope: ArtifactScope<'_>,
    ) -> Result<(), ArtifactError> {
        for (key, creator) in self.creators.iter().rev() {
            let identity = creator.identity(key);
            if creator.delete(client, key, scope)? {
                self.notifier.normal(format!("Deleted {} {identity}", A::KIND));
            } else {
                self.notifier.verbose(format!("{} {identity} does not exist", A::KIND));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use std::collections::BTreeMap;

    use siteforge_domain::{ArtifactKind, FieldCreator, Manifest, ManifestName, WebUrl};

    use super::ArtifactManager;
    use crate::artifacts::ArtifactScope;
    use crate::memory::MemorySite;
    use crate::notify::NotificationLog;

    fn fields() -> BTreeMap<String, FieldCreator> {
        ["Alpha", "Beta"]
            .into_iter()
            .map(|name| {
                (
                    name.to_string(),
                    FieldCreator {
                        schema_xml: format!("<Field Name=\"{name}\"/>"),
                        internal_name: None,
                        group: None,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn second_create_reports_existing_artifacts() {
        let manifest = Manifest::new(ManifestName::try_from("intranet").expect("name"));
        let web = WebUrl::root();
        let scope = ArtifactScope {
            web: &web,
            manifest: &manifest,
        };
        let creators = fields();
        let log = NotificationLog::new();
        let notifier = log.notifier();
        let manager = ArtifactManager::new(&creators, &notifier);
        let mut site = MemorySite::new("https://contoso.example");

        manager.create_all(&mut site, scope).expect("first run");
        manager.create_all(&mut site, scope).expect("second run");

        assert_eq!(
            log.details(),
            vec![
                "Created field Alpha",
                "Created field Beta",
                "field Alpha already exists",
                "field Beta already exists",
            ]
        );
        assert!(site.artifact(&web, ArtifactKind::Field, "Beta").is_some());
    }

    #[test]
    fn delete_runs_in_reverse_and_tolerates_absent_artifacts() {
        let manifest = Manifest::new(ManifestName::try_from("intranet").expect("name"));
        let web = WebUrl::root();
        let scope = ArtifactScope {
            web: &web,
            manifest: &manifest,
        };
        let creators = fields();
        let log = NotificationLog::new();
        let notifier = log.notifier();
        let manager = ArtifactManager::new(&creators, &notifier);
        let mut site = MemorySite::new("https://contoso.example");
        manager.create_all(&mut site, scope).expect("create");

        manager.delete_all(&mut site, scope).expect("delete");
        manager.delete_all(&mut site, scope).expect("delete again");

        let details = log.details();
        assert_eq!(
            details[2..],
            [
                "Deleted field Beta",
                "Deleted field Alpha",
                "field Beta does not exist",
                "field Alpha does not exist",
            ]
        );
    }
}
