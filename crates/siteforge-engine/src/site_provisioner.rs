use std::borrow::Cow;
use std::path::Path;

use siteforge_domain::{Manifest, SiteDefinition, WebDefinition, WebUrl};
use tracing::info;

use crate::client::{SiteClient, WebCreation, WebInfo};
use crate::error::SiteProvisionError;
use crate::loader::resolve_base_path;
use crate::manifest_provisioner::{ManifestProvisioner, ProvisionOutcome};
use crate::notify::Notifier;
use crate::validate::validate_site_definition;

/// What a site provisioning run changed, in the order it happened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteOutcome {
    pub created_webs: Vec<WebUrl>,
    pub manifests: Vec<(WebUrl, ProvisionOutcome)>,
}

/// Walks a web tree, creating missing child webs and applying each web's
/// manifest.
pub struct SiteProvisioner<'c> {
    client: &'c mut dyn SiteClient,
    notifier: Notifier,
}

fn child_segment<'d>(name: &'d str, child: &'d WebDefinition) -> &'d str {
    let segment = child.relative_url();
    if segment.is_empty() { name } else { segment }
}

fn contains_web(webs: &[WebInfo], url: &WebUrl) -> bool {
    webs.iter().any(|web| web.server_relative_url.same_web(url))
}

/// Embedded manifests without a base path take the definition's; relative
/// ones are resolved against it.
fn with_base_path<'m>(manifest: &'m Manifest, definition: &SiteDefinition) -> Cow<'m, Manifest> {
    let own = manifest.base_file_path.as_deref();
    let inherited = definition
        .base_file_path
        .as_deref()
        .filter(|_| definition.has_base_file_path());
    match inherited {
        Some(base) if !own.is_some_and(Path::is_absolute) => {
            let mut resolved = manifest.clone();
            resolved.base_file_path = Some(resolve_base_path(own, base));
            Cow::Owned(resolved)
        }
        _ => Cow::Borrowed(manifest),
    }
}

impl<'c> SiteProvisioner<'c> {
    pub fn new(client: &'c mut dyn SiteClient, notifier: Notifier) -> Self {
        Self { client, notifier }
    }

    /// Fails before any mutation when the definition must target the site's
    /// root web and `web` is not it.
    fn check_root_web_only(
        &mut self,
        web: &WebUrl,
        definition: &SiteDefinition,
    ) -> Result<(), SiteProvisionError> {
        if !definition.root_web_only {
            return Ok(());
        }
        let context = self
            .client
            .load_context(web)
            .map_err(|source| SiteProvisionError::Context {
                web_url: web.clone(),
                source,
            })?;
        if context.root_web_url.same_web(web) {
            Ok(())
        } else {
            Err(SiteProvisionError::NotRootWeb {
                web_url: web.clone(),
                root_web_url: context.root_web_url,
            })
        }
    }

    /// Provision the tree rooted at `root`. Children are handled in name
    /// order; each child's own children are finished before its manifest is
    /// applied, and the root manifest goes last.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid definitions, when `root_web_only` is
    /// violated, or on the first failed web or manifest. Nothing is rolled back.
    pub fn provision(
        &mut self,
        root: &WebUrl,
        definition: &SiteDefinition,
    ) -> Result<SiteOutcome, SiteProvisionError> {
        validate_site_definition(definition)?;
        self.check_root_web_only(root, definition)?;

        let mut outcome = SiteOutcome::default();
        let root_definition = &definition.web_definition;
        self.provision_children(root, root_definition, definition, &mut outcome)?;
        if let Some(manifest) = &root_definition.manifest {
            self.provision_manifest(root, manifest, definition, &mut outcome)?;
        }
        self.notifier.normal(format!("Successfully provisioned site to web at {root}"));
        Ok(outcome)
    }

    fn provision_children(
        &mut self,
        parent: &WebUrl,
        parent_definition: &WebDefinition,
        definition: &SiteDefinition,
        outcome: &mut SiteOutcome,
    ) -> Result<(), SiteProvisionError> {
        if parent_definition.web_definitions.is_empty() {
            return Ok(());
        }
        let existing = self
            .client
            .child_webs(parent)
            .map_err(|source| SiteProvisionError::Provision {
                web_url: parent.clone(),
                source,
            })?;

        for (name, child) in &parent_definition.web_definitions {
            let url = parent.join(child_segment(name, child));
            if contains_web(&existing, &url) {
                self.notifier.verbose(format!("Web at {url} already exists"));
            } else {
                info!(web = %url, "creating web");
                let creation = WebCreation {
                    url: url.clone(),
                    title: if child.title.is_empty() {
                        name.clone()
                    } else {
                        child.title.clone()
                    },
                    description: child.description.clone(),
                    language: child.language,
                    web_template: child.web_template.clone(),
                    use_same_permissions_as_parent: child.use_same_permissions_as_parent,
                };
                self.client
                    .add_child_web(parent, &creation)
                    .map_err(|source| SiteProvisionError::Provision {
                        web_url: url.clone(),
                        source,
                    })?;
                self.notifier.normal(format!("Created web at {url}"));
                outcome.created_webs.push(url.clone());
            }

            self.provision_children(&url, child, definition, outcome)?;
            if let Some(manifest) = &child.manifest {
                self.provision_manifest(&url, manifest, definition, outcome)?;
            }
        }
        Ok(())
    }

    fn provision_manifest(
        &mut self,
        web: &WebUrl,
        manifest: &Manifest,
        definition: &SiteDefinition,
        outcome: &mut SiteOutcome,
    ) -> Result<(), SiteProvisionError> {
        let manifest = with_base_path(manifest, definition);
        let provisioned = ManifestProvisioner::new(&mut *self.client, self.notifier.clone())
            .provision(web, &manifest)
            .map_err(|source| SiteProvisionError::Manifest {
                web_url: web.clone(),
                source: Box::new(source),
            })?;
        outcome.manifests.push((web.clone(), provisioned));
        Ok(())
    }

    /// Delete every child web in the tree, leaves before parents, then
    /// deprovision the root manifest. Webs that do not exist are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid definitions, when `root_web_only` is
    /// violated, or on the first web or manifest that fails.
    pub fn deprovision(
        &mut self,
        root: &WebUrl,
        definition: &SiteDefinition,
    ) -> Result<Vec<WebUrl>, SiteProvisionError> {
        validate_site_definition(definition)?;
        self.check_root_web_only(root, definition)?;

        let mut deleted = Vec::new();
        let root_definition = &definition.web_definition;
        self.deprovision_children(root, root_definition, &mut deleted)?;
        if let Some(manifest) = &root_definition.manifest {
            let manifest = with_base_path(manifest, definition);
            ManifestProvisioner::new(&mut *self.client, self.notifier.clone())
                .deprovision(root, &manifest)
                .map_err(|source| SiteProvisionError::ManifestDeprovision {
                    web_url: root.clone(),
                    source: Box::new(source),
                })?;
        }
        self.notifier.normal(format!("Successfully deprovisioned site at {root}"));
        Ok(deleted)
    }

    fn deprovision_children(
        &mut self,
        parent: &WebUrl,
        parent_definition: &WebDefinition,
        deleted: &mut Vec<WebUrl>,
    ) -> Result<(), SiteProvisionError> {
        if parent_definition.web_definitions.is_empty() {
            return Ok(());
        }
        let existing = self
            .client
            .child_webs(parent)
            .map_err(|source| SiteProvisionError::Deprovision {
                web_url: parent.clone(),
                source,
            })?;

        for (name, child) in &parent_definition.web_definitions {
            let url = parent.join(child_segment(name, child));
            if !contains_web(&existing, &url) {
                self.notifier.verbose(format!("Web at {url} does not exist"));
                continue;
            }
            self.deprovision_children(&url, child, deleted)?;
            info!(web = %url, "deleting web");
            self.client
                .delete_web(&url)
                .map_err(|source| SiteProvisionError::Deprovision {
                    web_url: url.clone(),
                    source,
                })?;
            self.notifier.normal(format!("Deleted web at {url}"));
            deleted.push(url);
        }
        Ok(())
    }
}
