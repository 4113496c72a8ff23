use std::collections::BTreeMap;

use siteforge_domain::{ArtifactKind, CustomActionCreator, Manifest, WebUrl};
use tracing::info;

use crate::artifacts::ArtifactScope;
use crate::client::{SiteClient, SiteContext};
use crate::error::{ArtifactError, ProvisionError};
use crate::managers::{
    ArtifactManager, DocumentTemplateManager, FeatureManager, FileManager, LookAndFeelManager,
    NavigationManager, WorkflowManager, navigation_action_title, workflow_action_title,
};
use crate::notify::Notifier;
use crate::phase::{DEPROVISION_PHASES, PROVISION_PHASES, Phase};
use crate::validate::validate_manifest;

/// What a provisioning run did besides creating declared artifacts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionOutcome {
    /// Custom actions synthesized during the run, keyed by title.
    pub injected_custom_actions: BTreeMap<String, CustomActionCreator>,
    pub phases_run: Vec<Phase>,
}

/// Per-call state. The context is loaded once and everything derived from
/// it is memoized here.
struct Run<'r> {
    web: &'r WebUrl,
    manifest: &'r Manifest,
    context: SiteContext,
    pending_custom_actions: BTreeMap<String, CustomActionCreator>,
}

impl<'r> Run<'r> {
    const fn scope(&self) -> ArtifactScope<'r> {
        ArtifactScope {
            web: self.web,
            manifest: self.manifest,
        }
    }

    fn is_host_web(&self) -> bool {
        !self.context.web.is_app_web()
    }

    fn has_work(&self, phase: Phase, anonymous: bool) -> bool {
        let manifest = self.manifest;
        if phase.is_host_only() && !self.is_host_web() {
            return false;
        }
        match phase {
            Phase::AddFeatures => !manifest.features_to_add.is_empty(),
            Phase::RemoveFeatures => !manifest.features_to_remove.is_empty(),
            Phase::ProvisionGroups => !manifest.groups.is_empty(),
            Phase::ProvisionRoleDefinitions => !manifest.role_definitions.is_empty(),
            Phase::ProvisionFields | Phase::DeleteFields => !manifest.fields.is_empty(),
            Phase::ProvisionContentTypes | Phase::DeleteContentTypes => {
                !manifest.content_types.is_empty()
            }
            Phase::ProvisionLists | Phase::DeleteLists => !manifest.list_creators.is_empty(),
            Phase::ProvisionFiles | Phase::DeleteFiles => {
                !manifest.files.is_empty() || !manifest.folders.is_empty()
            }
            Phase::ProvisionNavigation => manifest.navigation.is_some(),
            Phase::ProvisionClassicWorkflows => !manifest.classic_workflows.is_empty(),
            Phase::ProvisionCustomActions => {
                !manifest.custom_actions.is_empty() || !self.pending_custom_actions.is_empty()
            }
            Phase::DeleteCustomActions => {
                !manifest.custom_actions.is_empty() || !self.injected_titles(anonymous).is_empty()
            }
            Phase::AttachEvents | Phase::DetachEvents => {
                !manifest.remote_event_registrations.is_empty()
            }
            Phase::ApplyDocumentTemplates => {
                DocumentTemplateManager::templated_lists(&manifest.list_creators)
                    .next()
                    .is_some()
            }
            Phase::ProvisionLookAndFeel => manifest.look_and_feel.is_some(),
            Phase::ApplySettings => !manifest.settings.is_empty(),
        }
    }

    /// Titles of custom actions a provisioning run of this manifest would
    /// have injected into this web.
    fn injected_titles(&self, anonymous: bool) -> Vec<String> {
        let mut titles = Vec::new();
        if self.manifest.navigation.is_some() && !self.is_host_web() {
            titles.push(navigation_action_title(&self.manifest.manifest_name));
        }
        if anonymous && !self.manifest.classic_workflows.is_empty() {
            titles.push(workflow_action_title(&self.manifest.manifest_name));
        }
        titles
    }
}

/// Applies one manifest to one web in a fixed phase order.
pub struct ManifestProvisioner<'c> {
    client: &'c mut dyn SiteClient,
    notifier: Notifier,
}

impl<'c> ManifestProvisioner<'c> {
    pub fn new(client: &'c mut dyn SiteClient, notifier: Notifier) -> Self {
        Self { client, notifier }
    }

    fn begin<'r>(
        &mut self,
        web: &'r WebUrl,
        manifest: &'r Manifest,
    ) -> Result<Run<'r>, ProvisionError> {
        validate_manifest(manifest)?;
        let context = self
            .client
            .load_context(web)
            .map_err(|source| ProvisionError::Context {
                web_url: web.clone(),
                source,
            })?;
        Ok(Run {
            web,
            manifest,
            context,
            pending_custom_actions: BTreeMap::new(),
        })
    }

    /// Provision every artifact the manifest declares. Phases with nothing
    /// to do are skipped silently.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid manifests, when the web cannot be
    /// loaded, or when any phase fails. Earlier phases stay applied.
    pub fn provision(
        &mut self,
        web: &WebUrl,
        manifest: &Manifest,
    ) -> Result<ProvisionOutcome, ProvisionError> {
        let mut run = self.begin(web, manifest)?;
        let anonymous = self.client.authentication_mode().is_anonymous();
        let mut outcome = ProvisionOutcome::default();

        for phase in PROVISION_PHASES {
            if !run.has_work(phase, anonymous) {
                continue;
            }
            info!(%phase, manifest = %manifest.manifest_name, web = %web, "running phase");
            self.run_provision_phase(phase, &mut run)
                .map_err(|source| ProvisionError::Phase {
                    manifest: manifest.manifest_name.to_string(),
                    web_url: web.clone(),
                    phase,
                    source,
                })?;
            self.notifier.verbose(format!("Completed {phase}"));
            outcome.phases_run.push(phase);
        }

        outcome.injected_custom_actions = run.pending_custom_actions;
        self.notifier.normal(format!(
            "Successfully provisioned manifest {} to web at {web}",
            manifest.manifest_name
        ));
        Ok(outcome)
    }

    fn run_provision_phase(
        &mut self,
        phase: Phase,
        run: &mut Run<'_>,
    ) -> Result<(), ArtifactError> {
        let client = &mut *self.client;
        let notifier = &self.notifier;
        let manifest = run.manifest;
        let scope = run.scope();

        match phase {
            Phase::AddFeatures => {
                FeatureManager::new(notifier).add(client, run.web, &manifest.features_to_add)
            }
            Phase::RemoveFeatures => {
                FeatureManager::new(notifier).remove(client, run.web, &manifest.features_to_remove)
            }
            Phase::ProvisionGroups => {
                ArtifactManager::new(&manifest.groups, notifier).create_all(client, scope)
            }
            Phase::ProvisionRoleDefinitions => {
                ArtifactManager::new(&manifest.role_definitions, notifier).create_all(client, scope)
            }
            Phase::ProvisionFields => {
                ArtifactManager::new(&manifest.fields, notifier).create_all(client, scope)
            }
            Phase::ProvisionContentTypes => {
                ArtifactManager::new(&manifest.content_types, notifier).create_all(client, scope)
            }
            Phase::ProvisionLists => {
                ArtifactManager::new(&manifest.list_creators, notifier).create_all(client, scope)
            }
            Phase::ProvisionFiles => FileManager::new(manifest, notifier).provision(client, scope),
            Phase::ProvisionNavigation => {
                let Some(navigation) = &manifest.navigation else {
                    return Ok(());
                };
                let is_host_web = run.is_host_web();
                let injected = NavigationManager::new(notifier).provision(
                    client,
                    scope,
                    navigation,
                    is_host_web,
                )?;
                run.pending_custom_actions.extend(injected);
                Ok(())
            }
            Phase::ProvisionClassicWorkflows => {
                let injected = WorkflowManager::new(&manifest.classic_workflows, notifier)
                    .provision(client, scope)?;
                run.pending_custom_actions.extend(injected);
                Ok(())
            }
            Phase::ProvisionCustomActions => {
                let mut custom_actions = manifest.custom_actions.clone();
                custom_actions.extend(
                    run.pending_custom_actions
                        .iter()
                        .map(|(title, action)| (title.clone(), action.clone())),
                );
                ArtifactManager::new(&custom_actions, notifier).create_all(client, scope)
            }
            Phase::AttachEvents => {
                ArtifactManager::new(&manifest.remote_event_registrations, notifier)
                    .create_all(client, scope)
            }
            Phase::ApplyDocumentTemplates => {
                DocumentTemplateManager::new(notifier).apply(client, scope)
            }
            Phase::ProvisionLookAndFeel => match &manifest.look_and_feel {
                Some(settings) => {
                    LookAndFeelManager::new(notifier).apply(client, run.web, settings)
                }
                None => Ok(()),
            },
            Phase::DeleteCustomActions
            | Phase::DeleteFiles
            | Phase::DetachEvents
            | Phase::DeleteLists
            | Phase::DeleteContentTypes
            | Phase::DeleteFields
            | Phase::ApplySettings => Ok(()),
        }
    }

    /// Remove what the manifest provisioned, referencing artifacts first.
    /// Features, groups, role definitions, navigation and look and feel are
    /// left in place.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid manifests, when the web cannot be
    /// loaded, or when any phase fails.
    pub fn deprovision(
        &mut self,
        web: &WebUrl,
        manifest: &Manifest,
    ) -> Result<Vec<Phase>, ProvisionError> {
        let run = self.begin(web, manifest)?;
        let anonymous = self.client.authentication_mode().is_anonymous();
        let mut phases_run = Vec::new();

        for phase in DEPROVISION_PHASES {
            if !run.has_work(phase, anonymous) {
                continue;
            }
            info!(%phase, manifest = %manifest.manifest_name, web = %web, "running phase");
            self.run_deprovision_phase(phase, &run, anonymous)
                .map_err(|source| ProvisionError::DeprovisionPhase {
                    manifest: manifest.manifest_name.to_string(),
                    web_url: web.clone(),
                    phase,
                    source,
                })?;
            self.notifier.verbose(format!("Completed {phase}"));
            phases_run.push(phase);
        }

        self.notifier.normal(format!(
            "Successfully deprovisioned manifest {} from web at {web}",
            manifest.manifest_name
        ));
        Ok(phases_run)
    }

    fn run_deprovision_phase(
        &mut self,
        phase: Phase,
        run: &Run<'_>,
        anonymous: bool,
    ) -> Result<(), ArtifactError> {
        let client = &mut *self.client;
        let notifier = &self.notifier;
        let manifest = run.manifest;
        let scope = run.scope();

        match phase {
            Phase::DeleteCustomActions => {
                let mut custom_actions = manifest.custom_actions.clone();
                for title in run.injected_titles(anonymous) {
                    custom_actions.insert(
                        title.clone(),
                        CustomActionCreator {
                            title: Some(title),
                            description: None,
                            location: "ScriptLink".to_string(),
                            sequence: 0,
                            script_block: None,
                            script_src: None,
                            url: None,
                        },
                    );
                }
                ArtifactManager::new(&custom_actions, notifier).delete_all(client, scope)
            }
            Phase::DeleteFiles => FileManager::new(manifest, notifier).deprovision(client, scope),
            Phase::DetachEvents => {
                ArtifactManager::new(&manifest.remote_event_registrations, notifier)
                    .delete_all(client, scope)
            }
            Phase::DeleteLists => {
                ArtifactManager::new(&manifest.list_creators, notifier).delete_all(client, scope)
            }
            Phase::DeleteContentTypes => {
                ArtifactManager::new(&manifest.content_types, notifier).delete_all(client, scope)
            }
            Phase::DeleteFields => {
                ArtifactManager::new(&manifest.fields, notifier).delete_all(client, scope)
            }
            _ => Ok(()),
        }
    }

    /// Write the manifest's settings into the web property bag. Runs only
    /// when asked for, never as part of [`ManifestProvisioner::provision`].
    ///
    /// # Errors
    ///
    /// Returns an error when the web cannot be loaded or a property cannot be written.
    pub fn apply_settings(
        &mut self,
        web: &WebUrl,
        manifest: &Manifest,
    ) -> Result<(), ProvisionError> {
        let run = self.begin(web, manifest)?;
        if !run.has_work(Phase::ApplySettings, false) {
            return Ok(());
        }
        let phase_error = |source| ProvisionError::Phase {
            manifest: manifest.manifest_name.to_string(),
            web_url: web.clone(),
            phase: Phase::ApplySettings,
            source,
        };

        for (key, value) in &manifest.settings {
            if run.context.web.properties.get(key) == Some(value) {
                self.notifier.verbose(format!("Web property {key} is already set"));
                continue;
            }
            self.client
                .set_web_property(web, key, value)
                .map_err(|source| ArtifactError::remote(ArtifactKind::WebProperty, key, source))
                .map_err(phase_error)?;
            self.notifier.normal(format!("Set web property {key}"));
        }
        self.notifier.verbose(format!("Completed {}", Phase::ApplySettings));
        Ok(())
    }
}

#[cfg(test)]
mod tests;
