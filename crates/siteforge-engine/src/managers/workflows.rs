use std::collections::BTreeMap;

use siteforge_domain::{ClassicWorkflowCreator, CustomActionCreator};

use crate::artifacts::{Artifact, ArtifactScope, scripted_association};
use crate::client::SiteClient;
use crate::error::ArtifactError;
use crate::managers::ArtifactManager;
use crate::notify::Notifier;
use crate::scripts::render_workflow_association_script;

const WORKFLOW_ACTION_PREFIX: &str = "AppWorkflowAssociationCustomAction";

#[must_use]
pub fn workflow_action_title(manifest_name: &str) -> String {
    format!("{WORKFLOW_ACTION_PREFIX}{manifest_name}")
}

/// Associates classic workflows with lists.
#[derive(Debug)]
pub struct WorkflowManager<'m> {
    workflows: &'m BTreeMap<String, ClassicWorkflowCreator>,
    notifier: &'m Notifier,
}

impl<'m> WorkflowManager<'m> {
    #[must_use]
    pub const fn new(
        workflows: &'m BTreeMap<String, ClassicWorkflowCreator>,
        notifier: &'m Notifier,
    ) -> Self {
        Self {
            workflows,
            notifier,
        }
    }

    /// Interactive identities call the association service directly. App-only
    /// identities may not, so missing associations are bundled into one
    /// self-deleting script returned as a custom action to queue.
    ///
    /// # Errors
    ///
    /// Returns an error when an association cannot be read or written.
    pub fn provision(
        &self,
        client: &mut dyn SiteClient,
        scope: ArtifactScope<'_>,
    ) -> Result<Option<(String, CustomActionCreator)>, ArtifactError> {
        if !client.authentication_mode().is_anonymous() {
            ArtifactManager::new(self.workflows, self.notifier).create_all(client, scope)?;
            return Ok(None);
        }

        let associated = client
            .query_artifacts(scope.web, ClassicWorkflowCreator::KIND)
            .map_err(|source| {
                ArtifactError::remote(ClassicWorkflowCreator::KIND, scope.web.as_str(), source)
            })?;
        let mut missing = Vec::new();
        for (key, workflow) in self.workflows {
            let identity = workflow.identity(key);
            if associated
                .iter()
                .any(|record| record.identity.eq_ignore_ascii_case(&identity))
            {
                self.notifier.verbose(format!(
                    "{} {identity} already exists",
                    ClassicWorkflowCreator::KIND
                ));
            } else {
                missing.push(scripted_association(workflow, key));
            }
        }
        if missing.is_empty() {
            return Ok(None);
        }

        let title = workflow_action_title(&scope.manifest.manifest_name);
        let script = render_workflow_association_script(scope.web, &title, &missing)?;
        self.notifier.verbose(format!(
            "Queued custom action {title} for {} workflow association(s)",
            missing.len()
        ));
        Ok(Some((
            title.clone(),
            CustomActionCreator {
                title: Some(title),
                description: Some("Associates classic workflows and removes itself".to_string()),
                location: "ScriptLink".to_string(),
                sequence: 1000,
                script_block: Some(script),
                script_src: None,
                url: None,
            },
        )))
    }
}
