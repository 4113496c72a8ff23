use siteforge_domain::{ArtifactKind, ClassicWorkflowCreator};

use super::{Artifact, ArtifactScope, require};
use crate::client::{ArtifactRecord, SiteClient};
use crate::error::ArtifactError;
use crate::scripts::ScriptedAssociation;

pub(crate) fn workflow_identity(workflow: &ClassicWorkflowCreator, key: &str) -> String {
    format!("{}/{key}", workflow.list_title)
}

pub(crate) fn scripted_association(
    workflow: &ClassicWorkflowCreator,
    key: &str,
) -> ScriptedAssociation {
    ScriptedAssociation {
        name: key.to_string(),
        list_title: workflow.list_title.clone(),
        workflow_template: workflow.workflow_template.clone(),
        task_list_title: workflow.task_list_title.clone(),
        history_list_title: workflow.history_list_title.clone(),
        start_on_create: workflow.start_on_create,
        start_on_change: workflow.start_on_change,
        allow_manual_start: workflow.allow_manual_start,
    }
}

impl Artifact for ClassicWorkflowCreator {
    const KIND: ArtifactKind = ArtifactKind::Workflow;

    fn identity(&self, key: &str) -> String {
        workflow_identity(self, key)
    }

    fn desired_record(
        &self,
        key: &str,
        _scope: ArtifactScope<'_>,
    ) -> Result<ArtifactRecord, ArtifactError> {
        let association = scripted_association(self, key);
        let properties = serde_json::to_value(&association).map_err(|source| {
            ArtifactError::Encode {
                what: "workflow association",
                source,
            }
        })?;
        let mut record = ArtifactRecord::new(Self::KIND, self.identity(key));
        if let serde_json::Value::Object(properties) = properties {
            record.properties = properties;
        }
        Ok(record)
    }

    /// Associations go through the legacy workflow service, not a plain put.
    fn create(
        &self,
        client: &mut dyn SiteClient,
        key: &str,
        scope: ArtifactScope<'_>,
    ) -> Result<(), ArtifactError> {
        let identity = self.identity(key);
        require(
            client,
            scope.web,
            (Self::KIND, identity.as_str()),
            (ArtifactKind::List, self.list_title.as_str()),
        )?;
        let record = self.desired_record(key, scope)?;
        client
            .associate_workflow(scope.web, record)
            .map_err(|source| ArtifactError::remote(Self::KIND, identity, source))
    }
}
