#![allow(clippy::multiple_crate_versions)]

mod artifacts;
mod client;
mod error;
mod loader;
mod managers;
mod manifest_provisioner;
mod memory;
mod notify;
mod phase;
mod retry;
mod scripts;
mod site_provisioner;
mod validate;

pub use artifacts::{Artifact, ArtifactScope, Folder, content_hash};
pub use client::{ArtifactRecord, AuthMode, SiteClient, SiteContext, WebCreation, WebInfo};
pub use error::{
    ArtifactError, ConfigurationError, LoadError, ProvisionError, RemoteError, SiteProvisionError,
    StateFileError,
};
pub use loader::{load_manifest, load_site_definition};
pub use managers::{
    ArtifactManager, DocumentTemplateManager, FeatureManager, FileManager, LookAndFeelManager,
    NavigationManager, WorkflowManager, navigation_action_title, workflow_action_title,
};
pub use manifest_provisioner::{ManifestProvisioner, ProvisionOutcome};
pub use memory::{MemorySite, SiteState, WebState};
pub use notify::{NotificationLog, Notifier};
pub use phase::{DEPROVISION_PHASES, PROVISION_PHASES, Phase};
pub use retry::{RetryPolicy, RetryingClient};
pub use scripts::{
    ASSOCIATIONS_PAYLOAD_MARKER, NAVIGATION_PAYLOAD_MARKER, ScriptedAssociation, embedded_payload,
    render_navigation_script, render_workflow_association_script,
};
pub use site_provisioner::{SiteOutcome, SiteProvisioner};
pub use validate::{validate_manifest, validate_site_definition};
