use std::io;
use std::path::PathBuf;

use siteforge_domain::{ArtifactKind, StorageKind, WebUrl};
use thiserror::Error;

use crate::phase::Phase;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("transient remote failure: {message}")]
    Transient { message: String },
    #[error("access denied: {message}")]
    AccessDenied { message: String },
    #[error("not found: {message}")]
    NotFound { message: String },
    #[error("conflict: {message}")]
    Conflict { message: String },
    #[error("remote call {operation} failed after {attempts} attempt(s)")]
    RetriesExhausted {
        operation: &'static str,
        attempts: u32,
        #[source]
        source: Box<RemoteError>,
    },
}

impl RemoteError {
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("storage type {storage:?} is not supported; only file_system storage can be provisioned")]
    UnsupportedStorage { storage: StorageKind },
    #[error("base file path must not be blank")]
    MissingBaseFilePath,
    #[error("root web definition url must be empty or \"/\", got \"{url}\"")]
    RootUrlNotRelative { url: String },
    #[error("duplicate {kind} identity \"{identity}\" in manifest {manifest}")]
    DuplicateIdentity {
        manifest: String,
        kind: ArtifactKind,
        identity: String,
    },
    #[error(
        "remote event registration \"{registration}\" uses relative endpoint \"{endpoint}\" but the manifest has no remote_host"
    )]
    MissingRemoteHost {
        registration: String,
        endpoint: String,
    },
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to canonicalize path: {path}")]
    CanonicalizePath {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("path has no parent directory: {path}")]
    MissingParent { path: PathBuf },
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid configuration in {path}")]
    Configuration {
        path: PathBuf,
        #[source]
        source: ConfigurationError,
    },
}

#[derive(Debug, Error)]
pub enum StateFileError {
    #[error("failed to read site state {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse site state {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode site state")]
    Encode {
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write site state {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("remote operation on {kind} \"{identity}\" failed")]
    Remote {
        kind: ArtifactKind,
        identity: String,
        #[source]
        source: RemoteError,
    },
    #[error("{kind} \"{identity}\" requires {dependency_kind} \"{dependency}\" which does not exist")]
    MissingDependency {
        kind: ArtifactKind,
        identity: String,
        dependency_kind: ArtifactKind,
        dependency: String,
    },
    #[error("failed to read source file {path} for {kind} \"{identity}\"")]
    ReadSource {
        kind: ArtifactKind,
        identity: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to render {name} script")]
    Script {
        name: &'static str,
        #[source]
        source: tera::Error,
    },
    #[error("failed to encode {what} as JSON")]
    Encode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

impl ArtifactError {
    pub(crate) fn remote(
        kind: ArtifactKind,
        identity: impl Into<String>,
        source: RemoteError,
    ) -> Self {
        Self::Remote {
            kind,
            identity: identity.into(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("failed to load context for web at {web_url}")]
    Context {
        web_url: WebUrl,
        #[source]
        source: RemoteError,
    },
    #[error("error provisioning manifest {manifest} to web at {web_url} during {phase}")]
    Phase {
        manifest: String,
        web_url: WebUrl,
        phase: Phase,
        #[source]
        source: ArtifactError,
    },
    #[error("error deprovisioning manifest {manifest} from web at {web_url} during {phase}")]
    DeprovisionPhase {
        manifest: String,
        web_url: WebUrl,
        phase: Phase,
        #[source]
        source: ArtifactError,
    },
}

#[derive(Debug, Error)]
pub enum SiteProvisionError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("web at {web_url} is not the site root web {root_web_url}; root_web_only requires the root web")]
    NotRootWeb { web_url: WebUrl, root_web_url: WebUrl },
    #[error("failed to load context for web at {web_url}")]
    Context {
        web_url: WebUrl,
        #[source]
        source: RemoteError,
    },
    #[error("Error provisioning to web at {web_url}")]
    Provision {
        web_url: WebUrl,
        #[source]
        source: RemoteError,
    },
    #[error("Error deprovisioning web at {web_url}")]
    Deprovision {
        web_url: WebUrl,
        #[source]
        source: RemoteError,
    },
    #[error("Error provisioning to web at {web_url}")]
    Manifest {
        web_url: WebUrl,
        #[source]
        source: Box<ProvisionError>,
    },
    #[error("Error deprovisioning web at {web_url}")]
    ManifestDeprovision {
        web_url: WebUrl,
        #[source]
        source: Box<ProvisionError>,
    },
}
