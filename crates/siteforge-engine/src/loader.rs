use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use siteforge_domain::{Manifest, SiteDefinition};
use tracing::debug;

use crate::error::LoadError;
use crate::validate::{validate_manifest, validate_site_definition};

fn read_document<T: DeserializeOwned>(path: &Path) -> Result<(T, PathBuf, PathBuf), LoadError> {
    let document_path = fs::canonicalize(path).map_err(|source| LoadError::CanonicalizePath {
        path: path.to_path_buf(),
        source,
    })?;
    let document_dir = document_path
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| LoadError::MissingParent {
            path: document_path.clone(),
        })?;
    let contents = fs::read_to_string(&document_path).map_err(|source| LoadError::Read {
        path: document_path.clone(),
        source,
    })?;
    let document = serde_json::from_str(&contents).map_err(|source| LoadError::Parse {
        path: document_path.clone(),
        source,
    })?;
    debug!(path = %document_path.display(), "loaded document");
    Ok((document, document_path, document_dir))
}

/// Blank base paths become the document's directory; relative ones are
/// resolved against it.
pub(crate) fn resolve_base_path(base: Option<&Path>, document_dir: &Path) -> PathBuf {
    match base {
        Some(base) if !base.as_os_str().to_string_lossy().trim().is_empty() => {
            if base.is_absolute() {
                base.to_path_buf()
            } else {
                document_dir.join(base)
            }
        }
        _ => document_dir.to_path_buf(),
    }
}

/// Load and validate a JSON manifest.
///
/// # Errors
///
/// Returns an error when the file cannot be read, is not a manifest, or
/// fails validation.
pub fn load_manifest(path: &Path) -> Result<Manifest, LoadError> {
    let (mut manifest, manifest_path, manifest_dir): (Manifest, _, _) = read_document(path)?;
    manifest.base_file_path = Some(resolve_base_path(
        manifest.base_file_path.as_deref(),
        &manifest_dir,
    ));
    validate_manifest(&manifest).map_err(|source| LoadError::Configuration {
        path: manifest_path,
        source,
    })?;
    Ok(manifest)
}

/// Load and validate a JSON site definition.
///
/// # Errors
///
/// Returns an error when the file cannot be read, is not a site definition,
/// or fails validation.
pub fn load_site_definition(path: &Path) -> Result<SiteDefinition, LoadError> {
    let (mut definition, definition_path, definition_dir): (SiteDefinition, _, _) =
        read_document(path)?;
    definition.base_file_path = Some(resolve_base_path(
        definition.base_file_path.as_deref(),
        &definition_dir,
    ));
    validate_site_definition(&definition).map_err(|source| LoadError::Configuration {
        path: definition_path,
        source,
    })?;
    Ok(definition)
}
