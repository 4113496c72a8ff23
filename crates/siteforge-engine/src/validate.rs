use std::collections::BTreeSet;

use siteforge_domain::{ArtifactKind, Manifest, SiteDefinition, StorageKind, WebDefinition};

use crate::error::ConfigurationError;

pub(crate) fn is_absolute_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("https://") || lower.starts_with("http://")
}

pub(crate) fn has_remote_host(manifest: &Manifest) -> bool {
    manifest
        .remote_host
        .as_deref()
        .is_some_and(|host| !host.trim().is_empty())
}

/// Check a manifest for problems detectable without touching a site.
///
/// # Errors
///
/// Returns the first configuration problem found.
pub fn validate_manifest(manifest: &Manifest) -> Result<(), ConfigurationError> {
    if manifest.storage_type != StorageKind::FileSystem && !manifest.files.is_empty() {
        return Err(ConfigurationError::UnsupportedStorage {
            storage: manifest.storage_type,
        });
    }
    if !manifest.files.is_empty() && !manifest.has_base_file_path() {
        return Err(ConfigurationError::MissingBaseFilePath);
    }

    unique(
        manifest,
        ArtifactKind::Field,
        manifest
            .fields
            .iter()
            .map(|(key, field)| field.internal_name(key)),
    )?;
    unique(
        manifest,
        ArtifactKind::ContentType,
        manifest
            .content_types
            .iter()
            .map(|(key, content_type)| content_type.name(key)),
    )?;
    unique(
        manifest,
        ArtifactKind::List,
        manifest.list_creators.iter().map(|(key, list)| list.title(key)),
    )?;
    unique(
        manifest,
        ArtifactKind::CustomAction,
        manifest
            .custom_actions
            .iter()
            .map(|(key, action)| action.title(key)),
    )?;
    unique(
        manifest,
        ArtifactKind::Group,
        manifest.groups.iter().map(|(key, group)| group.title(key)),
    )?;

    if !has_remote_host(manifest) {
        let relative = manifest
            .remote_event_registrations
            .iter()
            .find(|(_, registration)| !is_absolute_url(&registration.endpoint_url));
        if let Some((name, registration)) = relative {
            return Err(ConfigurationError::MissingRemoteHost {
                registration: name.clone(),
                endpoint: registration.endpoint_url.clone(),
            });
        }
    }

    Ok(())
}

fn unique<'a>(
    manifest: &Manifest,
    kind: ArtifactKind,
    identities: impl Iterator<Item = &'a str>,
) -> Result<(), ConfigurationError> {
    let mut seen = BTreeSet::new();
    for identity in identities {
        if !seen.insert(identity.to_lowercase()) {
            return Err(ConfigurationError::DuplicateIdentity {
                manifest: manifest.manifest_name.to_string(),
                kind,
                identity: identity.to_string(),
            });
        }
    }
    Ok(())
}

/// Check a site definition and every manifest embedded in it. Embedded
/// manifests without their own base path inherit the definition's.
///
/// # Errors
///
/// Returns the first configuration problem found.
pub fn validate_site_definition(definition: &SiteDefinition) -> Result<(), ConfigurationError> {
    if definition.storage_type != StorageKind::FileSystem {
        return Err(ConfigurationError::UnsupportedStorage {
            storage: definition.storage_type,
        });
    }
    if !definition.has_base_file_path() {
        return Err(ConfigurationError::MissingBaseFilePath);
    }
    let root = &definition.web_definition;
    if !root.relative_url().is_empty() {
        return Err(ConfigurationError::RootUrlNotRelative {
            url: root.url.clone(),
        });
    }
    validate_web(definition, root)
}

fn validate_web(
    definition: &SiteDefinition,
    web: &WebDefinition,
) -> Result<(), ConfigurationError> {
    if let Some(manifest) = &web.manifest {
        if manifest.has_base_file_path() {
            validate_manifest(manifest)?;
        } else {
            let mut inherited = manifest.clone();
            inherited.base_file_path.clone_from(&definition.base_file_path);
            validate_manifest(&inherited)?;
        }
    }
    web.web_definitions
        .values()
        .try_for_each(|child| validate_web(definition, child))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use siteforge_domain::{Manifest, SiteDefinition};

    use super::{validate_manifest, validate_site_definition};
    use crate::error::ConfigurationError;

    fn manifest(json: &str) -> Manifest {
        serde_json::from_str(json).expect("manifest")
    }

    #[test]
    fn duplicate_list_titles_are_rejected_case_insensitively() {
        let manifest = manifest(
            r#"{
                "manifest_name": "intranet",
                "list_creators": {
                    "first": { "title": "Projects", "url": "Lists/A" },
                    "second": { "title": "projects", "url": "Lists/B" }
                }
            }"#,
        );
        let error = validate_manifest(&manifest).expect_err("duplicate");
        assert!(matches!(error, ConfigurationError::DuplicateIdentity { .. }));
    }

    #[test]
    fn files_need_a_base_path() {
        let manifest = manifest(
            r#"{ "manifest_name": "intranet", "files": { "SiteAssets/app.js": {} } }"#,
        );
        let error = validate_manifest(&manifest).expect_err("no base path");
        assert_eq!(error, ConfigurationError::MissingBaseFilePath);
    }

    #[test]
    fn relative_event_endpoints_need_a_remote_host() {
        let manifest = manifest(
            r#"{
                "manifest_name": "intranet",
                "remote_event_registrations": {
                    "ItemAdded": { "event_receiver_type": "ItemAdded", "endpoint_url": "/events" }
                }
            }"#,
        );
        let error = validate_manifest(&manifest).expect_err("no host");
        assert!(matches!(error, ConfigurationError::MissingRemoteHost { .. }));
    }

    #[test]
    fn root_definition_url_must_be_empty() {
        let definition: SiteDefinition = serde_json::from_str(
            r#"{ "base_file_path": "/srv", "web_definition": { "url": "/sub" } }"#,
        )
        .expect("definition");
        let error = validate_site_definition(&definition).expect_err("non-root url");
        assert_eq!(
            error,
            ConfigurationError::RootUrlNotRelative {
                url: "/sub".to_string()
            }
        );
    }

    #[test]
    fn embedded_manifests_inherit_the_definition_base_path() {
        let definition: SiteDefinition = serde_json::from_str(
            r#"{
                "base_file_path": "/srv",
                "web_definition": {
                    "manifest": { "manifest_name": "root", "files": { "SiteAssets/app.js": {} } }
                }
            }"#,
        )
        .expect("definition");
        validate_site_definition(&definition).expect("inherited base path");
    }
}
