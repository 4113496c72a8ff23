use siteforge_domain::{ArtifactKind, RemoteEventRegistrationCreator};

use super::{Artifact, ArtifactScope, put, require};
use crate::client::{ArtifactRecord, SiteClient};
use crate::error::{ArtifactError, ConfigurationError};
use crate::validate::is_absolute_url;

const WEB_SCOPE: &str = "web";

fn resolve_endpoint(
    registration: &RemoteEventRegistrationCreator,
    key: &str,
    scope: ArtifactScope<'_>,
) -> Result<String, ConfigurationError> {
    if is_absolute_url(&registration.endpoint_url) {
        return Ok(registration.endpoint_url.clone());
    }
    let host = scope
        .manifest
        .remote_host
        .as_deref()
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .ok_or_else(|| ConfigurationError::MissingRemoteHost {
            registration: key.to_string(),
            endpoint: registration.endpoint_url.clone(),
        })?;
    Ok(format!(
        "{}/{}",
        host.trim_end_matches('/'),
        registration.endpoint_url.trim_start_matches('/')
    ))
}

impl Artifact for RemoteEventRegistrationCreator {
    const KIND: ArtifactKind = ArtifactKind::RemoteEventRegistration;

    /// `scope/receiver name`, where scope is the list title or `web`.
    fn identity(&self, key: &str) -> String {
        let scope = self.list_title.as_deref().unwrap_or(WEB_SCOPE);
        format!("{scope}/{key}")
    }

    fn desired_record(
        &self,
        key: &str,
        scope: ArtifactScope<'_>,
    ) -> Result<ArtifactRecord, ArtifactError> {
        let endpoint = resolve_endpoint(self, key, scope)?;
        let mut record = ArtifactRecord::new(Self::KIND, self.identity(key))
            .with("event_receiver_type", self.event_receiver_type.as_str())
            .with("endpoint_url", endpoint)
            .with("sequence", self.sequence);
        if let Some(list) = &self.list_title {
            record = record.with("list_title", list.as_str());
        }
        Ok(record)
    }

    fn create(
        &self,
        client: &mut dyn SiteClient,
        key: &str,
        scope: ArtifactScope<'_>,
    ) -> Result<(), ArtifactError> {
        if let Some(list) = &self.list_title {
            let identity = self.identity(key);
            require(
                client,
                scope.web,
                (Self::KIND, identity.as_str()),
                (ArtifactKind::List, list.as_str()),
            )?;
        }
        let record = self.desired_record(key, scope)?;
        put(client, scope.web, record)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use siteforge_domain::{Manifest, ManifestName, RemoteEventRegistrationCreator, WebUrl};

    use super::resolve_endpoint;
    use crate::artifacts::{Artifact, ArtifactScope};

    fn registration(endpoint: &str) -> RemoteEventRegistrationCreator {
        RemoteEventRegistrationCreator {
            list_title: Some("Projects".to_string()),
            event_receiver_type: "ItemAdded".to_string(),
            endpoint_url: endpoint.to_string(),
            sequence: 10_000,
        }
    }

    #[test]
    fn relative_endpoints_join_the_remote_host() {
        let mut manifest = Manifest::new(ManifestName::try_from("intranet").expect("name"));
        manifest.remote_host = Some("https://events.example/".to_string());
        let web = WebUrl::root();
        let scope = ArtifactScope {
            web: &web,
            manifest: &manifest,
        };

        let endpoint =
            resolve_endpoint(&registration("/hooks/item"), "added", scope).expect("endpoint");
        assert_eq!(endpoint, "https://events.example/hooks/item");
        assert_eq!(registration("/x").identity("added"), "Projects/added");
    }
}
