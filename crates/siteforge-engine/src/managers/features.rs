use std::collections::BTreeSet;

use siteforge_domain::{ArtifactKind, WebUrl};

use crate::client::SiteClient;
use crate::error::{ArtifactError, RemoteError};
use crate::notify::Notifier;

/// Activates and deactivates web-scoped features.
#[derive(Debug)]
pub struct FeatureManager<'m> {
    notifier: &'m Notifier,
}

fn feature_error(feature_id: &str) -> impl FnOnce(RemoteError) -> ArtifactError + '_ {
    move |source| ArtifactError::remote(ArtifactKind::Feature, feature_id, source)
}

impl<'m> FeatureManager<'m> {
    #[must_use]
    pub const fn new(notifier: &'m Notifier) -> Self {
        Self { notifier }
    }

    /// # Errors
    ///
    /// Returns an error when the active set cannot be read or a feature fails to activate.
    pub fn add(
        &self,
        client: &mut dyn SiteClient,
        web: &WebUrl,
        features: &BTreeSet<String>,
    ) -> Result<(), ArtifactError> {
        let active = client
            .active_features(web)
            .map_err(|source| ArtifactError::remote(ArtifactKind::Feature, "*", source))?;
        for feature_id in features {
            if active.contains(feature_id) {
                self.notifier.verbose(format!("Feature {feature_id} is already active"));
                continue;
            }
            client
                .activate_feature(web, feature_id)
                .map_err(feature_error(feature_id))?;
            self.notifier.normal(format!("Activated feature {feature_id}"));
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error when the active set cannot be read or a feature fails to deactivate.
    pub fn remove(
        &self,
        client: &mut dyn SiteClient,
        web: &WebUrl,
        features: &BTreeSet<String>,
    ) -> Result<(), ArtifactError> {
        let active = client
            .active_features(web)
            .map_err(|source| ArtifactError::remote(ArtifactKind::Feature, "*", source))?;
        for feature_id in features {
            if !active.contains(feature_id) {
                self.notifier.verbose(format!("Feature {feature_id} is not active"));
                continue;
            }
            client
                .deactivate_feature(web, feature_id)
                .map_err(feature_error(feature_id))?;
            self.notifier.normal(format!("Deactivated feature {feature_id}"));
        }
        Ok(())
    }
}
