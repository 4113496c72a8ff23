use siteforge_domain::{ArtifactKind, LookAndFeel, WebUrl};

use crate::client::SiteClient;
use crate::error::ArtifactError;
use crate::notify::Notifier;

#[derive(Debug)]
pub struct LookAndFeelManager<'m> {
    notifier: &'m Notifier,
}

impl<'m> LookAndFeelManager<'m> {
    #[must_use]
    pub const fn new(notifier: &'m Notifier) -> Self {
        Self { notifier }
    }

    /// # Errors
    ///
    /// Returns an error when the current settings cannot be read or the new ones applied.
    pub fn apply(
        &self,
        client: &mut dyn SiteClient,
        web: &WebUrl,
        settings: &LookAndFeel,
    ) -> Result<(), ArtifactError> {
        let remote =
            |source| ArtifactError::remote(ArtifactKind::LookAndFeel, web.as_str(), source);
        if client.look_and_feel(web).map_err(remote)?.as_ref() == Some(settings) {
            self.notifier.verbose("Look and feel is already up to date");
            return Ok(());
        }
        client.apply_look_and_feel(web, settings).map_err(remote)?;
        self.notifier.normal(format!("Applied look and feel to web at {web}"));
        Ok(())
    }
}
