use siteforge_domain::{ArtifactKind, CustomActionCreator, Navigation};

use crate::artifacts::ArtifactScope;
use crate::client::SiteClient;
use crate::error::ArtifactError;
use crate::notify::Notifier;
use crate::scripts::render_navigation_script;

const NAVIGATION_ACTION_PREFIX: &str = "AppNavigationCustomAction";
const SCRIPT_LINK: &str = "ScriptLink";

#[must_use]
pub fn navigation_action_title(manifest_name: &str) -> String {
    format!("{NAVIGATION_ACTION_PREFIX}{manifest_name}")
}

/// Applies navigation natively on host webs. App webs have no editable
/// menus, so they get a script-link custom action instead.
#[derive(Debug)]
pub struct NavigationManager<'m> {
    notifier: &'m Notifier,
}

impl<'m> NavigationManager<'m> {
    #[must_use]
    pub const fn new(notifier: &'m Notifier) -> Self {
        Self { notifier }
    }

    /// Returns the custom action to queue when the target is an app web.
    ///
    /// # Errors
    ///
    /// Returns an error when the menus cannot be read or written, or the script fails to render.
    pub fn provision(
        &self,
        client: &mut dyn SiteClient,
        scope: ArtifactScope<'_>,
        navigation: &Navigation,
        is_host_web: bool,
    ) -> Result<Option<(String, CustomActionCreator)>, ArtifactError> {
        if !is_host_web {
            let title = navigation_action_title(&scope.manifest.manifest_name);
            let script = render_navigation_script(scope.web, navigation)?;
            self.notifier.verbose(format!("Queued navigation custom action {title}"));
            return Ok(Some((
                title.clone(),
                CustomActionCreator {
                    title: Some(title),
                    description: Some("Injects site navigation".to_string()),
                    location: SCRIPT_LINK.to_string(),
                    sequence: 100,
                    script_block: Some(script),
                    script_src: None,
                    url: None,
                },
            )));
        }

        let remote =
            |source| ArtifactError::remote(ArtifactKind::Navigation, scope.web.as_str(), source);
        let current = client.navigation(scope.web).map_err(remote)?;
        if current.as_ref() == Some(navigation) {
            self.notifier.verbose("Navigation is already up to date");
            return Ok(None);
        }
        client
            .set_navigation(scope.web, navigation)
            .map_err(remote)?;
        self.notifier.normal(format!("Applied navigation to web at {}", scope.web));
        Ok(None)
    }
}
