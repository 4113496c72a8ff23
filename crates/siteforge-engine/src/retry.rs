use std::collections::BTreeSet;
use std::thread;
use std::time::Duration;

use siteforge_domain::{ArtifactKind, LookAndFeel, Navigation, WebUrl};
use tracing::warn;

use crate::client::{ArtifactRecord, AuthMode, SiteClient, SiteContext, WebCreation, WebInfo};
use crate::error::RemoteError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled for each further attempt.
    pub backoff: Duration,
    /// Upper bound for any single delay.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub const fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    fn delay(&self, attempt: u32) -> Duration {
        self.backoff
            .saturating_mul(2_u32.saturating_pow(attempt.saturating_sub(1)))
            .min(self.max_backoff)
    }
}

/// Wraps a client and re-executes calls that fail transiently. Fatal
/// failures pass through untouched.
#[derive(Debug)]
pub struct RetryingClient<C> {
    inner: C,
    policy: RetryPolicy,
}

impl<C: SiteClient> RetryingClient<C> {
    pub const fn new(inner: C, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub const fn inner(&self) -> &C {
        &self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }

    fn execute<T>(
        &mut self,
        operation: &'static str,
        mut call: impl FnMut(&mut C) -> Result<T, RemoteError>,
    ) -> Result<T, RemoteError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match call(&mut self.inner) {
                Ok(value) => return Ok(value),
                Err(error) if error.is_transient() && attempt < max_attempts => {
                    warn!(operation, attempt, %error, "retrying transient remote failure");
                    let delay = self.policy.delay(attempt);
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                    attempt += 1;
                }
                Err(error) if error.is_transient() => {
                    return Err(RemoteError::RetriesExhausted {
                        operation,
                        attempts: attempt,
                        source: Box::new(error),
                    });
                }
                Err(error) => return Err(error),
            }
        }
    }
}

impl<C: SiteClient> SiteClient for RetryingClient<C> {
    fn authentication_mode(&self) -> AuthMode {
        self.inner.authentication_mode()
    }

    fn load_context(&mut self, web: &WebUrl) -> Result<SiteContext, RemoteError> {
        self.execute("load_context", |client| client.load_context(web))
    }

    fn child_webs(&mut self, parent: &WebUrl) -> Result<Vec<WebInfo>, RemoteError> {
        self.execute("child_webs", |client| client.child_webs(parent))
    }

    fn add_child_web(
        &mut self,
        parent: &WebUrl,
        creation: &WebCreation,
    ) -> Result<WebInfo, RemoteError> {
        self.execute("add_child_web", |client| client.add_child_web(parent, creation))
    }

    fn delete_web(&mut self, web: &WebUrl) -> Result<(), RemoteError> {
        self.execute("delete_web", |client| client.delete_web(web))
    }

    fn active_features(&mut self, web: &WebUrl) -> Result<BTreeSet<String>, RemoteError> {
        self.execute("active_features", |client| client.active_features(web))
    }

    fn activate_feature(&mut self, web: &WebUrl, feature_id: &str) -> Result<(), RemoteError> {
        self.execute("activate_feature", |client| {
            client.activate_feature(web, feature_id)
        })
    }

    fn deactivate_feature(&mut self, web: &WebUrl, feature_id: &str) -> Result<(), RemoteError> {
        self.execute("deactivate_feature", |client| {
            client.deactivate_feature(web, feature_id)
        })
    }

    fn find_artifact(
        &mut self,
        web: &WebUrl,
        kind: ArtifactKind,
        identity: &str,
    ) -> Result<Option<ArtifactRecord>, RemoteError> {
        self.execute("find_artifact", |client| {
            client.find_artifact(web, kind, identity)
        })
    }

    fn query_artifacts(
        &mut self,
        web: &WebUrl,
        kind: ArtifactKind,
    ) -> Result<Vec<ArtifactRecord>, RemoteError> {
        self.execute("query_artifacts", |client| client.query_artifacts(web, kind))
    }

    fn put_artifact(&mut self, web: &WebUrl, record: ArtifactRecord) -> Result<(), RemoteError> {
        self.execute("put_artifact", |client| client.put_artifact(web, record.clone()))
    }

    fn delete_artifact(
        &mut self,
        web: &WebUrl,
        kind: ArtifactKind,
        identity: &str,
    ) -> Result<bool, RemoteError> {
        self.execute("delete_artifact", |client| {
            client.delete_artifact(web, kind, identity)
        })
    }

    fn navigation(&mut self, web: &WebUrl) -> Result<Option<Navigation>, RemoteError> {
        self.execute("navigation", |client| client.navigation(web))
    }

    fn set_navigation(&mut self, web: &WebUrl, navigation: &Navigation) -> Result<(), RemoteError> {
        self.execute("set_navigation", |client| client.set_navigation(web, navigation))
    }

    fn look_and_feel(&mut self, web: &WebUrl) -> Result<Option<LookAndFeel>, RemoteError> {
        self.execute("look_and_feel", |client| client.look_and_feel(web))
    }

    fn apply_look_and_feel(
        &mut self,
        web: &WebUrl,
        settings: &LookAndFeel,
    ) -> Result<(), RemoteError> {
        self.execute("apply_look_and_feel", |client| {
            client.apply_look_and_feel(web, settings)
        })
    }

    fn associate_workflow(
        &mut self,
        web: &WebUrl,
        association: ArtifactRecord,
    ) -> Result<(), RemoteError> {
        self.execute("associate_workflow", |client| {
            client.associate_workflow(web, association.clone())
        })
    }

    fn set_web_property(
        &mut self,
        web: &WebUrl,
        key: &str,
        value: &str,
    ) -> Result<(), RemoteError> {
        self.execute("set_web_property", |client| {
            client.set_web_property(web, key, value)
        })
    }
}
