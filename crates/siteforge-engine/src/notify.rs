use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use siteforge_domain::{Notification, NotificationLevel};
use tracing::{debug, info};

type Sink = Arc<dyn Fn(&Notification) + Send + Sync>;

/// Single-sink progress channel. Clones share the sink, so every component
/// down the tree reports to the same subscriber in emission order.
#[derive(Clone)]
pub struct Notifier {
    sink: Sink,
}

impl Notifier {
    pub fn new(sink: impl Fn(&Notification) + Send + Sync + 'static) -> Self {
        Self {
            sink: Arc::new(sink),
        }
    }

    #[must_use]
    pub fn silent() -> Self {
        Self::new(|_| {})
    }

    pub fn emit(&self, notification: &Notification) {
        match notification.level {
            NotificationLevel::Normal => info!(detail = %notification.detail, "notification"),
            NotificationLevel::Verbose => debug!(detail = %notification.detail, "notification"),
        }
        (self.sink)(notification);
    }

    pub fn normal(&self, detail: impl Into<String>) {
        self.emit(&Notification::normal(detail));
    }

    pub fn verbose(&self, detail: impl Into<String>) {
        self.emit(&Notification::verbose(detail));
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("Notifier").finish_non_exhaustive()
    }
}

/// Subscriber that keeps every notification it receives.
#[derive(Debug, Clone, Default)]
pub struct NotificationLog {
    entries: Arc<Mutex<Vec<Notification>>>,
}

impl NotificationLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn notifier(&self) -> Notifier {
        let entries = Arc::clone(&self.entries);
        Notifier::new(move |notification| {
            entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(notification.clone());
        })
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<Notification> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Details of every notification, in emission order.
    #[must_use]
    pub fn details(&self) -> Vec<String> {
        self.snapshot()
            .into_iter()
            .map(|notification| notification.detail)
            .collect()
    }

    /// Index of the first notification whose detail contains `needle`.
    #[must_use]
    pub fn position(&self, needle: &str) -> Option<usize> {
        self.snapshot()
            .iter()
            .position(|notification| notification.detail.contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use siteforge_domain::NotificationLevel;

    use super::NotificationLog;

    #[test]
    fn clones_share_one_sink_and_preserve_order() {
        let log = NotificationLog::new();
        let notifier = log.notifier();
        let child = notifier.clone();

        notifier.normal("first");
        child.verbose("second");
        notifier.normal("third");

        let entries = log.snapshot();
        assert_eq!(log.details(), vec!["first", "second", "third"]);
        assert_eq!(entries[1].level, NotificationLevel::Verbose);
        assert_eq!(log.position("third"), Some(2));
    }
}
