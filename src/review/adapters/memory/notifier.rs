//! Recording rerun notifier.

use async_trait::async_trait;
use std::sync::{Arc, PoisonError, RwLock};

use crate::review::ports::{
    RerunNotification, RerunNotifier, RerunNotifierError, RerunNotifierResult,
};

/// Rerun notifier that keeps every published event.
#[derive(Debug, Clone, Default)]
pub struct RecordingRerunNotifier {
    published: Arc<RwLock<Vec<RerunNotification>>>,
}

impl RecordingRerunNotifier {
    /// Creates an empty notifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the events published so far.
    #[must_use]
    pub fn published(&self) -> Vec<RerunNotification> {
        self.published
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl RerunNotifier for RecordingRerunNotifier {
    async fn publish(&self, notification: RerunNotification) -> RerunNotifierResult<()> {
        let mut published = self
            .published
            .write()
            .map_err(|err| RerunNotifierError::publish(std::io::Error::other(err.to_string())))?;
        published.push(notification);
        Ok(())
    }
}
