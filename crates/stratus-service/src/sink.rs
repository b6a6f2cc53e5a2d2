//! Notification delivery through the log stream.

use async_trait::async_trait;
use tracing::warn;

use stratus_core::{Notification, NotificationSink, Result};

/// Sink that surfaces alerts as warning-level log records. Operators tail
/// the daemon's log or scrape it; no push transport is involved.
pub struct LogNotificationSink;

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn show(&self, notification: &Notification) -> Result<()> {
        warn!(
            alert = %notification.data,
            "{}: {}",
            notification.title,
            notification.body
        );
        Ok(())
    }
}
