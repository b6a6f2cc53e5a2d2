//! HTTP reachability as a connectivity signal.
//!
//! A headless daemon has no platform connectivity events, so the watch
//! channel is fed by the probe itself: each probe HEADs a known endpoint
//! and publishes the outcome, which the monitor's event path then observes
//! like any other connectivity change.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::debug;

use stratus_core::ConnectivitySignal;

const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Connectivity signal backed by a HEAD probe against a fixed URL.
pub struct HttpConnectivity {
    client: reqwest::Client,
    probe_url: String,
    tx: watch::Sender<bool>,
}

impl HttpConnectivity {
    /// Create a signal assuming `initial` connectivity until the first
    /// probe says otherwise.
    pub fn new(probe_url: impl Into<String>, initial: bool) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self {
            client: reqwest::Client::new(),
            probe_url: probe_url.into(),
            tx,
        }
    }
}

#[async_trait]
impl ConnectivitySignal for HttpConnectivity {
    fn connected(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    async fn probe(&self) -> bool {
        let reachable = match self
            .client
            .head(&self.probe_url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Reachability probe failed: {}", e);
                false
            }
        };

        // Publish only actual changes so subscribers see transitions
        self.tx.send_if_modified(|current| {
            if *current != reachable {
                *current = reachable;
                true
            } else {
                false
            }
        });
        reachable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_url_probes_false() {
        // Reserved TEST-NET-1 address, nothing listens there
        let signal = HttpConnectivity::new("http://192.0.2.1/health", true);
        assert!(signal.connected());

        assert!(!signal.probe().await);
        assert!(!signal.connected());
    }

    #[tokio::test]
    async fn test_subscribers_see_probe_transitions() {
        let signal = HttpConnectivity::new("http://192.0.2.1/health", true);
        let rx = signal.subscribe();

        signal.probe().await;
        assert!(rx.has_changed().unwrap());
        assert!(!*rx.borrow());
    }
}
