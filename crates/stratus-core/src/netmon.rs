//! Online/offline detection with listener fan-out.
//!
//! Two detection paths feed the same state machine: connectivity change
//! events from the platform signal, and a periodic reachability probe
//! (default every 5 seconds). Transitions are deduplicated with an atomic
//! compare-and-swap, so handling an "online" event while already online is
//! a no-op regardless of which path delivered it.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::traits::ConnectivitySignal;

/// Current connectivity state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    Online,
    Offline,
}

impl NetworkStatus {
    fn from_bool(online: bool) -> Self {
        if online {
            NetworkStatus::Online
        } else {
            NetworkStatus::Offline
        }
    }

    /// True when online.
    pub fn is_online(&self) -> bool {
        matches!(self, NetworkStatus::Online)
    }
}

/// Monitor configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Interval between reachability probes.
    pub probe_interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            probe_interval: Duration::from_secs(5),
        }
    }
}

/// Handle returned by [`NetworkMonitor::add_listener`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerHandle(u64);

type Listener = Arc<dyn Fn(NetworkStatus) + Send + Sync>;
type TransitionCallback = Box<dyn Fn(NetworkStatus) + Send + Sync>;

/// Binary online/offline state machine with listener fan-out.
pub struct NetworkMonitor {
    online: AtomicBool,
    on_transition: TransitionCallback,
    listeners: Mutex<HashMap<u64, Listener>>,
    next_id: AtomicU64,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl NetworkMonitor {
    /// Create a monitor seeded from the signal's snapshot and start both
    /// detection paths (event subscription and periodic probe).
    ///
    /// `on_transition` runs exactly once per genuine transition, before the
    /// listeners; it is the hook for metadata bookkeeping.
    pub fn new(
        signal: Arc<dyn ConnectivitySignal>,
        config: MonitorConfig,
        on_transition: TransitionCallback,
    ) -> Arc<Self> {
        let monitor = Arc::new(Self {
            online: AtomicBool::new(signal.connected()),
            on_transition,
            listeners: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            tasks: Mutex::new(Vec::new()),
        });

        let event_task = {
            let weak = Arc::downgrade(&monitor);
            let mut rx = signal.subscribe();
            tokio::spawn(async move {
                while rx.changed().await.is_ok() {
                    let connected = *rx.borrow();
                    let Some(monitor) = weak.upgrade() else {
                        break;
                    };
                    monitor.handle_connectivity(connected);
                }
            })
        };

        let probe_task = {
            let weak: Weak<Self> = Arc::downgrade(&monitor);
            let signal = Arc::clone(&signal);
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(config.probe_interval);
                ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    let Some(monitor) = weak.upgrade() else {
                        break;
                    };
                    let reachable = signal.probe().await;
                    monitor.handle_connectivity(reachable);
                }
            })
        };

        monitor.tasks.lock().unwrap().extend([event_task, probe_task]);
        monitor
    }

    /// Current status.
    pub fn status(&self) -> NetworkStatus {
        NetworkStatus::from_bool(self.online.load(Ordering::SeqCst))
    }

    /// Feed a connectivity observation into the state machine.
    ///
    /// Idempotent: an observation matching the current state does nothing.
    /// A genuine transition updates the state, runs the transition callback
    /// once, then fans out to every listener. Listener panics are isolated
    /// and logged; they never block other listeners. The listener map is
    /// not locked during fan-out, so a listener may unsubscribe itself or
    /// register new listeners from inside its callback.
    pub fn handle_connectivity(&self, connected: bool) {
        if self
            .online
            .compare_exchange(!connected, connected, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            // Already in this state
            return;
        }

        let status = NetworkStatus::from_bool(connected);
        info!(
            "Network transition: {}",
            if connected { "online" } else { "offline" }
        );

        (self.on_transition)(status);

        // Snapshot the callbacks and release the lock before invoking, so
        // a listener can call back into the monitor without deadlocking
        let snapshot: Vec<(u64, Listener)> = {
            let listeners = self.listeners.lock().unwrap();
            listeners
                .iter()
                .map(|(id, listener)| (*id, Arc::clone(listener)))
                .collect()
        };
        for (id, listener) in snapshot {
            let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| listener(status)));
            if outcome.is_err() {
                warn!("Network listener {} panicked; continuing fan-out", id);
            }
        }
    }

    /// Register a status listener. Returns a handle usable to unsubscribe.
    pub fn add_listener(
        &self,
        listener: Box<dyn Fn(NetworkStatus) + Send + Sync>,
    ) -> ListenerHandle {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.listeners.lock().unwrap().insert(id, Arc::from(listener));
        debug!("Registered network listener {}", id);
        ListenerHandle(id)
    }

    /// Unsubscribe a previously registered listener.
    pub fn remove_listener(&self, handle: ListenerHandle) {
        self.listeners.lock().unwrap().remove(&handle.0);
    }

    /// Tear down both detection tasks and clear all listeners.
    ///
    /// Safe to call multiple times.
    pub fn destroy(&self) {
        for task in self.tasks.lock().unwrap().drain(..) {
            task.abort();
        }
        self.listeners.lock().unwrap().clear();
        debug!("Network monitor destroyed");
    }
}

impl Drop for NetworkMonitor {
    fn drop(&mut self) {
        self.destroy();
    }
}
