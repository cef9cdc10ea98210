use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::providers::{ConnectionInfo, ConnectivityProbe};

/// Effective connection types treated as unusable for font downloads
pub const SLOW_CONNECTION_TYPES: &[&str] = &["slow-2g", "2g"];

#[derive(Debug, Clone)]
struct NetworkState {
    online: bool,
    effective_type: String,
    last_checked: Instant,
}

impl NetworkState {
    fn available(&self) -> bool {
        self.online && !SLOW_CONNECTION_TYPES.contains(&self.effective_type.as_str())
    }
}

/// Point-in-time view of the monitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkSnapshot {
    pub online: bool,
    pub effective_type: String,
    pub available: bool,
    pub since_last_check: Duration,
}

/// Tracks connectivity and publishes availability transitions
pub struct NetworkStateMonitor {
    probe: Arc<dyn ConnectivityProbe>,
    state: Mutex<NetworkState>,
    staleness: Duration,
    available_tx: watch::Sender<bool>,
}

impl NetworkStateMonitor {
    pub fn new(probe: Arc<dyn ConnectivityProbe>, staleness: Duration) -> Self {
        let info = probe.probe();
        let state = NetworkState {
            online: info.online,
            effective_type: info.effective_type,
            last_checked: Instant::now(),
        };
        let (available_tx, _) = watch::channel(state.available());

        Self {
            probe,
            state: Mutex::new(state),
            staleness,
            available_tx,
        }
    }

    /// Whether font downloads should be attempted, as of the last check
    ///
    /// Never re-probes; callers that must not trust a stale answer go through
    /// [`Self::refresh_if_stale`] and act on the transition it returns.
    pub fn is_available(&self) -> bool {
        self.state.lock().available()
    }

    /// Re-probe connectivity; returns `true` on an unavailable → available transition
    pub fn refresh(&self) -> bool {
        let info = self.probe.probe();
        self.apply(info)
    }

    /// Re-probe only when the last check is older than the staleness window
    pub fn refresh_if_stale(&self) -> bool {
        let stale = self.state.lock().last_checked.elapsed() > self.staleness;
        stale && self.refresh()
    }

    /// Feed an external online/offline/connection-change signal
    pub fn apply(&self, info: ConnectionInfo) -> bool {
        let (was_available, now_available) = {
            let mut state = self.state.lock();
            let was_available = state.available();
            state.online = info.online;
            state.effective_type = info.effective_type;
            state.last_checked = Instant::now();
            (was_available, state.available())
        };

        if was_available != now_available {
            log::debug!(
                "Network availability changed: {} -> {}",
                was_available,
                now_available
            );
            self.available_tx.send_replace(now_available);
        }

        !was_available && now_available
    }

    /// Receiver observing availability; changes on every transition
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.available_tx.subscribe()
    }

    pub fn snapshot(&self) -> NetworkSnapshot {
        let state = self.state.lock();
        NetworkSnapshot {
            online: state.online,
            effective_type: state.effective_type.clone(),
            available: state.available(),
            since_last_check: state.last_checked.elapsed(),
        }
    }
}

impl std::fmt::Debug for NetworkStateMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkStateMonitor")
            .field("state", &*self.state.lock())
            .field("staleness", &self.staleness)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Probe whose answer the test flips
    struct SwitchProbe(Mutex<ConnectionInfo>);

    impl SwitchProbe {
        fn new(info: ConnectionInfo) -> Arc<Self> {
            Arc::new(Self(Mutex::new(info)))
        }

        fn set(&self, info: ConnectionInfo) {
            *self.0.lock() = info;
        }
    }

    impl ConnectivityProbe for SwitchProbe {
        fn probe(&self) -> ConnectionInfo {
            self.0.lock().clone()
        }
    }

    const STALENESS: Duration = Duration::from_secs(300);

    #[tokio::test(start_paused = true)]
    async fn offline_probe_is_unavailable() {
        let probe = SwitchProbe::new(ConnectionInfo::offline());
        let monitor = NetworkStateMonitor::new(probe, STALENESS);
        assert!(!monitor.is_available());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_connections_are_unavailable() {
        let probe = SwitchProbe::new(ConnectionInfo::online().with_effective_type("2g"));
        let monitor = NetworkStateMonitor::new(probe, STALENESS);
        assert!(!monitor.is_available());
        assert!(monitor.snapshot().online);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_reports_recovery_once() {
        let probe = SwitchProbe::new(ConnectionInfo::offline());
        let monitor = NetworkStateMonitor::new(probe.clone(), STALENESS);
        let mut rx = monitor.subscribe();

        probe.set(ConnectionInfo::online());
        assert!(monitor.refresh());
        assert!(!monitor.refresh());
        assert!(rx.has_changed().unwrap());
        assert!(*rx.borrow_and_update());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_state_is_reprobed() {
        let probe = SwitchProbe::new(ConnectionInfo::online());
        let monitor = NetworkStateMonitor::new(probe.clone(), STALENESS);
        probe.set(ConnectionInfo::offline());

        // Still trusted inside the window
        assert!(!monitor.refresh_if_stale());
        assert!(monitor.is_available());

        tokio::time::advance(STALENESS + Duration::from_secs(1)).await;
        assert!(monitor.is_available());
        assert!(!monitor.refresh_if_stale());
        assert!(!monitor.is_available());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_reprobe_reports_recovery_and_reads_do_not_consume_it() {
        let probe = SwitchProbe::new(ConnectionInfo::offline());
        let monitor = NetworkStateMonitor::new(probe.clone(), STALENESS);
        probe.set(ConnectionInfo::online());
        tokio::time::advance(STALENESS + Duration::from_secs(1)).await;

        // Plain reads leave the stale state for the re-probe to act on
        assert!(!monitor.is_available());
        assert!(!monitor.snapshot().available);

        assert!(monitor.refresh_if_stale());
        assert!(monitor.is_available());
        assert!(!monitor.refresh_if_stale());
    }

    #[tokio::test(start_paused = true)]
    async fn external_events_share_transition_logic() {
        let monitor = NetworkStateMonitor::new(SwitchProbe::new(ConnectionInfo::online()), STALENESS);
        assert!(!monitor.apply(ConnectionInfo::offline()));
        assert!(monitor.apply(ConnectionInfo::online()));
        assert!(!monitor.apply(ConnectionInfo::online().with_effective_type("slow-2g")));
        assert!(!monitor.is_available());
    }
}
