//! # Session State
//!
//! Process-wide UI state made explicit: the wallet-connected flag and the
//! single busy gate that serializes write operations.
//!
//! ## Busy Gate
//!
//! At most one write may be between submission and confirmation. The gate
//! is an atomic flag claimed with compare-and-swap; the returned
//! [`BusyGuard`] clears it on drop, so every exit path (success, error,
//! or the future being dropped at teardown) releases it.

use std::sync::atomic::{AtomicBool, Ordering};

/// Connection flag plus write gate.
#[derive(Debug, Default)]
pub struct SessionState {
    connected: AtomicBool,
    busy: AtomicBool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub(crate) fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// True while a write holds the gate.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Claims the gate. Returns `None` if it is already held.
    pub fn try_begin_write(&self) -> Option<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| BusyGuard { flag: &self.busy })
    }
}

/// Holds the busy gate until dropped.
#[derive(Debug)]
#[must_use = "dropping the guard releases the busy gate immediately"]
pub struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_disconnected_and_idle() {
        let s = SessionState::new();
        assert!(!s.is_connected());
        assert!(!s.is_busy());
    }

    #[test]
    fn second_claim_is_refused_while_held() {
        let s = SessionState::new();
        let guard = s.try_begin_write();
        assert!(guard.is_some());
        assert!(s.is_busy());
        assert!(s.try_begin_write().is_none());
        drop(guard);
        assert!(!s.is_busy());
        assert!(s.try_begin_write().is_some());
    }

    #[test]
    fn connected_flag_toggles() {
        let s = SessionState::new();
        s.set_connected(true);
        assert!(s.is_connected());
        s.set_connected(false);
        assert!(!s.is_connected());
    }
}
