//! Suppression counters.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Switch shared by every bus built with it.
///
/// Closing the gate silences all of those buses at once. Clones share the
/// same state.
#[derive(Debug, Clone, Default)]
pub struct SignalGate {
    depth: Arc<AtomicUsize>,
}

impl SignalGate {
    /// An open gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Silences every bus sharing this gate until the matching
    /// [`SignalGate::enable_all`].
    pub fn disable_all(&self) {
        disable(&self.depth);
    }

    /// Undoes one [`SignalGate::disable_all`].
    pub fn enable_all(&self) {
        enable(&self.depth);
    }

    /// Whether signals may pass.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.depth.load(Ordering::SeqCst) == 0
    }

    /// Closes the gate until the returned guard is dropped.
    #[must_use = "signals are re-enabled as soon as the guard is dropped"]
    pub fn suppress(&self) -> SuppressionGuard {
        SuppressionGuard::new(Arc::clone(&self.depth))
    }
}

pub(crate) fn disable(depth: &AtomicUsize) {
    depth.fetch_add(1, Ordering::SeqCst);
}

pub(crate) fn enable(depth: &AtomicUsize) {
    // Unpaired enables leave the counter at zero.
    let _ = depth.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |d| d.checked_sub(1));
}

/// Keeps a bus or gate disabled while alive.
#[derive(Debug)]
pub struct SuppressionGuard {
    depth: Arc<AtomicUsize>,
}

impl SuppressionGuard {
    pub(crate) fn new(depth: Arc<AtomicUsize>) -> Self {
        disable(&depth);
        Self { depth }
    }
}

impl Drop for SuppressionGuard {
    fn drop(&mut self) {
        enable(&self.depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disable_enable_pairs() {
        let gate = SignalGate::new();
        gate.disable_all();
        gate.disable_all();
        gate.enable_all();
        assert!(!gate.is_open());
        gate.enable_all();
        assert!(gate.is_open());
    }

    #[test]
    fn extra_enable_is_harmless() {
        let gate = SignalGate::new();
        gate.enable_all();
        assert!(gate.is_open());
        gate.disable_all();
        assert!(!gate.is_open());
    }

    #[test]
    fn guard_restores_on_drop() {
        let gate = SignalGate::new();
        let clone = gate.clone();
        {
            let _guard = gate.suppress();
            assert!(!clone.is_open());
        }
        assert!(clone.is_open());
    }
}
