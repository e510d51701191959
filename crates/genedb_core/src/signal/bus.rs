//! Signal bus.

use super::gate::{self, SignalGate, SuppressionGuard};
use crate::error::{CoreError, CoreResult};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{error, trace, warn};

/// Argument shape of a signal kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgShape {
    /// No argument.
    Unit,
    /// A record kind.
    Kind,
    /// A record kind and a handle.
    KindHandle,
    /// An optional text label.
    Label,
}

/// A value that can travel over a [`SignalBus`].
pub trait Signal: fmt::Debug + Send + Sync + 'static {
    /// Closed set of signal kinds.
    type Kind: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static;

    /// Kind of this signal.
    fn kind(&self) -> Self::Kind;

    /// Argument shape carried by this value.
    fn shape(&self) -> ArgShape;
}

/// Identifies a connected listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// A registered callback.
pub type Listener<S> = Arc<dyn Fn(&S) + Send + Sync>;

/// Outcome of one [`SignalBus::emit`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitReport {
    /// Listeners that returned normally.
    pub delivered: usize,
    /// Listeners that panicked.
    pub failed: usize,
    /// Delivery skipped because the bus or its gate is disabled.
    pub suppressed: bool,
    /// Delivery skipped because the same kind is already being emitted.
    pub blocked: bool,
}

struct Registration<S: Signal> {
    id: ListenerId,
    kind: S::Kind,
    listener: Listener<S>,
}

/// Synchronous publish/subscribe channel for one signal type.
pub struct SignalBus<S: Signal> {
    declared: RwLock<HashMap<S::Kind, ArgShape>>,
    listeners: RwLock<Vec<Registration<S>>>,
    next_id: AtomicU64,
    disabled: Arc<AtomicUsize>,
    gate: SignalGate,
    emitting: Mutex<HashSet<S::Kind>>,
}

impl<S: Signal> SignalBus<S> {
    /// A bus with no declared kinds, behind its own gate.
    #[must_use]
    pub fn new() -> Self {
        Self::with_gate(SignalGate::new())
    }

    /// A bus with no declared kinds, behind a shared gate.
    #[must_use]
    pub fn with_gate(gate: SignalGate) -> Self {
        Self {
            declared: RwLock::new(HashMap::new()),
            listeners: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            disabled: Arc::new(AtomicUsize::new(0)),
            gate,
            emitting: Mutex::new(HashSet::new()),
        }
    }

    /// A bus seeded from a base declaration set.
    #[must_use]
    pub fn with_declarations<I>(declarations: I) -> Self
    where
        I: IntoIterator<Item = (S::Kind, ArgShape)>,
    {
        let bus = Self::new();
        for (kind, shape) in declarations {
            bus.declare(kind, shape);
        }
        bus
    }

    /// Declares a kind. Re-declaring replaces the shape.
    pub fn declare(&self, kind: S::Kind, shape: ArgShape) {
        self.declared.write().insert(kind, shape);
    }

    /// Whether `kind` has been declared.
    #[must_use]
    pub fn is_declared(&self, kind: S::Kind) -> bool {
        self.declared.read().contains_key(&kind)
    }

    /// The shared gate this bus listens to.
    #[must_use]
    pub fn gate(&self) -> &SignalGate {
        &self.gate
    }

    /// Registers `listener` for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SignalContractViolation`] if `kind` was never
    /// declared on this bus.
    pub fn connect<F>(&self, kind: S::Kind, listener: F) -> CoreResult<ListenerId>
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        if !self.is_declared(kind) {
            let err = CoreError::signal_violation(format!("connect to undeclared signal {kind:?}"));
            error!(error = %err, "signal contract violation");
            return Err(err);
        }
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.listeners.write().push(Registration {
            id,
            kind,
            listener: Arc::new(listener),
        });
        Ok(id)
    }

    /// Removes a listener. Returns whether it was connected.
    pub fn disconnect(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|r| r.id != id);
        listeners.len() != before
    }

    /// Number of listeners connected to `kind`.
    #[must_use]
    pub fn listener_count(&self, kind: S::Kind) -> usize {
        self.listeners.read().iter().filter(|r| r.kind == kind).count()
    }

    /// Stops delivery on this bus until the matching [`SignalBus::enable`].
    pub fn disable(&self) {
        gate::disable(&self.disabled);
    }

    /// Undoes one [`SignalBus::disable`].
    pub fn enable(&self) {
        gate::enable(&self.disabled);
    }

    /// Disables this bus until the returned guard is dropped.
    #[must_use = "signals are re-enabled as soon as the guard is dropped"]
    pub fn suppress(&self) -> SuppressionGuard {
        SuppressionGuard::new(Arc::clone(&self.disabled))
    }

    /// Whether delivery is currently enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.disabled.load(Ordering::SeqCst) == 0 && self.gate.is_open()
    }

    /// Delivers `signal` to every listener of its kind, in connection order.
    ///
    /// Listeners run with no bus lock held, so they may connect, disconnect
    /// or emit other kinds. A panicking listener is logged and counted in
    /// [`EmitReport::failed`]; the remaining listeners still run.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SignalContractViolation`] if the kind is not
    /// declared or the value's shape differs from the declaration.
    pub fn emit(&self, signal: &S) -> CoreResult<EmitReport> {
        let kind = signal.kind();
        let declared = self.declared.read().get(&kind).copied();
        match declared {
            None => {
                let err = CoreError::signal_violation(format!("emit of undeclared signal {kind:?}"));
                error!(error = %err, "signal contract violation");
                return Err(err);
            }
            Some(shape) if shape != signal.shape() => {
                let err = CoreError::signal_violation(format!(
                    "signal {kind:?} declared as {shape:?}, emitted as {:?}",
                    signal.shape()
                ));
                error!(error = %err, "signal contract violation");
                return Err(err);
            }
            Some(_) => {}
        }

        if !self.is_enabled() {
            trace!(?kind, "signal suppressed");
            return Ok(EmitReport {
                suppressed: true,
                ..EmitReport::default()
            });
        }

        if !self.emitting.lock().insert(kind) {
            warn!(?kind, "recursive emit blocked");
            return Ok(EmitReport {
                blocked: true,
                ..EmitReport::default()
            });
        }
        let _emitting = EmittingGuard { bus: self, kind };

        let targets: Vec<Listener<S>> = self
            .listeners
            .read()
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| Arc::clone(&r.listener))
            .collect();

        let mut report = EmitReport::default();
        for listener in targets {
            match panic::catch_unwind(AssertUnwindSafe(|| listener(signal))) {
                Ok(()) => report.delivered += 1,
                Err(payload) => {
                    report.failed += 1;
                    error!(?kind, panic = panic_message(&*payload), "signal listener panicked");
                }
            }
        }
        trace!(?kind, delivered = report.delivered, failed = report.failed, "signal emitted");
        Ok(report)
    }
}

impl<S: Signal> Default for SignalBus<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Signal> fmt::Debug for SignalBus<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalBus")
            .field("declared", &self.declared.read().len())
            .field("listeners", &self.listeners.read().len())
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// Clears the in-flight marker of a kind when delivery ends.
struct EmittingGuard<'a, S: Signal> {
    bus: &'a SignalBus<S>,
    kind: S::Kind,
}

impl<S: Signal> Drop for EmittingGuard<'_, S> {
    fn drop(&mut self) {
        self.bus.emitting.lock().remove(&self.kind);
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
