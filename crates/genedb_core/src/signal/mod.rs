//! Typed publish/subscribe signals.
//!
//! A [`SignalBus`] delivers [`Signal`] values synchronously to listeners
//! registered for the signal's kind. Each bus only accepts kinds that were
//! declared on it, with the argument shape they were declared with.
//!
//! # Usage
//!
//! ```rust
//! use genedb_core::signal::{DbSignal, DbSignalKind, SignalBus};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let bus = SignalBus::with_declarations(DbSignal::declarations());
//! let seen = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&seen);
//! bus.connect(DbSignalKind::UndoAvailable, move |_| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! })
//! .unwrap();
//!
//! bus.emit(&DbSignal::UndoAvailable(Some("add person".into()))).unwrap();
//! assert_eq!(seen.load(Ordering::SeqCst), 1);
//! ```
//!
//! Delivery can be suppressed per bus ([`SignalBus::disable`],
//! [`SignalBus::suppress`]) or for every bus sharing a [`SignalGate`].

mod bus;
mod db_signal;
mod gate;

pub use bus::{ArgShape, EmitReport, Listener, ListenerId, Signal, SignalBus};
pub use db_signal::{DbSignal, DbSignalKind};
pub use gate::{SignalGate, SuppressionGuard};
