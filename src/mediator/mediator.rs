//! # Mediator: synchronous publish/subscribe registry.
//!
//! The [`Mediator`] maps each [`EventCode`] to an ordered list of [`HandlerRef`]s and
//! dispatches `emit` calls to them on the caller's thread.
//!
//! ## Architecture
//! ```text
//! emit(code, payload)
//!   ├─► read lock ─► snapshot handlers[code] ─► unlock
//!   ├─► for h in snapshot (registration order):
//!   │      catch_unwind(h(&event))
//!   │        └─ panic ─► error! + emit(HandlerPanicked)
//!   └─► Tap::publish(&event)  (async observers)
//! ```
//!
//! ## Rules
//! - **Dedup**: registering an equal `(code, HandlerId)` twice is a no-op.
//! - **Order**: handlers for a code run in registration order on every emit.
//! - **Snapshot**: a handler may register/unregister during its own invocation;
//!   the change applies from the next emit.
//! - **Isolation**: a panicking handler never stops the remaining handlers and never
//!   reaches the emitter.
//! - Handlers must be cheap: real work is delegated to a [`Worker`](crate::Worker).

use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{PoisonError, RwLock};

use tokio::sync::broadcast;
use tracing::{error, trace};

use super::handler::{HandlerId, HandlerRef};
use crate::error::panic_message;
use crate::events::{Event, EventCode, HandlerPanic, Payload, Tap};

/// Receipt for a registration; pass it to [`Mediator::release`] to undo it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationHandle {
    code: EventCode,
    id: HandlerId,
}

impl RegistrationHandle {
    /// The registered code.
    pub fn code(&self) -> EventCode {
        self.code
    }

    /// The registered handler identity.
    pub fn id(&self) -> HandlerId {
        self.id
    }
}

/// Pub/sub registry and dispatcher.
///
/// Safe to share across threads (`Arc<Mediator>`); registration and emit may be
/// called concurrently from any thread.
#[derive(Debug)]
pub struct Mediator {
    handlers: RwLock<BTreeMap<EventCode, Vec<HandlerRef>>>,
    tap: Tap,
}

impl Mediator {
    /// Creates a mediator whose async tap buffers up to `tap_capacity` events.
    pub fn new(tap_capacity: usize) -> Self {
        Self {
            handlers: RwLock::new(BTreeMap::new()),
            tap: Tap::new(tap_capacity),
        }
    }

    /// Adds `handler` for `code`.
    ///
    /// If an equivalent registration already exists this is a no-op returning the
    /// existing handle. Registrations whose receiver was dropped are pruned first.
    pub fn register(&self, code: EventCode, handler: HandlerRef) -> RegistrationHandle {
        let handle = RegistrationHandle {
            code,
            id: handler.id(),
        };
        let mut map = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        let list = map.entry(code).or_default();
        list.retain(HandlerRef::is_alive);

        if list.iter().any(|h| h.id() == handle.id) {
            trace!(code = %code, handler = handler.name(), "duplicate registration ignored");
            return handle;
        }
        trace!(code = %code, handler = handler.name(), "handler registered");
        list.push(handler);
        handle
    }

    /// Removes the registration of `handler` for `code`, if present.
    pub fn unregister(&self, code: EventCode, handler: &HandlerRef) {
        self.remove(code, handler.id());
    }

    /// Removes the registration described by `handle`, if still present.
    pub fn release(&self, handle: RegistrationHandle) {
        self.remove(handle.code, handle.id);
    }

    fn remove(&self, code: EventCode, id: HandlerId) {
        let mut map = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(list) = map.get_mut(&code) {
            list.retain(|h| h.id() != id && h.is_alive());
            if list.is_empty() {
                map.remove(&code);
            }
        }
    }

    /// Invokes every handler registered for `code`, in registration order.
    ///
    /// Fire-and-forget: returns after all handlers ran; handler panics are caught,
    /// logged and reported through [`EventCode::HandlerPanicked`].
    pub fn emit(&self, code: EventCode, payload: Payload) {
        self.dispatch(&Event::new(code, payload));
    }

    /// Shorthand for `emit(code, Payload::None)`.
    #[inline]
    pub fn signal(&self, code: EventCode) {
        self.emit(code, Payload::None);
    }

    /// Dispatches an already-built event.
    pub fn dispatch(&self, ev: &Event) {
        let snapshot: Vec<HandlerRef> = {
            let map = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
            match map.get(&ev.code) {
                Some(list) => list.clone(),
                None => Vec::new(),
            }
        };
        trace!(code = %ev.code, seq = ev.seq, handlers = snapshot.len(), "emit");

        for handler in &snapshot {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| handler.invoke(ev))) {
                let info = panic_message(panic.as_ref());
                error!(
                    code = %ev.code,
                    handler = handler.name(),
                    "handler panicked: {info}"
                );
                if ev.code != EventCode::HandlerPanicked {
                    self.emit(
                        EventCode::HandlerPanicked,
                        Payload::Panicked(HandlerPanic {
                            code: ev.code,
                            handler: handler.name(),
                            info: info.into(),
                        }),
                    );
                }
            }
        }
        self.tap.publish(ev);
    }

    /// Creates a receiver observing every subsequently emitted event.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tap.subscribe()
    }

    /// Number of live registrations for `code`.
    pub fn handler_count(&self, code: EventCode) -> usize {
        let map = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        map.get(&code)
            .map(|list| list.iter().filter(|h| h.is_alive()).count())
            .unwrap_or(0)
    }
}

impl Default for Mediator {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_TAP_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Recorder {
        tag: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Recorder {
        fn on_event(&self, _ev: &Event) {
            self.log.lock().unwrap().push(self.tag);
        }
    }

    #[test]
    fn test_emit_without_handlers_is_noop() {
        let m = Mediator::default();
        m.signal(EventCode::ShutdownRequested);
        assert_eq!(m.handler_count(EventCode::ShutdownRequested), 0);
    }

    #[test]
    fn test_dropped_receivers_are_pruned_on_register() {
        let m = Mediator::default();
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = Arc::new(Recorder { tag: "a", log: log.clone() });
        let b = Arc::new(Recorder { tag: "b", log: log.clone() });

        m.register(EventCode::AllStoppedWithin, HandlerRef::bind(&a, Recorder::on_event));
        drop(a);
        assert_eq!(m.handler_count(EventCode::AllStoppedWithin), 0);

        m.register(EventCode::AllStoppedWithin, HandlerRef::bind(&b, Recorder::on_event));
        m.signal(EventCode::AllStoppedWithin);
        assert_eq!(*log.lock().unwrap(), vec!["b"]);
    }

    #[test]
    fn test_release_by_handle() {
        let m = Mediator::default();
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = Arc::new(Recorder { tag: "a", log: log.clone() });

        let handle = m.register(EventCode::GraceExceeded, HandlerRef::bind(&a, Recorder::on_event));
        assert_eq!(handle.code(), EventCode::GraceExceeded);
        m.release(handle);
        m.signal(EventCode::GraceExceeded);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_handler_may_register_during_dispatch() {
        let m = Arc::new(Mediator::default());
        let log = Arc::new(Mutex::new(Vec::new()));
        let late = Arc::new(Recorder { tag: "late", log: log.clone() });

        let m2 = Arc::clone(&m);
        let late2 = Arc::clone(&late);
        m.register(
            EventCode::AllStoppedWithin,
            HandlerRef::func(move |_ev: &Event| {
                m2.register(
                    EventCode::AllStoppedWithin,
                    HandlerRef::bind(&late2, Recorder::on_event),
                );
            }),
        );

        m.signal(EventCode::AllStoppedWithin);
        assert!(log.lock().unwrap().is_empty());

        m.signal(EventCode::AllStoppedWithin);
        assert_eq!(*log.lock().unwrap(), vec!["late"]);
    }
}
