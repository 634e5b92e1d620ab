//! # Handler references with identity.
//!
//! A [`HandlerRef`] is a callable bound to a receiver, plus a [`HandlerId`] that the
//! mediator uses to detect duplicate registrations.
//!
//! ## Identity
//! ```text
//! bind: HandlerId = (receiver address, TypeId of the bound fn)
//! func: HandlerId = (address of the wrapped callable, TypeId of the closure)
//! ```
//! - Binding the same function to the same `Arc` twice yields equal ids.
//! - Binding it to a different receiver, or binding a different function, does not.
//! - Each `func` call is its own registration target; clones of one `HandlerRef` share it.
//!
//! ## Ownership
//! Receivers are held **weakly**: a registration never keeps its receiver alive, and a
//! registration whose receiver was dropped is skipped on dispatch and pruned later.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use workbus::{Event, HandlerRef};
//!
//! struct Panel;
//! impl Panel {
//!     fn on_done(&self, _ev: &Event) {}
//! }
//!
//! let panel = Arc::new(Panel);
//! let a = HandlerRef::bind(&panel, Panel::on_done);
//! let b = HandlerRef::bind(&panel, Panel::on_done);
//! assert_eq!(a.id(), b.id());
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::{Arc, Weak};

use crate::events::Event;

type Call = dyn Fn(&Event) -> bool + Send + Sync;

/// Identity of a registration target: receiver instance plus bound function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId {
    receiver: usize,
    method: TypeId,
}

/// A callable registered on the mediator.
#[derive(Clone)]
pub struct HandlerRef {
    id: HandlerId,
    name: &'static str,
    liveness: Option<Weak<dyn Any + Send + Sync>>,
    call: Arc<Call>,
}

impl HandlerRef {
    /// Binds `method` to `receiver`.
    ///
    /// The receiver is held weakly; once every strong `Arc` is gone the handler
    /// becomes a no-op and is pruned on the next mutation of the mediator.
    pub fn bind<R, F>(receiver: &Arc<R>, method: F) -> Self
    where
        R: Send + Sync + 'static,
        F: Fn(&R, &Event) + Send + Sync + 'static,
    {
        let weak = Arc::downgrade(receiver);
        let liveness: Weak<dyn Any + Send + Sync> = weak.clone();
        Self {
            id: HandlerId {
                receiver: Arc::as_ptr(receiver) as *const () as usize,
                method: TypeId::of::<F>(),
            },
            name: std::any::type_name::<R>(),
            liveness: Some(liveness),
            call: Arc::new(move |ev: &Event| match weak.upgrade() {
                Some(r) => {
                    method(&r, ev);
                    true
                }
                None => false,
            }),
        }
    }

    /// Wraps a free function or closure without a receiver.
    ///
    /// Every call creates a distinct identity, even for closures built at the same
    /// site; keep the returned `HandlerRef` (or a clone) to unregister it later.
    pub fn func<F>(f: F) -> Self
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let call: Arc<Call> = Arc::new(move |ev: &Event| {
            f(ev);
            true
        });
        Self {
            id: HandlerId {
                receiver: Arc::as_ptr(&call) as *const () as usize,
                method: TypeId::of::<F>(),
            },
            name: std::any::type_name::<F>(),
            liveness: None,
            call,
        }
    }

    /// Identity used for dedup and unregistration.
    #[inline]
    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// Receiver (or function) type name for logs.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// False once the bound receiver has been dropped.
    pub fn is_alive(&self) -> bool {
        self.liveness
            .as_ref()
            .is_none_or(|weak| weak.strong_count() > 0)
    }

    /// Invokes the handler. Returns `false` if the receiver is gone.
    #[inline]
    pub(crate) fn invoke(&self, ev: &Event) -> bool {
        (self.call)(ev)
    }
}

impl fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRef")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}
