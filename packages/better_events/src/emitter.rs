use std::fmt;
use std::rc::Rc;

use crate::{DEFAULT_FAILURE_EVENT, NextArgs, NextValue, pending};

/// A callback registered for a named event, invoked with the payload values of each occurrence.
///
/// Listeners are reference-counted and cheap to clone. Equality is identity: two listeners are
/// equal only if one is a clone of the other. This is what [`Emitter::off()`] uses to find the
/// registration to remove, so keep a clone of any listener you intend to unsubscribe later.
///
/// # Example
///
/// ```rust
/// use better_events::{Emitter, Listener, LocalEmitter};
///
/// let emitter = LocalEmitter::<u32>::new();
/// let listener = Listener::new(|values: &[u32]| println!("got {values:?}"));
///
/// emitter.on("tick", listener.clone());
/// assert!(emitter.off("tick", &listener));
/// ```
pub struct Listener<T> {
    callback: Rc<dyn Fn(&[T])>,
}

impl<T> Listener<T> {
    /// Wraps a callback into a listener.
    #[must_use]
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&[T]) + 'static,
    {
        Self {
            callback: Rc::new(callback),
        }
    }

    /// Invokes the listener as if an occurrence with `values` had been delivered to it.
    pub fn call(&self, values: &[T]) {
        (self.callback)(values);
    }
}

impl<T> Clone for Listener<T> {
    fn clone(&self) -> Self {
        Self {
            callback: Rc::clone(&self.callback),
        }
    }
}

impl<T> PartialEq for Listener<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.callback, &other.callback)
    }
}

impl<T> Eq for Listener<T> {}

impl<T> fmt::Debug for Listener<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("callback", &Rc::as_ptr(&self.callback).cast::<()>())
            .finish()
    }
}

/// What a value can currently do as an event emitter.
///
/// Bridging and awaiting only ever require the full capability set. Emitters that are
/// temporarily or permanently unable to subscribe or emit report that here, which makes
/// operations involving them fail with a [`CapabilityError`][crate::CapabilityError] before
/// anything is registered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Capabilities {
    subscribe: bool,
    emit: bool,
}

impl Capabilities {
    /// Able to subscribe (forever and once), unsubscribe and emit.
    pub const FULL: Self = Self::new(true, true);

    /// Able to do nothing.
    pub const NONE: Self = Self::new(false, false);

    /// Creates a capability set from its parts.
    #[must_use]
    pub const fn new(subscribe: bool, emit: bool) -> Self {
        Self { subscribe, emit }
    }

    /// Whether listeners can be registered (forever or for one occurrence) and removed.
    #[must_use]
    pub const fn can_subscribe(self) -> bool {
        self.subscribe
    }

    /// Whether occurrences can be emitted.
    #[must_use]
    pub const fn can_emit(self) -> bool {
        self.emit
    }

    /// Whether every capability is present.
    #[must_use]
    pub const fn is_full(self) -> bool {
        self.subscribe && self.emit
    }
}

/// A single-threaded publish/subscribe primitive delivering occurrences of named events to
/// listeners.
///
/// Delivery is synchronous: [`emit()`][Self::emit] invokes every listener registered for the
/// event, in registration order, before returning.
///
/// The provided methods carry defaults that suit most implementations. Augmented emitters such as
/// [`BetterEmitter`][crate::BetterEmitter] override [`next_value()`][Self::next_value] and
/// [`next_args()`][Self::next_args] to deduplicate concurrent awaiters.
pub trait Emitter<T> {
    /// Registers `listener` for every future occurrence of `event`.
    ///
    /// Returns the emitter to allow chaining.
    fn on(&self, event: &str, listener: Listener<T>) -> &Self;

    /// Registers `listener` for the next occurrence of `event` only.
    ///
    /// The registration is removed before the listener is invoked.
    ///
    /// Returns the emitter to allow chaining.
    fn on_once(&self, event: &str, listener: Listener<T>) -> &Self;

    /// Removes one registration of `listener` for `event`.
    ///
    /// Returns `true` if a registration was removed.
    fn off(&self, event: &str, listener: &Listener<T>) -> bool;

    /// Delivers an occurrence of `event` carrying `values` to every registered listener.
    ///
    /// Returns `true` if the event had any listeners.
    fn emit(&self, event: &str, values: &[T]) -> bool;

    /// Reports which emitter roles this value can currently fulfill.
    fn capabilities(&self) -> Capabilities {
        Capabilities::FULL
    }

    /// The event name this emitter uses to signal failure, if any.
    ///
    /// Awaiting this event yields a future that rejects with the delivered value.
    fn failure_event(&self) -> Option<&str> {
        Some(DEFAULT_FAILURE_EVENT)
    }

    /// Returns a future that resolves with the first value of the next occurrence of `event`.
    ///
    /// The default implementation registers a new one-time subscription on every call.
    fn next_value(&self, event: &str) -> NextValue<T>
    where
        Self: Sized,
        T: Clone + 'static,
    {
        pending::subscribe_next(self, event, |_| {})
    }

    /// Returns a future that resolves with all values of the next occurrence of `event`.
    ///
    /// The default implementation registers a new one-time subscription on every call.
    fn next_args(&self, event: &str) -> NextArgs<T>
    where
        Self: Sized,
        T: Clone + 'static,
    {
        pending::subscribe_next(self, event, |_| {})
    }
}
