//! Single-threaded publish/subscribe primitive.

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use foldhash::{HashMap, HashMapExt, HashSet, HashSetExt};
use smallvec::SmallVec;
use tracing::{trace, warn};

use crate::{DEFAULT_FAILURE_EVENT, DEFAULT_MAX_LISTENERS, Emitter, Listener};

/// Most events have only a handful of listeners, so emission snapshots stay on the stack.
type Snapshot<T> = SmallVec<[Listener<T>; 4]>;

/// A single-threaded event emitter that delivers occurrences synchronously, in registration
/// order.
///
/// `LocalEmitter` is a handle: clones refer to the same set of listeners, so a clone can be
/// moved into a listener of another emitter to forward events into this one.
///
/// Emission takes a snapshot of the listeners of the event before invoking any of them.
/// Listeners added while an occurrence is being delivered only see later occurrences, and
/// one-time listeners are unregistered before any listener of the occurrence runs. No internal
/// borrow is held while listeners run, so listeners may freely subscribe, unsubscribe and emit.
///
/// # Example
///
/// ```rust
/// use better_events::{Emitter, Listener, LocalEmitter};
///
/// let emitter = LocalEmitter::<i32>::new();
///
/// emitter
///     .on("sum", Listener::new(|values: &[i32]| println!("{}", values.iter().sum::<i32>())))
///     .on_once("sum", Listener::new(|_: &[i32]| println!("first sum")));
///
/// assert!(emitter.emit("sum", &[1, 2, 3]));
/// assert_eq!(emitter.listener_count("sum"), 1);
/// ```
pub struct LocalEmitter<T> {
    shared: Rc<Shared<T>>,
}

struct Shared<T> {
    max_listeners: usize,
    failure_event: Option<String>,
    registry: RefCell<Registry<T>>,
}

struct Registry<T> {
    /// Event names in the order they first received a listener.
    order: Vec<String>,
    events: HashMap<String, Vec<Registration<T>>>,

    /// Event names we have already warned about exceeding `max_listeners`.
    warned: HashSet<String>,
}

struct Registration<T> {
    listener: Listener<T>,
    once: bool,
}

impl<T> Registry<T> {
    fn new() -> Self {
        Self {
            order: Vec::new(),
            events: HashMap::new(),
            warned: HashSet::new(),
        }
    }

    fn forget_event(&mut self, event: &str) -> Option<Vec<Registration<T>>> {
        let removed = self.events.remove(event)?;
        self.order.retain(|name| name != event);
        self.warned.remove(event);
        Some(removed)
    }
}

impl<T> LocalEmitter<T> {
    /// Creates an emitter with default settings.
    ///
    /// Use [`LocalEmitter::builder()`] for custom configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a builder for configuring an emitter.
    #[must_use]
    pub fn builder() -> LocalEmitterBuilder<T> {
        LocalEmitterBuilder::new()
    }

    /// The number of listeners currently registered for `event`.
    #[must_use]
    pub fn listener_count(&self, event: &str) -> usize {
        self.shared
            .registry
            .borrow()
            .events
            .get(event)
            .map_or(0, Vec::len)
    }

    /// The names of all events that currently have listeners, in the order they first
    /// received one.
    #[must_use]
    pub fn event_names(&self) -> Vec<String> {
        self.shared.registry.borrow().order.clone()
    }

    /// Removes every listener registered for `event`.
    ///
    /// Pending awaits on the event resolve as disconnected.
    pub fn remove_all_listeners(&self, event: &str) {
        let removed = self.shared.registry.borrow_mut().forget_event(event);

        if let Some(removed) = removed {
            trace!(event, count = removed.len(), "removed all listeners");

            // Released outside the borrow; dropping a listener may run arbitrary code.
            drop(removed);
        }
    }

    /// Removes every listener of every event.
    pub fn clear(&self) {
        let removed = {
            let mut registry = self.shared.registry.borrow_mut();
            registry.order.clear();
            registry.warned.clear();
            registry.events.drain().collect::<Vec<_>>()
        };

        trace!(events = removed.len(), "removed all listeners of all events");
        drop(removed);
    }

    fn register(&self, event: &str, listener: Listener<T>, once: bool) {
        let mut registry = self.shared.registry.borrow_mut();

        let count = if let Some(registrations) = registry.events.get_mut(event) {
            registrations.push(Registration { listener, once });
            registrations.len()
        } else {
            registry
                .events
                .insert(event.to_owned(), vec![Registration { listener, once }]);
            registry.order.push(event.to_owned());
            1
        };

        trace!(event, once, count, "registered listener");

        let max = self.shared.max_listeners;
        if max != 0 && count > max && registry.warned.insert(event.to_owned()) {
            warn!(
                event,
                count,
                max,
                "possible listener leak: more listeners registered for one event than allowed"
            );
        }
    }
}

impl<T> Emitter<T> for LocalEmitter<T> {
    fn on(&self, event: &str, listener: Listener<T>) -> &Self {
        self.register(event, listener, false);
        self
    }

    fn on_once(&self, event: &str, listener: Listener<T>) -> &Self {
        self.register(event, listener, true);
        self
    }

    fn off(&self, event: &str, listener: &Listener<T>) -> bool {
        let removed = {
            let mut registry = self.shared.registry.borrow_mut();

            let Some(registrations) = registry.events.get_mut(event) else {
                return false;
            };

            let Some(index) = registrations
                .iter()
                .rposition(|registration| registration.listener == *listener)
            else {
                return false;
            };

            let removed = registrations.remove(index);

            if registrations.is_empty() {
                registry.forget_event(event);
            }

            removed
        };

        trace!(event, "removed listener");
        drop(removed);

        true
    }

    fn emit(&self, event: &str, values: &[T]) -> bool {
        let snapshot: Snapshot<T> = {
            let mut registry = self.shared.registry.borrow_mut();

            let Some(registrations) = registry.events.get_mut(event) else {
                if self.failure_event() == Some(event) {
                    warn!(event, "failure event emitted with no listeners");
                }

                return false;
            };

            let snapshot = registrations
                .iter()
                .map(|registration| registration.listener.clone())
                .collect();

            registrations.retain(|registration| !registration.once);

            if registrations.is_empty() {
                registry.forget_event(event);
            }

            snapshot
        };

        for listener in &snapshot {
            listener.call(values);
        }

        true
    }

    fn failure_event(&self) -> Option<&str> {
        self.shared.failure_event.as_deref()
    }
}

impl<T> Clone for LocalEmitter<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<T> Default for LocalEmitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for LocalEmitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalEmitter")
            .field("max_listeners", &self.shared.max_listeners)
            .field("failure_event", &self.shared.failure_event)
            .field("event_names", &self.event_names())
            .finish_non_exhaustive()
    }
}

/// Builder for configuring a [`LocalEmitter`].
pub struct LocalEmitterBuilder<T> {
    max_listeners: usize,
    failure_event: Option<String>,
    _payload: PhantomData<fn(&[T])>,
}

impl<T> LocalEmitterBuilder<T> {
    fn new() -> Self {
        Self {
            max_listeners: DEFAULT_MAX_LISTENERS,
            failure_event: Some(DEFAULT_FAILURE_EVENT.to_owned()),
            _payload: PhantomData,
        }
    }

    /// Sets how many listeners one event may have before a possible leak is logged.
    ///
    /// Zero disables the warning. Default is [`DEFAULT_MAX_LISTENERS`].
    #[must_use]
    pub fn max_listeners(mut self, max: usize) -> Self {
        self.max_listeners = max;
        self
    }

    /// Sets the name of the event used to signal failure.
    ///
    /// Default is [`DEFAULT_FAILURE_EVENT`].
    #[must_use]
    pub fn failure_event(mut self, event: impl Into<String>) -> Self {
        self.failure_event = Some(event.into());
        self
    }

    /// Treats every event as ordinary data, including the one that would signal failure.
    #[must_use]
    pub fn without_failure_event(mut self) -> Self {
        self.failure_event = None;
        self
    }

    /// Builds the emitter with the configured settings.
    #[must_use]
    pub fn build(self) -> LocalEmitter<T> {
        LocalEmitter {
            shared: Rc::new(Shared {
                max_listeners: self.max_listeners,
                failure_event: self.failure_event,
                registry: RefCell::new(Registry::new()),
            }),
        }
    }
}

impl<T> fmt::Debug for LocalEmitterBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalEmitterBuilder")
            .field("max_listeners", &self.max_listeners)
            .field("failure_event", &self.failure_event)
            .finish()
    }
}
