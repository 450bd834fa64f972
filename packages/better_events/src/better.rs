//! The augmented emitter: awaitable, deduplicated `once` and event bridging.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use foldhash::{HashMap, HashMapExt};
use tracing::debug;

use crate::pending::{self, Collect};
use crate::{
    Capabilities, CapabilityError, Emitter, Listener, LocalEmitter, NextArgs, NextOccurrence,
    NextValue, RelayHandle, RelayMode, bridge,
};

/// An event emitter augmented with awaitable one-time subscriptions and event bridging.
///
/// Wraps any [`Emitter`] (a [`LocalEmitter`] by default) and delegates plain publish/subscribe to
/// it. On top of that it offers:
///
/// * [`once()`][Self::once] and [`once_all()`][Self::once_all], which return a future for the next
///   occurrence of an event. Concurrent callers waiting on the same event in the same mode share a
///   single future and a single underlying subscription.
/// * [`collect()`][Self::collect], [`collect_once()`][Self::collect_once],
///   [`share()`][Self::share] and [`share_once()`][Self::share_once], which forward an event from
///   another emitter into this one or from this one into another.
///
/// `BetterEmitter` is a handle: clones always share the await cache, and they clone the wrapped
/// emitter. Wrap a handle emitter such as [`LocalEmitter`] when cloning. If `E` has value
/// semantics, each clone owns a separate emitter and an await started through one clone may be
/// joined through another while listening on the first clone's emitter.
///
/// # Example
///
/// ```rust
/// use better_events::{BetterEmitter, Emitter};
/// use futures::executor::block_on;
///
/// let first = BetterEmitter::<&str>::new();
/// let second = BetterEmitter::<&str>::new();
///
/// // Whenever `first` emits "go", `second` emits it too.
/// first.share("go", Some(&second)).unwrap();
///
/// let go = second.once("go");
/// first.emit("go", &["now"]);
///
/// assert_eq!(block_on(go), Ok(Some("now")));
/// ```
pub struct BetterEmitter<T, E = LocalEmitter<T>> {
    inner: E,
    cache: Rc<RefCell<AwaitCache<T>>>,
}

/// Futures that have not settled yet, one map per mode, keyed by event name.
struct AwaitCache<T> {
    values: HashMap<String, NextValue<T>>,
    args: HashMap<String, NextArgs<T>>,
}

impl<T> AwaitCache<T> {
    fn new() -> Self {
        Self {
            values: HashMap::new(),
            args: HashMap::new(),
        }
    }

    fn len(&self) -> usize {
        self.values.len().saturating_add(self.args.len())
    }
}

/// Selects the map of the await cache that holds futures of a given shape.
trait Cached<T>: Collect<T> + Sized {
    fn slots(cache: &mut AwaitCache<T>) -> &mut HashMap<String, NextOccurrence<Self, T>>;
}

impl<T: Clone> Cached<T> for Option<T> {
    fn slots(cache: &mut AwaitCache<T>) -> &mut HashMap<String, NextValue<T>> {
        &mut cache.values
    }
}

impl<T: Clone> Cached<T> for Vec<T> {
    fn slots(cache: &mut AwaitCache<T>) -> &mut HashMap<String, NextArgs<T>> {
        &mut cache.args
    }
}

impl<T> BetterEmitter<T> {
    /// Creates an augmented emitter wrapping a new [`LocalEmitter`] with default settings.
    ///
    /// Use [`BetterEmitter::wrap()`] with [`LocalEmitter::builder()`] for custom configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::wrap(LocalEmitter::new())
    }
}

impl<T, E> BetterEmitter<T, E>
where
    E: Emitter<T>,
{
    /// Augments an existing emitter.
    ///
    /// The failure event of the result is that of `inner`.
    #[must_use]
    pub fn wrap(inner: E) -> Self {
        Self {
            inner,
            cache: Rc::new(RefCell::new(AwaitCache::new())),
        }
    }

    /// The wrapped emitter.
    #[must_use]
    pub fn inner(&self) -> &E {
        &self.inner
    }

    /// The number of awaited occurrences that have not happened yet, across both modes.
    #[must_use]
    pub fn pending_awaits(&self) -> usize {
        self.cache.borrow().len()
    }

    /// Returns a future that resolves with the first value of the next occurrence of `event`.
    ///
    /// While a previous future for `event` is still pending, the same future is returned again
    /// rather than subscribing a second time. Once it settles, the next call starts a fresh one.
    ///
    /// If `event` is the failure event, the future rejects with
    /// [`OnceError::Signaled`][crate::OnceError::Signaled].
    #[must_use]
    pub fn once(&self, event: &str) -> NextValue<T>
    where
        T: Clone + 'static,
    {
        self.cached(event)
    }

    /// Returns a future that resolves with every value of the next occurrence of `event`.
    ///
    /// Cached like [`once()`][Self::once] but independently of it. The failure event still
    /// rejects with its first value only.
    #[must_use]
    pub fn once_all(&self, event: &str) -> NextArgs<T>
    where
        T: Clone + 'static,
    {
        self.cached(event)
    }

    fn cached<V>(&self, event: &str) -> NextOccurrence<V, T>
    where
        V: Cached<T> + 'static,
        T: Clone + 'static,
    {
        if let Some(occurrence) = V::slots(&mut self.cache.borrow_mut()).get(event) {
            debug!(event, "joining pending await");
            return occurrence.clone();
        }

        let cache = Rc::downgrade(&self.cache);
        let key = event.to_owned();

        let occurrence = pending::subscribe_next(&self.inner, event, move |settled| {
            evict::<V, T>(&cache, &key, settled);
        });

        // An emitter may discard the subscription while registering it, in which case the
        // occurrence is already settled and must not linger in the cache.
        if occurrence.is_settled() {
            debug!(event, "pending await settled during subscription");
            return occurrence;
        }

        V::slots(&mut self.cache.borrow_mut()).insert(event.to_owned(), occurrence.clone());
        debug!(event, "created pending await");

        occurrence
    }

    /// Forwards every occurrence of `event` on `source` into this emitter.
    ///
    /// # Errors
    ///
    /// Returns a [`CapabilityError`] naming the source if it is absent or incapable. Nothing is
    /// registered in that case.
    pub fn collect<S>(
        &self,
        event: &str,
        source: Option<&S>,
    ) -> Result<RelayHandle<T>, CapabilityError>
    where
        T: 'static,
        S: Emitter<T>,
        E: Clone + 'static,
    {
        bridge(event, source, Some(self), RelayMode::Forever)
    }

    /// Forwards the next occurrence of `event` on `source` into this emitter.
    ///
    /// # Errors
    ///
    /// Returns a [`CapabilityError`] naming the source if it is absent or incapable. Nothing is
    /// registered in that case.
    pub fn collect_once<S>(
        &self,
        event: &str,
        source: Option<&S>,
    ) -> Result<RelayHandle<T>, CapabilityError>
    where
        T: 'static,
        S: Emitter<T>,
        E: Clone + 'static,
    {
        bridge(event, source, Some(self), RelayMode::Once)
    }

    /// Forwards every occurrence of `event` on this emitter to `target`.
    ///
    /// # Errors
    ///
    /// Returns a [`CapabilityError`] naming the target if it is absent or incapable. Nothing is
    /// registered in that case.
    pub fn share<D>(
        &self,
        event: &str,
        target: Option<&D>,
    ) -> Result<RelayHandle<T>, CapabilityError>
    where
        T: 'static,
        D: Emitter<T> + Clone + 'static,
    {
        bridge(event, Some(self), target, RelayMode::Forever)
    }

    /// Forwards the next occurrence of `event` on this emitter to `target`.
    ///
    /// # Errors
    ///
    /// Returns a [`CapabilityError`] naming the target if it is absent or incapable. Nothing is
    /// registered in that case.
    pub fn share_once<D>(
        &self,
        event: &str,
        target: Option<&D>,
    ) -> Result<RelayHandle<T>, CapabilityError>
    where
        T: 'static,
        D: Emitter<T> + Clone + 'static,
    {
        bridge(event, Some(self), target, RelayMode::Once)
    }
}

/// Removes a settled occurrence from the await cache, unless the cache is gone or already holds a
/// newer occurrence for the same event.
fn evict<V, T>(
    cache: &Weak<RefCell<AwaitCache<T>>>,
    event: &str,
    settled: &NextOccurrence<V, T>,
) where
    V: Cached<T>,
{
    let Some(cache) = cache.upgrade() else {
        return;
    };

    // Settling can happen while the emitter itself is being torn down mid-call.
    let Ok(mut cache) = cache.try_borrow_mut() else {
        return;
    };

    let slots = V::slots(&mut cache);

    if slots
        .get(event)
        .is_some_and(|current| current.same_occurrence(settled))
    {
        slots.remove(event);
        debug!(event, "pending await settled");
    }
}

impl<T, E> Emitter<T> for BetterEmitter<T, E>
where
    E: Emitter<T>,
{
    fn on(&self, event: &str, listener: Listener<T>) -> &Self {
        self.inner.on(event, listener);
        self
    }

    fn on_once(&self, event: &str, listener: Listener<T>) -> &Self {
        self.inner.on_once(event, listener);
        self
    }

    fn off(&self, event: &str, listener: &Listener<T>) -> bool {
        self.inner.off(event, listener)
    }

    fn emit(&self, event: &str, values: &[T]) -> bool {
        self.inner.emit(event, values)
    }

    fn capabilities(&self) -> Capabilities {
        self.inner.capabilities()
    }

    fn failure_event(&self) -> Option<&str> {
        self.inner.failure_event()
    }

    fn next_value(&self, event: &str) -> NextValue<T>
    where
        Self: Sized,
        T: Clone + 'static,
    {
        self.once(event)
    }

    fn next_args(&self, event: &str) -> NextArgs<T>
    where
        Self: Sized,
        T: Clone + 'static,
    {
        self.once_all(event)
    }
}

impl<T, E> Clone for BetterEmitter<T, E>
where
    E: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            cache: Rc::clone(&self.cache),
        }
    }
}

impl<T> Default for BetterEmitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> fmt::Debug for BetterEmitter<T, E>
where
    E: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cache = self.cache.borrow();

        f.debug_struct("BetterEmitter")
            .field("inner", &self.inner)
            .field("pending_values", &cache.values.len())
            .field("pending_args", &cache.args.len())
            .finish()
    }
}
