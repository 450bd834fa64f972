//! The shared future behind an awaited occurrence and the listener that settles it.

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use tracing::trace;

use crate::{Emitter, Listener, OnceError};

/// A future that settles with the next occurrence of an event.
///
/// The future is a shared handle: clones refer to the same pending occurrence and all of them
/// settle together, with the same result, when it happens. Every clone may be awaited
/// independently and from different tasks; each one that is polled gets woken.
///
/// If the event is the emitter's designated failure event, the future resolves to
/// [`OnceError::Signaled`]. If the emitter discards the subscription without the event ever
/// occurring, it resolves to [`OnceError::Disconnected`].
///
/// # Example
///
/// ```rust
/// use better_events::{BetterEmitter, Emitter};
/// use futures::executor::block_on;
///
/// let emitter = BetterEmitter::<&str>::new();
/// let first = emitter.once("greeting");
/// let second = emitter.once("greeting");
///
/// emitter.emit("greeting", &["hello", "ignored"]);
///
/// assert_eq!(block_on(first), Ok(Some("hello")));
/// assert_eq!(block_on(second), Ok(Some("hello")));
/// ```
pub struct NextOccurrence<V, T> {
    slot: Rc<RefCell<SlotState<V, T>>>,
}

/// Resolves with the first value of the next occurrence, or `None` if it carried no values.
pub type NextValue<T> = NextOccurrence<Option<T>, T>;

/// Resolves with every value of the next occurrence, in order.
pub type NextArgs<T> = NextOccurrence<Vec<T>, T>;

enum SlotState<V, T> {
    Pending(Vec<Waker>),
    Settled(Result<V, OnceError<T>>),
}

impl<V, T> NextOccurrence<V, T> {
    fn new() -> Self {
        Self {
            slot: Rc::new(RefCell::new(SlotState::Pending(Vec::new()))),
        }
    }

    /// Whether the occurrence has happened (or the subscription has been discarded).
    #[must_use]
    pub fn is_settled(&self) -> bool {
        matches!(*self.slot.borrow(), SlotState::Settled(_))
    }

    /// Whether `self` and `other` are handles to the same pending occurrence.
    #[must_use]
    pub fn same_occurrence(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.slot, &other.slot)
    }

    fn settle(&self, result: Result<V, OnceError<T>>) {
        let previous = mem::replace(&mut *self.slot.borrow_mut(), SlotState::Settled(result));

        // Wake outside the borrow; a waker is free to poll us right away.
        if let SlotState::Pending(wakers) = previous {
            for waker in wakers {
                waker.wake();
            }
        }
    }
}

impl<V, T> Clone for NextOccurrence<V, T> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
        }
    }
}

impl<V, T> fmt::Debug for NextOccurrence<V, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NextOccurrence")
            .field("settled", &self.is_settled())
            .field("handles", &Rc::strong_count(&self.slot))
            .finish()
    }
}

impl<V, T> Future for NextOccurrence<V, T>
where
    V: Clone,
    T: Clone,
{
    type Output = Result<V, OnceError<T>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.slot.borrow_mut();

        match &mut *state {
            SlotState::Settled(result) => Poll::Ready(result.clone()),
            SlotState::Pending(wakers) => {
                if !wakers.iter().any(|w| w.will_wake(cx.waker())) {
                    wakers.push(cx.waker().clone());
                }

                Poll::Pending
            }
        }
    }
}

/// The shape an awaited occurrence is reduced to before it resolves the future.
pub(crate) trait Collect<T>: Sized {
    fn collect(values: &[T]) -> Self;
}

impl<T: Clone> Collect<T> for Option<T> {
    fn collect(values: &[T]) -> Self {
        values.first().cloned()
    }
}

impl<T: Clone> Collect<T> for Vec<T> {
    fn collect(values: &[T]) -> Self {
        values.to_vec()
    }
}

/// The resolving side of a [`NextOccurrence`], owned by the one-time listener.
///
/// If the listener is dropped without ever being invoked, the occurrence can no longer happen
/// and the future is settled as disconnected.
struct Settler<V, T> {
    occurrence: NextOccurrence<V, T>,
    on_settle: Option<Box<dyn FnOnce(&NextOccurrence<V, T>)>>,
}

impl<V, T> Settler<V, T> {
    fn settle(mut self, result: Result<V, OnceError<T>>) {
        // Run the hook first so nobody waking up can still find this occurrence in a cache.
        if let Some(on_settle) = self.on_settle.take() {
            on_settle(&self.occurrence);
        }

        self.occurrence.settle(result);
    }
}

impl<V, T> Drop for Settler<V, T> {
    fn drop(&mut self) {
        if self.occurrence.is_settled() {
            return;
        }

        trace!("subscription discarded before the awaited event occurred");

        if let Some(on_settle) = self.on_settle.take() {
            on_settle(&self.occurrence);
        }

        self.occurrence.settle(Err(OnceError::Disconnected));
    }
}

/// Registers a one-time listener on `emitter` and returns the future it settles.
///
/// `on_settle` runs exactly once, immediately before the future settles, whether the event
/// occurred or the subscription was discarded.
pub(crate) fn subscribe_next<E, V, T>(
    emitter: &E,
    event: &str,
    on_settle: impl FnOnce(&NextOccurrence<V, T>) + 'static,
) -> NextOccurrence<V, T>
where
    E: Emitter<T>,
    V: Collect<T> + 'static,
    T: Clone + 'static,
{
    let occurrence = NextOccurrence::new();
    let is_failure = emitter.failure_event() == Some(event);

    let unsettled = RefCell::new(Some(Settler {
        occurrence: occurrence.clone(),
        on_settle: Some(Box::new(on_settle)),
    }));

    emitter.on_once(
        event,
        Listener::new(move |values: &[T]| {
            // The emitter removes one-time listeners before invoking them, but the callback
            // is still reachable through any handle the caller may hold.
            let Some(settler) = unsettled.borrow_mut().take() else {
                return;
            };

            let result = if is_failure {
                Err(OnceError::Signaled(values.first().cloned()))
            } else {
                Ok(V::collect(values))
            };

            settler.settle(result);
        }),
    );

    occurrence
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::cell::Cell;

    use futures::FutureExt;
    use futures::executor::block_on;
    use static_assertions::assert_not_impl_any;
    use testing::with_watchdog;

    use super::*;
    use crate::LocalEmitter;

    assert_not_impl_any!(NextValue<u32>: Send, Sync);

    #[test]
    fn resolves_with_first_value() {
        with_watchdog(|| {
            let emitter = LocalEmitter::<u32>::new();
            let next: NextValue<u32> = subscribe_next(&emitter, "tick", |_| {});

            assert!(!next.is_settled());
            emitter.emit("tick", &[4, 5, 6]);
            assert!(next.is_settled());

            assert_eq!(block_on(next), Ok(Some(4)));
        });
    }

    #[test]
    fn resolves_with_none_for_empty_occurrence() {
        let emitter = LocalEmitter::<u32>::new();
        let next: NextValue<u32> = subscribe_next(&emitter, "tick", |_| {});

        emitter.emit("tick", &[]);

        assert_eq!(next.now_or_never(), Some(Ok(None)));
    }

    #[test]
    fn resolves_with_all_values() {
        let emitter = LocalEmitter::<u32>::new();
        let next: NextArgs<u32> = subscribe_next(&emitter, "tick", |_| {});

        emitter.emit("tick", &[4, 5, 6]);

        assert_eq!(next.now_or_never(), Some(Ok(vec![4, 5, 6])));
    }

    #[test]
    fn failure_event_rejects_with_first_value() {
        let emitter = LocalEmitter::<u32>::new();
        let next: NextArgs<u32> = subscribe_next(&emitter, "error", |_| {});

        emitter.emit("error", &[13, 14]);

        assert_eq!(next.now_or_never(), Some(Err(OnceError::Signaled(Some(13)))));
    }

    #[test]
    fn discarded_subscription_disconnects() {
        let emitter = LocalEmitter::<u32>::new();
        let next: NextValue<u32> = subscribe_next(&emitter, "tick", |_| {});

        emitter.remove_all_listeners("tick");

        assert_eq!(next.now_or_never(), Some(Err(OnceError::Disconnected)));
    }

    #[test]
    fn on_settle_runs_once_before_settling() {
        let emitter = LocalEmitter::<u32>::new();
        let calls = Rc::new(Cell::new(0_u32));

        let next: NextValue<u32> = subscribe_next(&emitter, "tick", {
            let calls = Rc::clone(&calls);
            move |occurrence| {
                assert!(!occurrence.is_settled());
                calls.set(calls.get() + 1);
            }
        });

        emitter.emit("tick", &[1]);
        emitter.emit("tick", &[2]);
        drop(emitter);

        assert_eq!(calls.get(), 1);
        assert_eq!(next.now_or_never(), Some(Ok(Some(1))));
    }

    #[test]
    fn clones_share_the_occurrence() {
        let emitter = LocalEmitter::<u32>::new();
        let next: NextValue<u32> = subscribe_next(&emitter, "tick", |_| {});
        let other = next.clone();

        assert!(next.same_occurrence(&other));

        emitter.emit("tick", &[9]);

        assert_eq!(next.now_or_never(), Some(Ok(Some(9))));
        assert_eq!(other.now_or_never(), Some(Ok(Some(9))));
    }

    #[test]
    fn pending_poll_registers_waker() {
        with_watchdog(|| {
            let emitter = LocalEmitter::<u32>::new();
            let mut next: NextValue<u32> = subscribe_next(&emitter, "tick", |_| {});

            assert!((&mut next).now_or_never().is_none());

            emitter.emit("tick", &[3]);

            assert_eq!(block_on(next), Ok(Some(3)));
        });
    }
}
