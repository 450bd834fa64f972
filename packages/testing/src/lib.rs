#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(coverage_nightly, coverage(off))] // This is all test code, no need to test it.

//! Private helpers for testing and examples in workspace packages.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Runs a test with a timeout to prevent infinite hangs.
///
/// Awaiting an event that never occurs would otherwise block the test forever. If the test
/// takes longer than the timeout to complete, this panics so that CI does not hang.
///
/// The timeout is 10 seconds under normal conditions and 60 seconds under Miri, where thread
/// synchronization primitives are significantly slower.
///
/// When the `MUTATION_TESTING` environment variable is set to "1", the watchdog is disabled and
/// the test function is executed directly. This allows mutation testing to properly detect
/// hanging mutations.
///
/// # Panics
///
/// Panics if the test exceeds the timeout (when not in mutation testing mode).
///
/// # Example
///
/// ```rust
/// use testing::with_watchdog;
///
/// with_watchdog(|| {
///     assert_eq!(2 + 2, 4);
/// });
/// ```
pub fn with_watchdog<F, R>(test_fn: F) -> R
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    if std::env::var("MUTATION_TESTING").as_deref() == Ok("1") {
        return test_fn();
    }

    let (tx, rx) = mpsc::channel();

    let test_handle = thread::spawn(move || {
        let result = test_fn();
        // If this fails, the receiver has timed out.
        drop(tx.send(result));
    });

    let timeout = if cfg!(miri) {
        Duration::from_secs(60)
    } else {
        Duration::from_secs(10)
    };

    match rx.recv_timeout(timeout) {
        Ok(result) => {
            test_handle.join().expect("Test thread should not panic");
            result
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            panic!("Test exceeded {} second timeout", timeout.as_secs());
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            // The test thread panicked; surface its panic.
            match test_handle.join() {
                Ok(()) => panic!("Test thread disconnected unexpectedly"),
                Err(e) => std::panic::resume_unwind(e),
            }
        }
    }
}

/// Records what listener callbacks observed, in invocation order.
///
/// Clones share the same record, so a recorder can hand out any number of callbacks and still
/// be inspected afterwards.
///
/// # Example
///
/// ```rust
/// use testing::Recorder;
///
/// let seen = Recorder::new();
/// let callback = seen.record_values();
///
/// callback(&[1, 2]);
/// callback(&[3]);
///
/// assert_eq!(seen.take(), vec![vec![1, 2], vec![3]]);
/// ```
pub struct Recorder<R> {
    entries: Rc<RefCell<Vec<R>>>,
}

impl<R> Recorder<R> {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Returns a callback that records `map(values)` on every invocation.
    pub fn record_with<T, F>(&self, map: F) -> impl Fn(&[T]) + use<R, T, F>
    where
        F: Fn(&[T]) -> R + 'static,
        R: 'static,
    {
        let entries = Rc::clone(&self.entries);
        move |values: &[T]| entries.borrow_mut().push(map(values))
    }

    /// The number of recorded entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Removes and returns everything recorded so far.
    #[must_use]
    pub fn take(&self) -> Vec<R> {
        self.entries.take()
    }
}

impl<T> Recorder<Vec<T>>
where
    T: Clone + 'static,
{
    /// Returns a callback that records a copy of the values of every invocation.
    pub fn record_values(&self) -> impl Fn(&[T]) + use<T> {
        self.record_with(<[T]>::to_vec)
    }
}

impl<R> Clone for Recorder<R> {
    fn clone(&self) -> Self {
        Self {
            entries: Rc::clone(&self.entries),
        }
    }
}

impl<R> Default for Recorder<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: fmt::Debug> fmt::Debug for Recorder<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recorder")
            .field("entries", &self.entries.borrow())
            .finish()
    }
}
