//! Emitters with unusual capabilities, for exercising verification paths.

use crate::{Capabilities, Emitter, Listener, LocalEmitter};

/// Reports a fixed capability set while delegating everything to an inner [`LocalEmitter`].
///
/// Lets tests observe that nothing was registered after a capability check failed.
#[derive(Debug)]
pub(crate) struct Muted<T> {
    capabilities: Capabilities,
    inner: LocalEmitter<T>,
}

impl<T> Muted<T> {
    pub(crate) fn new(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            inner: LocalEmitter::new(),
        }
    }

    pub(crate) fn listener_count(&self, event: &str) -> usize {
        self.inner.listener_count(event)
    }
}

impl<T> Clone for Muted<T> {
    fn clone(&self) -> Self {
        Self {
            capabilities: self.capabilities,
            inner: self.inner.clone(),
        }
    }
}

impl<T> Emitter<T> for Muted<T> {
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
        self.capabilities
    }
}
