#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Awaitable once-subscriptions and event bridging for single-threaded event emitters.
//!
//! The crate is built around the [`Emitter`] trait: a publish/subscribe primitive where listeners
//! subscribe to named events and [`Emitter::emit()`] synchronously invokes every listener of an
//! event with the payload values of the occurrence. [`LocalEmitter`] is the provided
//! implementation.
//!
//! On top of any emitter, this crate adds:
//!
//! * **Awaiting the next occurrence** of an event as a future instead of a callback, via
//!   [`await_once()`] / [`await_once_all()`] or [`BetterEmitter::once()`] /
//!   [`BetterEmitter::once_all()`]. The designated failure event (`"error"` by default) rejects the
//!   future with [`OnceError::Signaled`] instead of resolving it.
//! * **Deduplicated awaiting**: [`BetterEmitter`] keeps at most one pending future per event and
//!   mode. Every caller waiting on the same event receives the same future, backed by one
//!   subscription.
//! * **Bridging** events from one emitter to another, via [`bridge()`] or
//!   [`BetterEmitter::collect()`], [`BetterEmitter::collect_once()`],
//!   [`BetterEmitter::share()`] and [`BetterEmitter::share_once()`].
//!
//! Everything is single-threaded: emission and listener invocation happen on the thread that calls
//! `emit()`, and awaiting never blocks a thread.
//!
//! # Example
//!
//! ```rust
//! use better_events::{BetterEmitter, Emitter, LocalEmitter, RelayMode, await_once, bridge};
//! use futures::executor::block_on;
//!
//! let emitter1 = LocalEmitter::<&str>::new();
//! let emitter2 = BetterEmitter::<&str>::new();
//!
//! // If emitter1 emits "go", emitter2 emits it too.
//! bridge("go", Some(&emitter1), Some(&emitter2), RelayMode::Forever).unwrap();
//!
//! let go = await_once(Some(&emitter2), "go").unwrap();
//! emitter1.emit("go", &["now"]);
//!
//! assert_eq!(block_on(go), Ok(Some("now")));
//! ```
//!
//! # Failure events
//!
//! ```rust
//! use better_events::{BetterEmitter, Emitter, OnceError};
//! use futures::executor::block_on;
//!
//! let emitter = BetterEmitter::<String>::new();
//! let done = emitter.once("done");
//! let failed = emitter.once("error");
//!
//! emitter.emit("error", &["disk full".to_string()]);
//!
//! assert_eq!(
//!     block_on(failed),
//!     Err(OnceError::Signaled(Some("disk full".to_string())))
//! );
//! assert!(!done.is_settled());
//! ```

mod await_once;
mod better;
mod bridge;
mod constants;
mod emitter;
mod error;
mod local_emitter;
mod pending;
mod verify;

#[cfg(test)]
mod test_support;

pub use await_once::*;
pub use better::*;
pub use bridge::*;
pub use constants::*;
pub use emitter::*;
pub use error::*;
pub use local_emitter::*;
pub use pending::{NextArgs, NextOccurrence, NextValue};
pub use verify::*;
