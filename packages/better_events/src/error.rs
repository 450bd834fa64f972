use std::fmt::{self, Display};

use thiserror::Error;

/// The role an argument was expected to play when it failed capability verification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Role {
    /// The emitter whose events are being listened to.
    Source,

    /// The emitter that re-emits forwarded events.
    Target,

    /// The emitter whose next occurrence is being awaited.
    Emitter,
}

impl Display for Role {
    #[cfg_attr(test, mutants::skip)] // No API contract for role names.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::Target => write!(f, "target"),
            Self::Emitter => write!(f, "emitter"),
        }
    }
}

/// An argument that was required to act as an event emitter could not do so.
///
/// This is a caller error and is never worth retrying with the same arguments.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CapabilityError {
    /// No emitter was provided for the role.
    #[error("{role} must be an event emitter but none was provided")]
    Absent {
        /// The role the missing argument was expected to play.
        role: Role,
    },

    /// The provided value does not support subscribing to and emitting events.
    #[error("{role} must be an event emitter capable of subscribing and emitting")]
    Incapable {
        /// The role the argument was expected to play.
        role: Role,
    },
}

impl CapabilityError {
    /// The role of the argument that failed verification.
    #[must_use]
    pub fn role(&self) -> Role {
        match self {
            Self::Absent { role } | Self::Incapable { role } => *role,
        }
    }
}

/// The reason an awaited occurrence did not produce a value.
///
/// Futures handed out by the await cache are shared between all callers waiting on the same
/// event, so this error is cloned to each of them.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum OnceError<T> {
    /// The designated failure event occurred. Carries the first value of that occurrence, if any.
    #[error("the emitter signaled a failure")]
    Signaled(Option<T>),

    /// The subscription was discarded before the event occurred, so it never will.
    #[error("the emitter discarded the subscription before the event occurred")]
    Disconnected,
}

impl<T> OnceError<T> {
    /// Returns the value carried by a signaled failure, consuming the error.
    ///
    /// Returns `None` for [`OnceError::Disconnected`] and for failures signaled without a value.
    #[must_use]
    pub fn into_signaled(self) -> Option<T> {
        match self {
            Self::Signaled(value) => value,
            Self::Disconnected => None,
        }
    }
}
