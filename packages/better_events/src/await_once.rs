use crate::{CapabilityError, Emitter, NextArgs, NextValue, Role, verify_emitter};

/// Returns a future that resolves with the first value of the next occurrence of `event` on
/// `emitter`.
///
/// Values after the first are discarded; use [`await_once_all()`] to keep them. If `event` is
/// the emitter's failure event, the future rejects with [`OnceError::Signaled`] instead.
///
/// Works with any [`Emitter`]. Emitters that keep an await cache, such as
/// [`BetterEmitter`][crate::BetterEmitter], hand every caller waiting on the same event the same
/// future instead of subscribing again.
///
/// # Errors
///
/// Returns a [`CapabilityError`] naming [`Role::Emitter`] if `emitter` is absent or cannot
/// subscribe and emit. Nothing is registered in that case.
///
/// # Example
///
/// ```rust
/// use better_events::{Emitter, LocalEmitter, await_once};
/// use futures::executor::block_on;
///
/// let emitter = LocalEmitter::<u32>::new();
/// let ready = await_once(Some(&emitter), "ready").unwrap();
///
/// emitter.emit("ready", &[1, 2]);
///
/// assert_eq!(block_on(ready), Ok(Some(1)));
/// ```
///
/// [`OnceError::Signaled`]: crate::OnceError::Signaled
pub fn await_once<T, E>(
    emitter: Option<&E>,
    event: &str,
) -> Result<NextValue<T>, CapabilityError>
where
    E: Emitter<T>,
    T: Clone + 'static,
{
    let emitter = verify_emitter(emitter, Role::Emitter)?;
    Ok(emitter.next_value(event))
}

/// Returns a future that resolves with every value of the next occurrence of `event` on
/// `emitter`, in order.
///
/// The failure event is the exception: it always rejects with its first value, as with
/// [`await_once()`].
///
/// # Errors
///
/// Returns a [`CapabilityError`] naming [`Role::Emitter`] if `emitter` is absent or cannot
/// subscribe and emit. Nothing is registered in that case.
pub fn await_once_all<T, E>(
    emitter: Option<&E>,
    event: &str,
) -> Result<NextArgs<T>, CapabilityError>
where
    E: Emitter<T>,
    T: Clone + 'static,
{
    let emitter = verify_emitter(emitter, Role::Emitter)?;
    Ok(emitter.next_args(event))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use futures::FutureExt;

    use super::*;
    use crate::test_support::Muted;
    use crate::{BetterEmitter, Capabilities, LocalEmitter, OnceError};

    #[test]
    fn plain_emitter_resolves_each_awaiter() {
        let emitter = LocalEmitter::<u32>::new();

        let first = await_once(Some(&emitter), "tick").unwrap();
        let second = await_once(Some(&emitter), "tick").unwrap();

        // Without a cache, each call is its own subscription.
        assert!(!first.same_occurrence(&second));
        assert_eq!(emitter.listener_count("tick"), 2);

        emitter.emit("tick", &[1, 2]);

        assert_eq!(first.now_or_never(), Some(Ok(Some(1))));
        assert_eq!(second.now_or_never(), Some(Ok(Some(1))));
    }

    #[test]
    fn all_mode_keeps_every_value() {
        let emitter = LocalEmitter::<u32>::new();
        let args = await_once_all(Some(&emitter), "tick").unwrap();

        emitter.emit("tick", &[1, 2, 3]);

        assert_eq!(args.now_or_never(), Some(Ok(vec![1, 2, 3])));
    }

    #[test]
    fn failure_event_rejects_in_both_modes() {
        let emitter = LocalEmitter::<&str>::new();
        let single = await_once(Some(&emitter), "error").unwrap();
        let all = await_once_all(Some(&emitter), "error").unwrap();

        emitter.emit("error", &["boom"]);

        assert_eq!(
            single.now_or_never(),
            Some(Err(OnceError::Signaled(Some("boom"))))
        );
        assert_eq!(all.now_or_never(), Some(Err(OnceError::Signaled(Some("boom")))));
    }

    #[test]
    fn better_emitter_is_deduplicated() {
        let emitter = BetterEmitter::<u32>::new();

        let first = await_once(Some(&emitter), "tick").unwrap();
        let second = await_once(Some(&emitter), "tick").unwrap();

        assert!(first.same_occurrence(&second));
        assert_eq!(emitter.inner().listener_count("tick"), 1);
    }

    #[test]
    fn absent_emitter_is_rejected() {
        let error = await_once(None::<&LocalEmitter<u32>>, "tick").unwrap_err();

        assert_eq!(error.role(), Role::Emitter);
    }

    #[test]
    fn incapable_emitter_is_rejected_without_subscribing() {
        let muted = Muted::<u32>::new(Capabilities::new(true, false));

        let error = await_once_all(Some(&muted), "tick").unwrap_err();

        assert!(matches!(error, CapabilityError::Incapable { role: Role::Emitter }));
        assert_eq!(muted.listener_count("tick"), 0);
    }
}
