use tracing::{debug, trace};

use crate::{CapabilityError, Emitter, Listener, Role, verify_emitter};

/// The listener a bridge registered on its source.
///
/// Calling it emits on the target directly. Passing it to [`Emitter::off()`] on the source
/// tears the bridge down.
pub type RelayHandle<T> = Listener<T>;

/// How long a bridge keeps forwarding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum RelayMode {
    /// Forward every occurrence until the relay is removed from the source.
    #[default]
    Forever,

    /// Forward the next occurrence only. The relay removes itself from the source after firing.
    Once,
}

/// Forwards occurrences of `event` on `source` to `target`, which re-emits them under the same
/// name with the same values, in the same order, before the source's emission returns.
///
/// The relay holds a clone of `target`, so for handle-style emitters such as
/// [`LocalEmitter`][crate::LocalEmitter] the target stays alive at least as long as the relay
/// stays registered.
///
/// # Errors
///
/// Returns a [`CapabilityError`] naming [`Role::Source`] or [`Role::Target`] if either argument
/// is absent or cannot subscribe and emit. The source is checked first. Nothing is registered on
/// either emitter in that case.
///
/// # Example
///
/// ```rust
/// use better_events::{Emitter, Listener, LocalEmitter, RelayMode, bridge};
///
/// let upstream = LocalEmitter::<u32>::new();
/// let downstream = LocalEmitter::<u32>::new();
///
/// let relay = bridge("go", Some(&upstream), Some(&downstream), RelayMode::Forever).unwrap();
/// downstream.on("go", Listener::new(|values: &[u32]| assert_eq!(values, [7])));
///
/// upstream.emit("go", &[7]);
///
/// // The handle is the listener registered on the source.
/// assert!(upstream.off("go", &relay));
/// ```
pub fn bridge<T, S, D>(
    event: &str,
    source: Option<&S>,
    target: Option<&D>,
    mode: RelayMode,
) -> Result<RelayHandle<T>, CapabilityError>
where
    T: 'static,
    S: Emitter<T>,
    D: Emitter<T> + Clone + 'static,
{
    let source = verify_emitter(source, Role::Source)?;
    let target = verify_emitter(target, Role::Target)?.clone();

    let relay = Listener::new({
        let event = event.to_owned();
        move |values: &[T]| {
            trace!(event, count = values.len(), "relaying occurrence");
            target.emit(&event, values);
        }
    });

    match mode {
        RelayMode::Forever => source.on(event, relay.clone()),
        RelayMode::Once => source.on_once(event, relay.clone()),
    };

    debug!(event, ?mode, "bridge registered");

    Ok(relay)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use testing::Recorder;

    use super::*;
    use crate::test_support::Muted;
    use crate::{Capabilities, LocalEmitter};

    #[test]
    fn forever_forwards_every_occurrence_in_order() {
        let source = LocalEmitter::<u32>::new();
        let target = LocalEmitter::<u32>::new();
        let seen = Recorder::new();

        target.on("event", Listener::new(seen.record_values()));
        bridge("event", Some(&source), Some(&target), RelayMode::Forever).unwrap();

        for _ in 0..5 {
            source.emit("event", &[1, 2, 3]);
        }

        assert_eq!(seen.take(), vec![vec![1, 2, 3]; 5]);
    }

    #[test]
    fn once_forwards_first_occurrence_only() {
        let source = LocalEmitter::<u32>::new();
        let target = LocalEmitter::<u32>::new();
        let seen = Recorder::new();

        target.on("event", Listener::new(seen.record_values()));
        bridge("event", Some(&source), Some(&target), RelayMode::Once).unwrap();

        source.emit("event", &[1, 2, 3]);
        source.emit("event", &[4, 5, 6]);

        assert_eq!(seen.take(), vec![vec![1, 2, 3]]);
        assert_eq!(source.listener_count("event"), 0);
    }

    #[test]
    fn other_events_are_not_forwarded() {
        let source = LocalEmitter::<u32>::new();
        let target = LocalEmitter::<u32>::new();
        let seen = Recorder::new();

        target.on("other", Listener::new(seen.record_values()));
        bridge("event", Some(&source), Some(&target), RelayMode::Forever).unwrap();

        source.emit("other", &[1]);

        assert!(seen.is_empty());
    }

    #[test]
    fn relay_fires_in_registration_position() {
        let source = LocalEmitter::<u32>::new();
        let target = LocalEmitter::<u32>::new();
        let order = Recorder::new();

        source.on("event", Listener::new(order.record_with(|_: &[u32]| "before")));
        bridge("event", Some(&source), Some(&target), RelayMode::Forever).unwrap();
        source.on("event", Listener::new(order.record_with(|_: &[u32]| "after")));
        target.on("event", Listener::new(order.record_with(|_: &[u32]| "relayed")));

        source.emit("event", &[]);

        assert_eq!(order.take(), vec!["before", "relayed", "after"]);
    }

    #[test]
    fn handle_tears_down_relay() {
        let source = LocalEmitter::<u32>::new();
        let target = LocalEmitter::<u32>::new();
        let seen = Recorder::new();

        target.on("event", Listener::new(seen.record_values()));
        let relay = bridge("event", Some(&source), Some(&target), RelayMode::Forever).unwrap();

        assert!(source.off("event", &relay));
        source.emit("event", &[1]);

        assert!(seen.is_empty());
    }

    #[test]
    fn handle_emits_on_target() {
        let source = LocalEmitter::<u32>::new();
        let target = LocalEmitter::<u32>::new();
        let seen = Recorder::new();

        target.on("event", Listener::new(seen.record_values()));
        let relay = bridge("event", Some(&source), Some(&target), RelayMode::Once).unwrap();

        relay.call(&[42]);

        assert_eq!(seen.take(), vec![vec![42]]);
    }

    #[test]
    fn failure_event_is_forwarded_like_any_other() {
        let source = LocalEmitter::<u32>::new();
        let target = LocalEmitter::<u32>::new();
        let seen = Recorder::new();

        target.on("error", Listener::new(seen.record_values()));
        bridge("error", Some(&source), Some(&target), RelayMode::Forever).unwrap();

        source.emit("error", &[500]);

        assert_eq!(seen.take(), vec![vec![500]]);
    }

    #[test]
    fn absent_source_is_rejected() {
        let target = LocalEmitter::<u32>::new();

        let error = bridge(
            "event",
            None::<&LocalEmitter<u32>>,
            Some(&target),
            RelayMode::Forever,
        )
        .unwrap_err();

        assert_eq!(error.role(), Role::Source);
    }

    #[test]
    fn incapable_target_is_rejected_without_registering() {
        let source = LocalEmitter::<u32>::new();
        let target = Muted::<u32>::new(Capabilities::new(true, false));

        let error = bridge("event", Some(&source), Some(&target), RelayMode::Once).unwrap_err();

        assert!(matches!(error, CapabilityError::Incapable { role: Role::Target }));
        assert_eq!(source.listener_count("event"), 0);
        assert_eq!(target.listener_count("event"), 0);
    }

    #[test]
    fn source_is_checked_before_target() {
        let error = bridge(
            "event",
            None::<&LocalEmitter<u32>>,
            None::<&LocalEmitter<u32>>,
            RelayMode::Forever,
        )
        .unwrap_err();

        assert_eq!(error.role(), Role::Source);
    }
}
