use crate::{CapabilityError, Emitter, Role};

/// Checks that `value` is present and able to act as an event emitter in `role`.
///
/// Every bridging and cross-object await operation calls this before registering anything, so
/// that a bad argument fails at the call site instead of deep inside a listener.
///
/// # Errors
///
/// Returns [`CapabilityError::Absent`] if `value` is `None` and [`CapabilityError::Incapable`] if
/// the emitter does not report the full capability set.
///
/// # Example
///
/// ```rust
/// use better_events::{LocalEmitter, Role, verify_emitter};
///
/// let emitter = LocalEmitter::<u8>::new();
/// assert!(verify_emitter(Some(&emitter), Role::Source).is_ok());
///
/// let error = verify_emitter(None::<&LocalEmitter<u8>>, Role::Target).unwrap_err();
/// assert_eq!(error.role(), Role::Target);
/// ```
pub fn verify_emitter<T, E>(value: Option<&E>, role: Role) -> Result<&E, CapabilityError>
where
    E: Emitter<T>,
{
    let Some(emitter) = value else {
        return Err(CapabilityError::Absent { role });
    };

    if !emitter.capabilities().is_full() {
        return Err(CapabilityError::Incapable { role });
    }

    Ok(emitter)
}
