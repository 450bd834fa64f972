/// The event name that emitters treat as a failure signal unless configured otherwise.
///
/// Awaiting this event produces a future that rejects with the delivered value instead of
/// resolving with it.
pub const DEFAULT_FAILURE_EVENT: &str = "error";

/// How many listeners one event may have before a warning is logged.
///
/// Exceeding the limit does not prevent registration. A limit of zero disables the warning.
pub const DEFAULT_MAX_LISTENERS: usize = 10;
