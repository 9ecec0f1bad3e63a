//! Clock and one-shot alarm collaborator, mirroring `kernel::hil::time` in
//! Tock (`hil::time::Alarm`, `hil::time::Frequency`,
//! `hil::time::Client` as used by `TrickleData`).

use core::time::Duration;

/// A monotonic clock. `now()` must never go backwards.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// A single-shot alarm built on top of a [`Clock`]. Only one alarm may be
/// armed at a time per instance, matching Tock's `VirtualMuxAlarm`
/// pattern of one alarm per client.
pub trait Alarm: Clock {
    /// Arm the alarm to fire at absolute time `at` (as measured by `now()`).
    /// Arming an already-armed alarm replaces the previous deadline.
    fn set_alarm(&self, at: Duration);

    /// Disarm the alarm. A no-op if it was not armed.
    fn disarm(&self);

    /// Whether the alarm is currently armed.
    fn is_armed(&self) -> bool;
}

/// Callback invoked by the collaborator when an armed [`Alarm`] fires.
pub trait AlarmClient {
    fn fired(&self);
}
