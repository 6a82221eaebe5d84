//! Discrete-event scheduler boundary
//!
//! Everything in arpforge runs under an external discrete-event engine.
//! Components only ever ask for "call me back after this much simulated
//! time" and "forget that callback"; they never read absolute time.

use std::time::Duration;

/// Handle to a scheduled event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventId(pub u64);

/// Callback invoked when a scheduled event fires
///
/// The model is single-threaded cooperative scheduling, so callbacks carry
/// no `Send` bound and run to completion before the next event fires.
pub type EventCallback = Box<dyn FnOnce()>;

/// Scheduler implemented by the hosting simulation engine
pub trait Scheduler {
    /// Register a callback to run after `delay` of simulated time
    ///
    /// Callbacks must fire in non-decreasing time order; callbacks
    /// registered for the same instant fire in registration order.
    fn schedule_after(&self, delay: Duration, callback: EventCallback) -> EventId;

    /// Cancel a previously scheduled event
    ///
    /// A cancelled event must never fire, even if it was already due.
    /// Cancelling an event that already fired is a no-op.
    fn cancel(&self, event: EventId);
}
