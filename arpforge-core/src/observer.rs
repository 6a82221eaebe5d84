//! Observer interface for traffic-generator events

use crate::Error;

/// Narrow event interface exposed by traffic generators
///
/// Hosts that want visibility hook one of these in; generators never write
/// to process-wide diagnostic channels. All methods default to no-ops, so
/// an observer implements only what it cares about.
pub trait TxObserver {
    /// A packet was handed to the outbound device; `seq` counts from 1
    fn on_sent(&self, seq: u64, len: usize) {
        let _ = (seq, len);
    }

    /// A pending transmission was cancelled by deactivation
    fn on_cancelled(&self) {}

    /// The outbound device rejected a send; no further sends are scheduled
    fn on_error(&self, error: &Error) {
        let _ = error;
    }
}
