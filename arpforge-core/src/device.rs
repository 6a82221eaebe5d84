//! Link-layer device boundary

use crate::{MacAddr, Result};

/// Outbound link-layer endpoint used for transmission
///
/// Arpforge never opens sockets or touches hardware; finished payloads are
/// handed to an implementation of this trait and the host environment
/// decides what a "wire" is. Framing (addressing, ethertype tagging) is the
/// device's job, matching how a simulated NIC consumes an L2 payload.
pub trait NetDevice {
    /// Link-layer address of this endpoint
    fn mac_address(&self) -> MacAddr;

    /// Send `payload` to `destination`, tagged with `ethertype`
    ///
    /// A refused send is fatal for the caller's current cycle; devices do
    /// not buffer or retry.
    fn send(&self, payload: &[u8], destination: MacAddr, ethertype: u16) -> Result<()>;
}
