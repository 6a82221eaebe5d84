//! Protocol implementations for arpforge
//!
//! One protocol module so far: [`arp`], the protocol under study. It holds
//! the wire format handling in [`arp::packet`] and the cache-poisoning
//! traffic generator in [`arp::attack`].

pub mod arp;

pub use arp::{ArpOpcode, ArpPacket, ArpSpoofApp, SpoofConfig, SpoofStats};
