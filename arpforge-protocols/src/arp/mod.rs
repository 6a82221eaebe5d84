//! ARP (Address Resolution Protocol)
//!
//! Wire format handling and the forged-reply traffic generator. The 28-byte
//! packet layout over Ethernet/IPv4 is:
//!
//! ```text
//! htype(2) ptype(2) hlen(1) plen(1) oper(2) SHA(6) SPA(4) THA(6) TPA(4)
//! ```
//!
//! A reply (oper = 2) that no request solicited asserts a false
//! SPA-to-SHA binding; hosts that accept it unsolicited overwrite their
//! cache entry for SPA, which is the attack this module generates.

pub mod attack;
pub mod packet;

pub use attack::{ArpSpoofApp, SpoofConfig, SpoofStats};
pub use packet::{ArpOpcode, ArpPacket};
