//! ARP packet structure and wire encoding

use arpforge_core::{Error, MacAddr, Result};
use bytes::{BufMut, BytesMut};
use std::net::Ipv4Addr;

/// Hardware type for Ethernet
pub const HTYPE_ETHERNET: u16 = 1;

/// Protocol type for IPv4
pub const PTYPE_IPV4: u16 = 0x0800;

/// Serialized length of an ARP packet over Ethernet/IPv4
pub const ARP_WIRE_LEN: usize = 28;

/// ARP operation codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpOpcode {
    Request = 1,
    Reply = 2,
}

impl ArpOpcode {
    pub fn from_u16(val: u16) -> Option<Self> {
        match val {
            1 => Some(Self::Request),
            2 => Some(Self::Reply),
            _ => None,
        }
    }
}

/// An ARP packet
///
/// The layout is externally defined by the protocol wire format and must be
/// reproduced bit-exact so downstream inspection tooling can decode it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArpPacket {
    /// Hardware type (1 for Ethernet)
    pub htype: u16,
    /// Protocol type (0x0800 for IPv4)
    pub ptype: u16,
    /// Hardware address length (6 for MAC)
    pub hlen: u8,
    /// Protocol address length (4 for IPv4)
    pub plen: u8,
    /// Operation
    pub opcode: ArpOpcode,
    /// Sender hardware address
    pub sender_mac: MacAddr,
    /// Sender protocol address
    pub sender_ip: Ipv4Addr,
    /// Target hardware address
    pub target_mac: MacAddr,
    /// Target protocol address
    pub target_ip: Ipv4Addr,
}

impl ArpPacket {
    /// Build a reply asserting that `sender_ip` is reachable at `sender_mac`
    ///
    /// Sent unsolicited to a victim, this is the forged reply that
    /// overwrites the victim's cache entry for `sender_ip`.
    pub fn reply(
        sender_mac: MacAddr,
        sender_ip: Ipv4Addr,
        target_mac: MacAddr,
        target_ip: Ipv4Addr,
    ) -> Self {
        Self {
            htype: HTYPE_ETHERNET,
            ptype: PTYPE_IPV4,
            hlen: MacAddr::LEN as u8,
            plen: 4,
            opcode: ArpOpcode::Reply,
            sender_mac,
            sender_ip,
            target_mac,
            target_ip,
        }
    }

    /// Serialize to the fixed 28-byte wire layout
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(ARP_WIRE_LEN);

        buf.put_u16(self.htype);
        buf.put_u16(self.ptype);
        buf.put_u8(self.hlen);
        buf.put_u8(self.plen);
        buf.put_u16(self.opcode as u16);
        buf.put_slice(self.sender_mac.as_bytes());
        buf.put_slice(&self.sender_ip.octets());
        buf.put_slice(self.target_mac.as_bytes());
        buf.put_slice(&self.target_ip.octets());

        buf.to_vec()
    }

    /// Parse an ARP packet from bytes
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < ARP_WIRE_LEN {
            return Err(Error::parsing("ARP packet too short"));
        }

        let htype = u16::from_be_bytes([data[0], data[1]]);
        let ptype = u16::from_be_bytes([data[2], data[3]]);
        let hlen = data[4];
        let plen = data[5];
        let oper = u16::from_be_bytes([data[6], data[7]]);
        let opcode = ArpOpcode::from_u16(oper).ok_or_else(|| Error::parsing("Invalid ARP opcode"))?;

        let mut sender_mac = [0u8; 6];
        sender_mac.copy_from_slice(&data[8..14]);
        let sender_ip = Ipv4Addr::new(data[14], data[15], data[16], data[17]);

        let mut target_mac = [0u8; 6];
        target_mac.copy_from_slice(&data[18..24]);
        let target_ip = Ipv4Addr::new(data[24], data[25], data[26], data[27]);

        Ok(Self {
            htype,
            ptype,
            hlen,
            plen,
            opcode,
            sender_mac: MacAddr(sender_mac),
            sender_ip,
            target_mac: MacAddr(target_mac),
            target_ip,
        })
    }

    /// Check if this is a reply
    pub fn is_reply(&self) -> bool {
        self.opcode == ArpOpcode::Reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_reply() -> ArpPacket {
        ArpPacket::reply(
            MacAddr([0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0x01]),
            Ipv4Addr::new(10, 0, 0, 2),
            MacAddr([0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0x00]),
            Ipv4Addr::new(10, 0, 0, 1),
        )
    }

    #[test]
    fn reply_wire_layout_is_exact() {
        let bytes = sample_reply().serialize();

        #[rustfmt::skip]
        let expected: [u8; ARP_WIRE_LEN] = [
            0x00, 0x01,             // htype: Ethernet
            0x08, 0x00,             // ptype: IPv4
            0x06,                   // hlen
            0x04,                   // plen
            0x00, 0x02,             // oper: reply
            0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0x01, // SHA
            10, 0, 0, 2,            // SPA
            0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0x00, // THA
            10, 0, 0, 1,            // TPA
        ];
        assert_eq!(bytes, expected);
    }

    #[test]
    fn parse_recovers_all_address_fields() {
        let packet = sample_reply();
        let parsed = ArpPacket::parse(&packet.serialize()).unwrap();

        assert_eq!(parsed, packet);
        assert!(parsed.is_reply());
        assert_eq!(parsed.sender_mac, packet.sender_mac);
        assert_eq!(parsed.sender_ip, packet.sender_ip);
        assert_eq!(parsed.target_mac, packet.target_mac);
        assert_eq!(parsed.target_ip, packet.target_ip);
    }

    #[test]
    fn parse_rejects_short_buffer() {
        let bytes = sample_reply().serialize();
        assert!(ArpPacket::parse(&bytes[..ARP_WIRE_LEN - 1]).is_err());
    }

    #[test]
    fn parse_rejects_unknown_opcode() {
        let mut bytes = sample_reply().serialize();
        bytes[7] = 9;
        assert!(ArpPacket::parse(&bytes).is_err());
    }
}
