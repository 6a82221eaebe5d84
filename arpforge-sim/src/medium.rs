//! Shared-medium segment
//!
//! An Ethernet-like broadcast segment. Ports attached to a [`Segment`]
//! implement the [`NetDevice`] send boundary; every frame handed to a port
//! lands in the segment's transmission log with its simulated timestamp.
//! The log is the capture point on the wire: tests and drivers read it to
//! observe what actually went out.

use crate::engine::SimScheduler;
use arpforge_core::{Error, MacAddr, NetDevice, Result};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

/// One frame handed to the medium
#[derive(Debug, Clone)]
pub struct Transmission {
    /// Simulated timestamp of the send
    pub at: Duration,
    /// Link-layer address of the sending port
    pub source: MacAddr,
    /// Destination link-layer address
    pub destination: MacAddr,
    /// Protocol identifier the frame was tagged with
    pub ethertype: u16,
    /// L2 payload
    pub payload: Vec<u8>,
}

/// Broadcast segment shared by every attached port
pub struct Segment {
    clock: Rc<SimScheduler>,
    log: RefCell<Vec<Transmission>>,
}

impl Segment {
    pub fn new(clock: Rc<SimScheduler>) -> Rc<Self> {
        Rc::new(Self {
            clock,
            log: RefCell::new(Vec::new()),
        })
    }

    /// Attach a new port with the given link-layer address
    pub fn attach(self: &Rc<Self>, mac: MacAddr) -> Rc<SegmentPort> {
        Rc::new(SegmentPort {
            mac,
            segment: Rc::clone(self),
            up: Cell::new(true),
        })
    }

    /// Snapshot of everything transmitted so far
    pub fn transmissions(&self) -> Vec<Transmission> {
        self.log.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.log.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.borrow().is_empty()
    }
}

/// A port on a [`Segment`]
pub struct SegmentPort {
    mac: MacAddr,
    segment: Rc<Segment>,
    up: Cell<bool>,
}

impl SegmentPort {
    /// Administratively raise or lower the port
    ///
    /// A downed port refuses every send, which is the segment's way of
    /// producing a transmission failure.
    pub fn set_up(&self, up: bool) {
        self.up.set(up);
    }

    pub fn is_up(&self) -> bool {
        self.up.get()
    }
}

impl NetDevice for SegmentPort {
    fn mac_address(&self) -> MacAddr {
        self.mac
    }

    fn send(&self, payload: &[u8], destination: MacAddr, ethertype: u16) -> Result<()> {
        if !self.up.get() {
            return Err(Error::transmission(format!("port {} is down", self.mac)));
        }
        self.segment.log.borrow_mut().push(Transmission {
            at: self.segment.clock.now(),
            source: self.mac,
            destination,
            ethertype,
            payload: payload.to_vec(),
        });
        Ok(())
    }
}
