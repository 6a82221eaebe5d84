//! Discrete-event engine
//!
//! Simulated time advances only when an event fires; between events nothing
//! happens and no wall-clock time is consumed. Events are ordered by
//! (timestamp, registration sequence), so same-instant events fire in the
//! order they were registered. Cancellation detaches the callback and
//! leaves a dead entry in the queue, which the pop loop skips.

use arpforge_core::{EventCallback, EventId, Scheduler};
use std::cell::{Cell, RefCell};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::rc::Rc;
use std::time::Duration;
use tracing::trace;

/// Single-threaded discrete-event scheduler
pub struct SimScheduler {
    now: Cell<Duration>,
    next_id: Cell<u64>,
    queue: RefCell<BinaryHeap<Reverse<(Duration, u64)>>>,
    callbacks: RefCell<HashMap<u64, EventCallback>>,
}

impl SimScheduler {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            now: Cell::new(Duration::ZERO),
            next_id: Cell::new(0),
            queue: RefCell::new(BinaryHeap::new()),
            callbacks: RefCell::new(HashMap::new()),
        })
    }

    /// Current simulated time
    pub fn now(&self) -> Duration {
        self.now.get()
    }

    /// Number of live (non-cancelled) events in the queue
    pub fn pending(&self) -> usize {
        self.callbacks.borrow().len()
    }

    /// Register a callback for an absolute simulated timestamp
    ///
    /// Timestamps in the past are clamped to the current instant.
    pub fn schedule_at(&self, at: Duration, callback: EventCallback) -> EventId {
        let at = at.max(self.now.get());
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.queue.borrow_mut().push(Reverse((at, id)));
        self.callbacks.borrow_mut().insert(id, callback);
        trace!(at_us = at.as_micros() as u64, id, "event scheduled");
        EventId(id)
    }

    /// Fire events until the queue is empty; returns the number fired
    pub fn run(&self) -> usize {
        let mut fired = 0;
        while self.step(None) {
            fired += 1;
        }
        fired
    }

    /// Fire events up to and including `deadline`, then advance the clock
    /// to `deadline`; returns the number fired
    pub fn run_until(&self, deadline: Duration) -> usize {
        let mut fired = 0;
        while self.step(Some(deadline)) {
            fired += 1;
        }
        if deadline > self.now.get() {
            self.now.set(deadline);
        }
        fired
    }

    /// Fire the next due event, honoring an optional deadline
    fn step(&self, deadline: Option<Duration>) -> bool {
        match self.pop_due(deadline) {
            Some((at, id, callback)) => {
                self.now.set(at);
                trace!(at_us = at.as_micros() as u64, id, "event fired");
                callback();
                true
            }
            None => false,
        }
    }

    fn pop_due(&self, deadline: Option<Duration>) -> Option<(Duration, u64, EventCallback)> {
        let mut queue = self.queue.borrow_mut();
        let mut callbacks = self.callbacks.borrow_mut();
        while let Some(&Reverse((at, id))) = queue.peek() {
            if deadline.is_some_and(|deadline| at > deadline) {
                return None;
            }
            queue.pop();
            if let Some(callback) = callbacks.remove(&id) {
                return Some((at, id, callback));
            }
            // Cancelled entry, keep draining.
        }
        None
    }
}

impl Scheduler for SimScheduler {
    fn schedule_after(&self, delay: Duration, callback: EventCallback) -> EventId {
        self.schedule_at(self.now.get() + delay, callback)
    }

    fn cancel(&self, event: EventId) {
        if self.callbacks.borrow_mut().remove(&event.0).is_some() {
            trace!(id = event.0, "event cancelled");
        }
    }
}
