//! Simulation harness for arpforge
//!
//! The pieces of the host environment the injection core is driven by:
//!
//! - [`engine::SimScheduler`]: a single-threaded discrete-event engine
//!   implementing the core [`Scheduler`](arpforge_core::Scheduler) boundary
//! - [`medium::Segment`]: a shared-medium segment whose ports implement
//!   [`NetDevice`](arpforge_core::NetDevice) and whose transmission log is
//!   the observable wire

pub mod engine;
pub mod medium;

pub use engine::SimScheduler;
pub use medium::{Segment, SegmentPort, Transmission};
