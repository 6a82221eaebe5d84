//! Arpforge Core Library
//!
//! This crate provides the fundamental traits, types, and error handling
//! for arpforge, a discrete-event address-cache poisoning simulator.
//! It defines the three boundaries the injection core talks to: the
//! [`Scheduler`] that owns simulated time, the [`NetDevice`] that owns the
//! wire, and the [`TxObserver`] that hosts hook in for visibility.

pub mod device;
pub mod error;
pub mod observer;
pub mod scheduler;
pub mod types;

// Re-export commonly used types
pub use device::NetDevice;
pub use error::{Error, Result};
pub use observer::TxObserver;
pub use scheduler::{EventCallback, EventId, Scheduler};
pub use types::{ethertypes, MacAddr};
