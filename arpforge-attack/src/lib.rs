//! Run orchestration for arpforge
//!
//! This crate provides the host-side driver seat for traffic generators:
//!
//! - [`AppManager`]: registers generator instances and drives their
//!   activation/deactivation hooks through the discrete-event scheduler at
//!   chosen simulated timestamps
//! - [`AppInfo`]: per-instance listing with lifecycle state and statistics

pub mod manager;

pub use manager::{AppId, AppInfo, AppManager};
