//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the rules of the monitor's resilience loop: what
//! runs when, what counts as a failure, and when to retry, degrade or
//! reboot.  All interaction with hardware happens through **port traits**
//! defined in [`ports`], keeping this layer fully testable without real
//! peripherals.

pub mod context;
pub mod events;
pub mod payload;
pub mod ports;
pub mod service;
