//! CO2 monitor firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod connectivity;
pub mod diagnostics;
pub mod error;
pub mod health;
pub mod pins;
pub mod resource;
pub mod scheduler;
pub mod telemetry;

// The ESP-IDF-only parts of these are guarded by cfg attributes inside;
// host builds get simulation stand-ins.
pub mod adapters;
pub mod drivers;
