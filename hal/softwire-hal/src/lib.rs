//! Softwire Hardware Abstraction Layer
//!
//! This crate defines the capability traits the Softwire bus engine is
//! written against. Implementations are provided by platform crates (a
//! memory-mapped GPIO backend, a Linux character-device backend, ...) or,
//! for host testing, by the simulated line pair in `softwire-sim`. This
//! keeps the protocol engine free of any hardware dependency.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Drivers (softwire-drivers, external)   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  softwire-core (protocol engine)        │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  softwire-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ platform GPIO │       │ softwire-sim  │
//! │   backends    │       │ (host tests)  │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OpenDrainLine`] - a single open-drain bus line
//! - [`i2c::I2cBus`] - byte-level bus transactions

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod i2c;

// Re-export key items at crate root for convenience
pub use gpio::OpenDrainLine;
pub use i2c::{address_byte, Ack, Direction, I2cBus};
