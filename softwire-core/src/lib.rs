//! Softwire bus engine
//!
//! A master-side, software-timed I2C implementation driven entirely
//! through two open-drain GPIO lines. No dedicated I2C silicon is
//! involved: the engine reproduces the bus electrically by toggling pin
//! direction, with half-bit-period delays enforcing the protocol's setup
//! and hold times.
//!
//! The engine is built against the capability traits in `softwire-hal`:
//! an [`OpenDrainLine`](softwire_hal::OpenDrainLine) per bus line and an
//! [`embedded_hal::delay::DelayNs`] time source. Logic high is always
//! produced by releasing a line, never by driving it, so the wired-AND
//! semantics of a shared bus hold and a peripheral can stretch the clock
//! or hold data at any point.
//!
//! Every wait on an external party is bounded. A peripheral that holds a
//! line low past its budget produces a *soft failure*: the operation
//! reports [`BusStatus::Stalled`] (and optionally a `defmt` warning) and
//! continues, because most such stalls are transient and hanging the
//! calling thread helps nobody.
//!
//! All operations are synchronous and blocking, and a bus instance must
//! be driven by one caller at a time; the engine does no locking of its
//! own.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod config;
pub mod master;
pub mod transfer;

pub use config::{Config, ConfigError};
pub use master::{BusStatus, SoftI2c};
pub use transfer::TransferError;

// Wire vocabulary, re-exported so most callers need only this crate
pub use softwire_hal::{address_byte, Ack, Direction, I2cBus};
