//! Peripheral driver implementations
//!
//! This crate provides drivers for devices commonly hung off a Softwire
//! bus, written against the [`softwire_hal::I2cBus`] trait so they run
//! over the bit-banged engine, any other bus implementation, or a mock
//! in tests:
//!
//! - Serial EEPROMs (24LC128 family)
//! - Humidity/temperature sensors (HTU21D)
//! - ADC/DAC combos (PCF8591)

#![no_std]
#![deny(unsafe_code)]

pub mod adc;
pub mod eeprom;
pub mod sensor;

#[cfg(test)]
mod mock;
