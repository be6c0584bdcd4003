//! Serial EEPROM drivers

pub mod m24lc128;

pub use m24lc128::{Eeprom24lc128, EepromError};
