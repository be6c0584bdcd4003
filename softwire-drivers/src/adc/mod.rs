//! ADC and DAC drivers

pub mod pcf8591;

pub use pcf8591::{InputMode, Pcf8591, Pcf8591Error};
