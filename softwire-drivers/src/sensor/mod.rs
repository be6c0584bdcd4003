//! Humidity and temperature sensor drivers

pub mod htu21d;

pub use htu21d::{Htu21d, Htu21dError};
