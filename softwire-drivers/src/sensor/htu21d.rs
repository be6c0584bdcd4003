//! HTU21D relative humidity / temperature sensor
//!
//! Hold-master measurements: the command is written, the device stretches
//! the clock while converting, and the result streams back as two data
//! bytes plus a CRC in the same transaction. Conversions use integer
//! fixed-point math in hundredths of a unit.

use softwire_hal::I2cBus;

/// Fixed 7-bit device address.
pub const ADDRESS: u8 = 0x40;

const CMD_MEASURE_TEMP_HOLD: u8 = 0xE3;
const CMD_MEASURE_RH_HOLD: u8 = 0xE5;
const CMD_SOFT_RESET: u8 = 0xFE;

/// Errors from sensor operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Htu21dError<E> {
    /// Underlying bus error (typically a NACK).
    Bus(E),
    /// The CRC byte did not match the measurement data.
    CrcMismatch,
}

/// HTU21D driver, generic over the bus.
pub struct Htu21d<B> {
    bus: B,
}

impl<B: I2cBus> Htu21d<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Soft-reset the sensor (takes the device ~15 ms).
    pub fn soft_reset(&mut self) -> Result<(), Htu21dError<B::Error>> {
        self.bus
            .write(ADDRESS, &[CMD_SOFT_RESET])
            .map_err(Htu21dError::Bus)
    }

    /// Temperature in hundredths of a degree Celsius
    /// (2131 = 21.31 °C).
    pub fn temperature_celsius_x100(&mut self) -> Result<i32, Htu21dError<B::Error>> {
        let raw = self.measure(CMD_MEASURE_TEMP_HOLD)? as i32;
        // T = -46.85 + 175.72 * raw / 2^16
        Ok(-4685 + (17572 * raw) / 65536)
    }

    /// Relative humidity in hundredths of a percent (3233 = 32.33 %RH).
    pub fn humidity_percent_x100(&mut self) -> Result<i32, Htu21dError<B::Error>> {
        let raw = self.measure(CMD_MEASURE_RH_HOLD)? as i32;
        // RH = -6 + 125 * raw / 2^16
        Ok(-600 + (12500 * raw) / 65536)
    }

    fn measure(&mut self, command: u8) -> Result<u16, Htu21dError<B::Error>> {
        let mut frame = [0u8; 3];
        self.bus
            .write_read(ADDRESS, &[command], &mut frame)
            .map_err(Htu21dError::Bus)?;
        if crc8(&frame[..2]) != frame[2] {
            return Err(Htu21dError::CrcMismatch);
        }
        // the low two bits of every result are status flags, not data
        Ok(u16::from_be_bytes([frame[0], frame[1]]) & !0b11)
    }

    /// Release the underlying bus.
    pub fn free(self) -> B {
        self.bus
    }
}

/// CRC-8 over the measurement bytes, polynomial x^8 + x^5 + x^4 + 1
/// (0x31), zero initial value.
fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ 0x31
            } else {
                crc << 1
            };
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBus;

    #[test]
    fn test_crc8_datasheet_vectors() {
        // reference values from the SHT21/HTU21D datasheet examples
        assert_eq!(crc8(&[0xDC]), 0x79);
        assert_eq!(crc8(&[0x68, 0x3A]), 0x7C);
        assert_eq!(crc8(&[0x4E, 0x85]), 0x6B);
    }

    #[test]
    fn test_temperature_conversion() {
        let mut bus = MockBus::new();
        bus.queue_read(&[0x63, 0x52, 0x64]);
        let mut sensor = Htu21d::new(bus);

        // raw 0x6350 (status bits cleared) -> 21.31 degC
        assert_eq!(sensor.temperature_celsius_x100().unwrap(), 2131);
        let bus = sensor.free();
        assert_eq!(bus.writes[0].1.as_slice(), [0xE3]);
    }

    #[test]
    fn test_humidity_conversion() {
        let mut bus = MockBus::new();
        bus.queue_read(&[0x4E, 0x85, 0x6B]);
        let mut sensor = Htu21d::new(bus);

        // raw 0x4E84 -> 32.33 %RH
        assert_eq!(sensor.humidity_percent_x100().unwrap(), 3233);
        let bus = sensor.free();
        assert_eq!(bus.writes[0].1.as_slice(), [0xE5]);
    }

    #[test]
    fn test_corrupt_frame_detected() {
        let mut bus = MockBus::new();
        bus.queue_read(&[0x63, 0x52, 0x00]);
        let mut sensor = Htu21d::new(bus);

        assert_eq!(
            sensor.temperature_celsius_x100(),
            Err(Htu21dError::CrcMismatch)
        );
    }

    #[test]
    fn test_soft_reset_command() {
        let mut sensor = Htu21d::new(MockBus::new());
        sensor.soft_reset().unwrap();
        let bus = sensor.free();
        assert_eq!(bus.writes[0].1.as_slice(), [0xFE]);
    }
}
