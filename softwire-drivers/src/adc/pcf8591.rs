//! PCF8591 8-bit ADC / DAC
//!
//! Four analog inputs, one analog output, driven through a single control
//! byte. Conversions are pipelined: a read returns the result of the
//! *previous* conversion, so the first byte after a control change is
//! stale and gets discarded.

use softwire_hal::I2cBus;

/// 7-bit base address; the three low bits come from the A2..A0 pins.
pub const BASE_ADDRESS: u8 = 0x48;

// control byte layout
const CTRL_AUTO_INCREMENT: u8 = 0b0000_0100;
const CTRL_OUTPUT_ENABLE: u8 = 0b0100_0000;

/// Analog input wiring, control byte bits 5..4.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputMode {
    /// Four single-ended inputs (AIN0..AIN3).
    FourSingleEnded = 0b00,
    /// Three differential inputs against AIN3.
    ThreeDifferential = 0b01,
    /// AIN0, AIN1 single-ended; AIN2-AIN3 differential.
    Mixed = 0b10,
    /// Two differential pairs.
    TwoDifferential = 0b11,
}

/// Errors from ADC/DAC operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pcf8591Error<E> {
    /// Underlying bus error (typically a NACK).
    Bus(E),
    /// Channel index above 3.
    InvalidChannel,
}

/// PCF8591 driver, generic over the bus.
pub struct Pcf8591<B> {
    bus: B,
    address: u8,
    mode: InputMode,
    output_enabled: bool,
}

impl<B: I2cBus> Pcf8591<B> {
    /// Create a driver for the device strapped to `address_pins`
    /// (A2..A0, 0..=7).
    pub fn new(bus: B, address_pins: u8) -> Self {
        Self {
            bus,
            address: BASE_ADDRESS | (address_pins & 0b111),
            mode: InputMode::FourSingleEnded,
            output_enabled: false,
        }
    }

    /// Select how the analog inputs are wired.
    pub fn set_input_mode(&mut self, mode: InputMode) {
        self.mode = mode;
    }

    fn control_byte(&self, channel: u8, auto_increment: bool) -> u8 {
        let mut control = channel | ((self.mode as u8) << 4);
        if auto_increment {
            control |= CTRL_AUTO_INCREMENT;
        }
        if self.output_enabled {
            control |= CTRL_OUTPUT_ENABLE;
        }
        control
    }

    /// Read one conversion from the given channel.
    pub fn read_channel(&mut self, channel: u8) -> Result<u8, Pcf8591Error<B::Error>> {
        if channel > 3 {
            return Err(Pcf8591Error::InvalidChannel);
        }
        let control = self.control_byte(channel, false);
        self.bus
            .write(self.address, &[control])
            .map_err(Pcf8591Error::Bus)?;
        // first byte is the previous conversion
        let mut buf = [0u8; 2];
        self.bus
            .read(self.address, &mut buf)
            .map_err(Pcf8591Error::Bus)?;
        Ok(buf[1])
    }

    /// Read all four channels in one auto-incrementing pass.
    pub fn read_all(&mut self) -> Result<[u8; 4], Pcf8591Error<B::Error>> {
        let control = self.control_byte(0, true);
        self.bus
            .write(self.address, &[control])
            .map_err(Pcf8591Error::Bus)?;
        let mut buf = [0u8; 5];
        self.bus
            .read(self.address, &mut buf)
            .map_err(Pcf8591Error::Bus)?;
        Ok([buf[1], buf[2], buf[3], buf[4]])
    }

    /// Drive the analog output. Enables the DAC on first use.
    pub fn write_output(&mut self, value: u8) -> Result<(), Pcf8591Error<B::Error>> {
        self.output_enabled = true;
        let control = self.control_byte(0, false);
        self.bus
            .write(self.address, &[control, value])
            .map_err(Pcf8591Error::Bus)
    }

    /// Release the underlying bus.
    pub fn free(self) -> B {
        self.bus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBus;

    #[test]
    fn test_read_channel_discards_stale_byte() {
        let mut bus = MockBus::new();
        bus.queue_read(&[0x00, 0x7F]); // stale, then fresh
        let mut adc = Pcf8591::new(bus, 0);

        assert_eq!(adc.read_channel(2).unwrap(), 0x7F);
        let bus = adc.free();
        // control byte selects channel 2, single-ended, DAC off
        assert_eq!(bus.writes[0].1.as_slice(), [0b0000_0010]);
    }

    #[test]
    fn test_invalid_channel_rejected() {
        let mut adc = Pcf8591::new(MockBus::new(), 0);
        assert_eq!(adc.read_channel(4), Err(Pcf8591Error::InvalidChannel));
    }

    #[test]
    fn test_read_all_uses_auto_increment() {
        let mut bus = MockBus::new();
        bus.queue_read(&[0x00, 1, 2, 3, 4]);
        let mut adc = Pcf8591::new(bus, 0);

        assert_eq!(adc.read_all().unwrap(), [1, 2, 3, 4]);
        let bus = adc.free();
        assert_eq!(bus.writes[0].1.as_slice(), [0b0000_0100]);
    }

    #[test]
    fn test_write_output_sets_enable_bit() {
        let mut adc = Pcf8591::new(MockBus::new(), 0b001);
        adc.write_output(0x80).unwrap();

        let bus = adc.free();
        let (address, payload) = &bus.writes[0];
        assert_eq!(*address, 0x49);
        assert_eq!(payload.as_slice(), [0b0100_0000, 0x80]);
    }

    #[test]
    fn test_input_mode_bits() {
        let mut adc = Pcf8591::new(MockBus::new(), 0);
        adc.set_input_mode(InputMode::TwoDifferential);
        assert_eq!(adc.control_byte(1, false), 0b0011_0001);
    }
}
