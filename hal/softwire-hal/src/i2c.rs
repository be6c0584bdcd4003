//! I2C bus abstractions
//!
//! Byte-level transaction trait plus the wire vocabulary (transfer
//! direction and acknowledge polarity) shared by the engine, the drivers
//! and the simulation backend.

/// Transfer direction, as encoded in the R/W bit of the address byte.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Master writes to the peripheral (R/W bit = 0).
    Write = 0,
    /// Master reads from the peripheral (R/W bit = 1).
    Read = 1,
}

/// Acknowledge bit, with its on-wire polarity.
///
/// The receiving party pulls SDA low during the ninth clock to
/// acknowledge, so 0 on the wire means "acknowledged". Keeping the wire
/// value in the enum (rather than a bool) prevents polarity mixups.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Ack {
    /// Peripheral pulled SDA low during the ack slot.
    Ack = 0,
    /// SDA stayed high during the ack slot.
    Nack = 1,
}

impl Ack {
    /// True if the transfer was acknowledged.
    pub fn is_ack(self) -> bool {
        self == Ack::Ack
    }

    /// The level to place on SDA to signal this acknowledge value.
    pub fn bit(self) -> bool {
        self == Ack::Nack
    }

    /// Interpret a sampled SDA level from the ack slot.
    pub fn from_bit(bit: bool) -> Self {
        if bit {
            Ack::Nack
        } else {
            Ack::Ack
        }
    }
}

/// Build the address byte for a 7-bit device address.
///
/// The address occupies the upper seven bits; the R/W flag is the LSB.
/// This convention is part of the wire contract every caller shares.
pub fn address_byte(address: u8, direction: Direction) -> u8 {
    (address << 1) | direction as u8
}

/// Byte-level bus transactions.
///
/// The seam between the engine and the device drivers: the Softwire
/// transfer layer implements it over the bit-banged wire, and drivers
/// written against it run over that engine or a scripted mock bus
/// interchangeably.
pub trait I2cBus {
    /// Transaction error. Implementations surface an unacknowledged
    /// address byte or data byte through this type.
    type Error;

    /// Write `data` to the device at the 7-bit `address`, framed by one
    /// START and one STOP. Every byte must be acknowledged.
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error>;

    /// Fill `buf` from the device at the 7-bit `address`. The master
    /// acknowledges each byte except the last, which it NACKs so the
    /// device stops driving data.
    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Write `write_data`, then fill `read_buf`, in one transaction with
    /// a repeated start between the phases. The shape register and
    /// memory-offset addressing use.
    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_byte() {
        // EEPROM at 0x50: 0xA0 write, 0xA1 read
        assert_eq!(address_byte(0x50, Direction::Write), 0xA0);
        assert_eq!(address_byte(0x50, Direction::Read), 0xA1);
    }

    #[test]
    fn test_ack_polarity() {
        // 0 on the wire = acknowledged
        assert_eq!(Ack::from_bit(false), Ack::Ack);
        assert_eq!(Ack::from_bit(true), Ack::Nack);
        assert!(Ack::Ack.is_ack());
        assert!(!Ack::Nack.is_ack());
        // bit() is the inverse mapping
        assert!(!Ack::Ack.bit());
        assert!(Ack::Nack.bit());
    }
}
