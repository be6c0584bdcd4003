//! 24LC128 serial EEPROM
//!
//! 16 KiB EEPROM with 16-bit big-endian memory addressing and 64-byte
//! write pages. After a write the device runs an internal write cycle
//! (~5 ms) during which it NACKs its own address; the driver acknowledge-
//! polls until the device answers again.

use heapless::Vec;
use softwire_hal::I2cBus;

/// Bytes per write page. A single write transaction must not cross a
/// page boundary or the address counter wraps within the page.
pub const PAGE_SIZE: usize = 64;

/// Total capacity in bytes.
pub const MEMORY_SIZE: usize = 16 * 1024;

/// Errors from EEPROM operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EepromError<E> {
    /// Underlying bus error (typically a NACK).
    Bus(E),
    /// The requested range falls outside the device.
    OutOfBounds,
    /// The device kept NACKing past the acknowledge-poll budget.
    WriteTimeout,
}

/// 24LC128 driver, generic over the bus.
pub struct Eeprom24lc128<B> {
    bus: B,
    address: u8,
    poll_limit: u32,
}

impl<B: I2cBus> Eeprom24lc128<B> {
    /// 7-bit base address; the three low bits come from the A2..A0 pins.
    pub const BASE_ADDRESS: u8 = 0x50;

    /// Create a driver for the device strapped to `address_pins`
    /// (A2..A0, 0..=7).
    pub fn new(bus: B, address_pins: u8) -> Self {
        Self {
            bus,
            address: Self::BASE_ADDRESS | (address_pins & 0b111),
            // each poll is a full bus transaction, so this comfortably
            // outlasts the ~5 ms write cycle
            poll_limit: 100,
        }
    }

    /// Check whether the device answers its address.
    pub fn probe(&mut self) -> bool {
        self.bus.write(self.address, &[]).is_ok()
    }

    /// Read `buf.len()` bytes starting at `offset` (sequential read).
    pub fn read(&mut self, offset: u16, buf: &mut [u8]) -> Result<(), EepromError<B::Error>> {
        if offset as usize + buf.len() > MEMORY_SIZE {
            return Err(EepromError::OutOfBounds);
        }
        self.bus
            .write_read(self.address, &offset.to_be_bytes(), buf)
            .map_err(EepromError::Bus)
    }

    /// Read a single byte.
    pub fn read_byte(&mut self, offset: u16) -> Result<u8, EepromError<B::Error>> {
        let mut buf = [0u8];
        self.read(offset, &mut buf)?;
        Ok(buf[0])
    }

    /// Write `data` starting at `offset`, split into page-aligned chunks,
    /// acknowledge-polling after each page.
    pub fn write(&mut self, offset: u16, data: &[u8]) -> Result<(), EepromError<B::Error>> {
        if offset as usize + data.len() > MEMORY_SIZE {
            return Err(EepromError::OutOfBounds);
        }
        let mut offset = offset as usize;
        let mut remaining = data;
        while !remaining.is_empty() {
            let page_room = PAGE_SIZE - (offset % PAGE_SIZE);
            let n = remaining.len().min(page_room);

            let mut frame: Vec<u8, { PAGE_SIZE + 2 }> = Vec::new();
            // capacity = 2 address bytes + one full page, cannot overflow
            let _ = frame.extend_from_slice(&(offset as u16).to_be_bytes());
            let _ = frame.extend_from_slice(&remaining[..n]);
            self.bus
                .write(self.address, &frame)
                .map_err(EepromError::Bus)?;
            self.wait_ready()?;

            offset += n;
            remaining = &remaining[n..];
        }
        Ok(())
    }

    /// Write a single byte.
    pub fn write_byte(&mut self, offset: u16, byte: u8) -> Result<(), EepromError<B::Error>> {
        self.write(offset, &[byte])
    }

    /// Acknowledge-poll until the internal write cycle finishes.
    fn wait_ready(&mut self) -> Result<(), EepromError<B::Error>> {
        for _ in 0..self.poll_limit {
            if self.probe() {
                return Ok(());
            }
        }
        Err(EepromError::WriteTimeout)
    }

    /// Release the underlying bus.
    pub fn free(self) -> B {
        self.bus
    }
}
