//! Byte-level transactions over the engine
//!
//! Packages the transaction shapes every caller otherwise hand-rolls
//! (address, payload, stop; write register then repeated-start read) as
//! the [`I2cBus`] trait, plus an [`embedded_hal::i2c::I2c`] impl so
//! ecosystem drivers can sit directly on a Softwire bus, and a bus
//! scanner.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorType, NoAcknowledgeSource, Operation};
use heapless::Vec;
use softwire_hal::{address_byte, Ack, Direction, I2cBus, OpenDrainLine};

use crate::master::SoftI2c;

/// Transaction-level errors.
///
/// A NACK is the peripheral declining a transfer; the engine takes no
/// corrective action beyond issuing the closing STOP. Retry and backoff
/// policy belongs to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferError {
    /// No acknowledge for the address byte; nobody answered.
    AddressNack,
    /// A data byte was not acknowledged mid-transfer.
    DataNack,
}

impl embedded_hal::i2c::Error for TransferError {
    fn kind(&self) -> embedded_hal::i2c::ErrorKind {
        match self {
            TransferError::AddressNack => {
                embedded_hal::i2c::ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
            }
            TransferError::DataNack => {
                embedded_hal::i2c::ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data)
            }
        }
    }
}

impl<SCL, SDA, D> SoftI2c<SCL, SDA, D>
where
    SCL: OpenDrainLine,
    SDA: OpenDrainLine,
    D: DelayNs,
{
    /// Address the device for the given direction.
    fn send_header(&mut self, address: u8, direction: Direction) -> Result<(), TransferError> {
        if self.send_byte(address_byte(address, direction)).is_ack() {
            Ok(())
        } else {
            Err(TransferError::AddressNack)
        }
    }

    /// Send a run of data bytes, each of which must be acknowledged.
    fn send_all(&mut self, data: &[u8]) -> Result<(), TransferError> {
        for &byte in data {
            if !self.send_byte(byte).is_ack() {
                return Err(TransferError::DataNack);
            }
        }
        Ok(())
    }

    /// Read a run of data bytes, acknowledging each one. When `nack_last`
    /// is set the final byte is NACKed instead, which tells the
    /// peripheral to stop driving data.
    fn read_all(&mut self, buf: &mut [u8], nack_last: bool) {
        let n = buf.len();
        for (i, slot) in buf.iter_mut().enumerate() {
            *slot = self.read_byte();
            let ack = if nack_last && i + 1 == n {
                Ack::Nack
            } else {
                Ack::Ack
            };
            self.send_ack(ack);
        }
    }

    /// Probe every 7-bit address and collect the ones that answer.
    ///
    /// Probes with a read-direction header, the way bus scanners
    /// traditionally do; write-only devices will not show up.
    pub fn scan(&mut self) -> Vec<u8, 128> {
        let mut found = Vec::new();
        for address in 0..128u8 {
            self.start();
            let present = self.send_header(address, Direction::Read).is_ok();
            self.stop();
            if present {
                // capacity covers the full address space
                let _ = found.push(address);
            }
        }
        found
    }
}

impl<SCL, SDA, D> I2cBus for SoftI2c<SCL, SDA, D>
where
    SCL: OpenDrainLine,
    SDA: OpenDrainLine,
    D: DelayNs,
{
    type Error = TransferError;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), TransferError> {
        self.start();
        let result = self
            .send_header(address, Direction::Write)
            .and_then(|()| self.send_all(data));
        self.stop();
        result
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), TransferError> {
        self.start();
        let result = self.send_header(address, Direction::Read);
        if result.is_ok() {
            self.read_all(buf, true);
        }
        self.stop();
        result
    }

    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), TransferError> {
        self.start();
        let mut result = self
            .send_header(address, Direction::Write)
            .and_then(|()| self.send_all(write_data));
        if result.is_ok() {
            // repeated start flips direction without releasing the bus
            self.start();
            result = self.send_header(address, Direction::Read);
            if result.is_ok() {
                self.read_all(read_buf, true);
            }
        }
        self.stop();
        result
    }
}

impl<SCL, SDA, D> ErrorType for SoftI2c<SCL, SDA, D>
where
    SCL: OpenDrainLine,
    SDA: OpenDrainLine,
    D: DelayNs,
{
    type Error = TransferError;
}

impl<SCL, SDA, D> embedded_hal::i2c::I2c for SoftI2c<SCL, SDA, D>
where
    SCL: OpenDrainLine,
    SDA: OpenDrainLine,
    D: DelayNs,
{
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), TransferError> {
        if operations.is_empty() {
            return Ok(());
        }

        let mut result = Ok(());
        let mut current: Option<Direction> = None;
        for i in 0..operations.len() {
            // consecutive reads are one logical read: only the very last
            // byte before a restart or stop gets the NACK
            let next_reads = matches!(operations.get(i + 1), Some(Operation::Read(_)));
            let op = &mut operations[i];
            let dir = match op {
                Operation::Read(_) => Direction::Read,
                Operation::Write(_) => Direction::Write,
            };
            if current != Some(dir) {
                // first start, or repeated start on direction change
                self.start();
                if let Err(e) = self.send_header(address, dir) {
                    result = Err(e);
                    break;
                }
                current = Some(dir);
            }
            match op {
                Operation::Write(data) => {
                    if let Err(e) = self.send_all(data) {
                        result = Err(e);
                        break;
                    }
                }
                Operation::Read(buf) => {
                    self.read_all(buf, !next_reads);
                }
            }
        }
        self.stop();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use proptest::prelude::*;
    use softwire_sim::{frames, SimBus, SimDelay, SimLine, SimTarget, Wire};

    fn open(bus: &SimBus) -> SoftI2c<SimLine, SimLine, SimDelay> {
        let i2c = SoftI2c::new(bus.scl(), bus.sda(), bus.delay(), Config::STANDARD)
            .expect("valid config");
        bus.take_events();
        i2c
    }

    #[test]
    fn test_write_reaches_target() {
        let bus = SimBus::new();
        let target = SimTarget::new(0x48);
        bus.attach(target.clone());
        let mut i2c = open(&bus);

        i2c.write(0x48, &[0x01]).unwrap();
        assert_eq!(target.written(), [0x01]);
        // bus is idle again
        assert!(bus.level(Wire::Scl));
        assert!(bus.level(Wire::Sda));
    }

    #[test]
    fn test_read_streams_from_target() {
        let bus = SimBus::new();
        let target = SimTarget::new(0x48);
        target.set_read_data(&[0x11, 0x22, 0x33]);
        bus.attach(target.clone());
        let mut i2c = open(&bus);

        let mut buf = [0u8; 3];
        i2c.read(0x48, &mut buf).unwrap();
        assert_eq!(buf, [0x11, 0x22, 0x33]);
    }

    #[test]
    fn test_write_read_uses_repeated_start() {
        let bus = SimBus::new();
        let target = SimTarget::new(0x40);
        target.set_read_data(&[0x63, 0x52]);
        bus.attach(target.clone());
        let mut i2c = open(&bus);

        let mut buf = [0u8; 2];
        i2c.write_read(0x40, &[0xE3], &mut buf).unwrap();
        assert_eq!(target.written(), [0xE3]);
        assert_eq!(buf, [0x63, 0x52]);

        // one transaction on the wire: start, restart, stop
        let events = bus.take_events();
        use softwire_sim::BusEvent;
        let starts = events.iter().filter(|e| **e == BusEvent::Start).count();
        let stops = events.iter().filter(|e| **e == BusEvent::Stop).count();
        assert_eq!(starts, 2);
        assert_eq!(stops, 1);
    }

    #[test]
    fn test_absent_device_nacks_address() {
        let bus = SimBus::new();
        let mut i2c = open(&bus);

        assert_eq!(i2c.write(0x2A, &[0x00]), Err(TransferError::AddressNack));
        // the failed transaction still closed with a stop
        assert!(bus.level(Wire::Scl));
        assert!(bus.level(Wire::Sda));
    }

    #[test]
    fn test_scan_finds_attached_targets() {
        let bus = SimBus::new();
        bus.attach(SimTarget::new(0x50));
        bus.attach(SimTarget::new(0x68));
        let mut i2c = open(&bus);

        let found = i2c.scan();
        assert_eq!(found.as_slice(), [0x50, 0x68]);
    }

    #[test]
    fn test_embedded_hal_write_read() {
        use embedded_hal::i2c::I2c;

        let bus = SimBus::new();
        let target = SimTarget::new(0x50);
        target.set_read_data(&[0xAB]);
        bus.attach(target.clone());
        let mut i2c = open(&bus);

        let mut buf = [0u8; 1];
        I2c::write_read(&mut i2c, 0x50, &[0x00, 0x10], &mut buf).unwrap();
        assert_eq!(buf, [0xAB]);
        assert_eq!(target.written(), [0x00, 0x10]);
    }

    proptest! {
        #[test]
        fn prop_payload_survives_the_wire(payload in proptest::collection::vec(any::<u8>(), 1..16)) {
            let bus = SimBus::new();
            let target = SimTarget::new(0x50);
            bus.attach(target.clone());
            let mut i2c = open(&bus);

            i2c.write(0x50, &payload).unwrap();
            prop_assert_eq!(target.written(), payload.clone());

            // and the trace agrees byte for byte (address frame first)
            let frames = frames(&bus.take_events());
            prop_assert_eq!(frames.len(), payload.len() + 1);
            prop_assert_eq!(frames[0].byte, 0xA0);
            for (frame, byte) in frames[1..].iter().zip(&payload) {
                prop_assert_eq!(frame.byte, *byte);
                prop_assert!(!frame.ack_bit);
            }
        }
    }
}
