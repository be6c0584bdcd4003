//! Mock bus shared by the driver tests
//!
//! Records every write phase and serves scripted read data, so drivers
//! can be exercised without a wire.

use heapless::Vec;
use softwire_hal::I2cBus;

/// The mock's stand-in for a NACKed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockNack;

pub struct MockBus {
    /// One entry per write phase: (address, payload).
    pub writes: Vec<(u8, Vec<u8, 72>), 16>,
    /// Scripted responses, served in order to read phases.
    reads: Vec<Vec<u8, 8>, 8>,
    read_cursor: usize,
    /// Number of upcoming transactions to NACK before answering again.
    pub nack_next: u32,
}

impl MockBus {
    pub fn new() -> Self {
        Self {
            writes: Vec::new(),
            reads: Vec::new(),
            read_cursor: 0,
            nack_next: 0,
        }
    }

    pub fn queue_read(&mut self, data: &[u8]) {
        let mut v = Vec::new();
        v.extend_from_slice(data).expect("scripted read too long");
        self.reads.push(v).expect("too many scripted reads");
    }

    fn consume_nack(&mut self) -> Result<(), MockNack> {
        if self.nack_next > 0 {
            self.nack_next -= 1;
            Err(MockNack)
        } else {
            Ok(())
        }
    }

    fn record_write(&mut self, address: u8, data: &[u8]) {
        let mut v = Vec::new();
        v.extend_from_slice(data).expect("write payload too long");
        self.writes.push((address, v)).expect("too many writes");
    }

    fn serve_read(&mut self, buf: &mut [u8]) {
        let scripted = self.reads.get(self.read_cursor).expect("unscripted read");
        buf.copy_from_slice(&scripted[..buf.len()]);
        self.read_cursor += 1;
    }
}

impl I2cBus for MockBus {
    type Error = MockNack;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), MockNack> {
        self.consume_nack()?;
        self.record_write(address, data);
        Ok(())
    }

    fn read(&mut self, _address: u8, buf: &mut [u8]) -> Result<(), MockNack> {
        self.consume_nack()?;
        self.serve_read(buf);
        Ok(())
    }

    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), MockNack> {
        self.consume_nack()?;
        self.record_write(address, write_data);
        self.serve_read(read_buf);
        Ok(())
    }
}
