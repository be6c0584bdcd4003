//! The bus engine
//!
//! Line primitives, bit- and byte-level transfer, and the start/stop/reset
//! signaling sequences. Everything here is built from two operations per
//! line: drive low, and release (logic high is only ever the pull-up's
//! doing). Each transition a peripheral can perceive is followed by one
//! half-bit-period delay.

use embedded_hal::delay::DelayNs;
use softwire_hal::{Ack, OpenDrainLine};

use crate::config::{Config, ConfigError};

/// Outcome of an operation that waits on an external party.
///
/// `Stalled` means a bounded wait expired and the operation continued
/// anyway. The bus is usually still usable afterwards (the common causes,
/// like a peripheral finishing an internal write cycle, are transient),
/// so this is a report, not an abort. Callers that see repeated stalls
/// can escalate via [`SoftI2c::stall_count`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusStatus {
    /// Every wait completed within its budget.
    Ok,
    /// At least one bounded wait expired; the sequence proceeded as if
    /// the line had released.
    Stalled,
}

impl BusStatus {
    /// True if a bounded wait expired during the operation.
    pub fn is_stalled(self) -> bool {
        self == BusStatus::Stalled
    }

    /// Combine two outcomes; a stall in either taints the result.
    pub fn and(self, other: BusStatus) -> BusStatus {
        if self.is_stalled() || other.is_stalled() {
            BusStatus::Stalled
        } else {
            BusStatus::Ok
        }
    }
}

/// A software-timed I2C master over two open-drain lines.
///
/// Owns the clock line, the data line and the delay source for the
/// lifetime of the bus; exclusive ownership is what guarantees the
/// strictly sequential single-master model. Construction puts the bus
/// through a recovery sequence so it starts from a known idle state
/// regardless of what a peripheral was doing before.
pub struct SoftI2c<SCL, SDA, D> {
    scl: SCL,
    sda: SDA,
    delay: D,
    config: Config,
    half_us: u32,
    stalls: u32,
}

impl<SCL, SDA, D> SoftI2c<SCL, SDA, D>
where
    SCL: OpenDrainLine,
    SDA: OpenDrainLine,
    D: DelayNs,
{
    /// Open a bus over the given clock and data lines.
    ///
    /// Releases both lines, then runs the reset sequence to force the bus
    /// idle. Rejects configurations the engine cannot run with.
    pub fn new(scl: SCL, sda: SDA, delay: D, config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut bus = Self {
            scl,
            sda,
            delay,
            half_us: config.half_period_us(),
            config,
            stalls: 0,
        };
        bus.release_scl();
        bus.release_sda();
        bus.reset();
        Ok(bus)
    }

    /// The configuration this bus was opened with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Cumulative count of expired bounded waits since the bus was
    /// opened. Monotonic; callers can diff it around a transaction to
    /// decide whether to escalate a repeated soft failure.
    pub fn stall_count(&self) -> u32 {
        self.stalls
    }

    /// Release the lines and give them back, e.g. to repurpose the pins.
    pub fn free(mut self) -> (SCL, SDA, D) {
        self.scl.release();
        self.sda.release();
        (self.scl, self.sda, self.delay)
    }

    // ----- line primitives ------------------------------------------------

    fn pull_scl(&mut self) {
        self.scl.drive_low();
        self.delay.delay_us(self.half_us);
    }

    fn pull_sda(&mut self) {
        self.sda.drive_low();
        self.delay.delay_us(self.half_us);
    }

    /// Release SCL and report whether it actually rose.
    fn release_scl(&mut self) -> bool {
        self.scl.release();
        self.delay.delay_us(self.half_us);
        self.scl.is_high()
    }

    /// Release SDA and report whether it actually rose. A `false` here
    /// means a peripheral is holding data low, or the pull-up is missing.
    fn release_sda(&mut self) -> bool {
        self.sda.release();
        self.delay.delay_us(self.half_us);
        self.sda.is_high()
    }

    /// Release SCL and wait, bounded, for it to rise. A peripheral that
    /// needs more time holds the clock low (clock stretching) and we poll
    /// until it lets go or the budget expires.
    fn release_scl_wait(&mut self) -> BusStatus {
        if self.release_scl() {
            return BusStatus::Ok;
        }
        for _ in 0..self.config.stretch_poll_limit {
            self.delay.delay_ms(self.config.stretch_poll_ms);
            if self.scl.is_high() {
                return BusStatus::Ok;
            }
        }
        self.note_stall("SCL held low past the stretch budget");
        BusStatus::Stalled
    }

    fn note_stall(&mut self, _context: &'static str) {
        self.stalls = self.stalls.saturating_add(1);
        #[cfg(feature = "defmt")]
        if self.config.warn_on_timeout {
            defmt::warn!("softwire: {=str}; continuing", _context);
        }
    }

    // ----- bit transfer ---------------------------------------------------

    /// Clock one data bit out. A high bit is produced by releasing SDA,
    /// a low bit by pulling it; the peripheral samples while SCL is
    /// released, and may stretch the clock before that.
    pub fn send_bit(&mut self, bit: bool) {
        if bit {
            self.release_sda();
        } else {
            self.pull_sda();
        }
        self.release_scl_wait();
        self.pull_scl();
        // idle-safe default between bits
        self.pull_sda();
    }

    /// Clock one data bit in. SDA is released so the peripheral can drive
    /// it; the sample is taken strictly while SCL is released, per the
    /// "data valid while clock high" rule.
    pub fn read_bit(&mut self) -> bool {
        self.release_sda();
        self.release_scl_wait();
        let bit = self.sda.is_high();
        self.pull_scl();
        self.pull_sda();
        bit
    }

    /// Place an acknowledge value on the wire (one [`send_bit`]).
    ///
    /// [`send_bit`]: Self::send_bit
    pub fn send_ack(&mut self, ack: Ack) {
        self.send_bit(ack.bit());
    }

    // ----- byte transfer --------------------------------------------------

    /// Send one byte MSB-first and return the peripheral's acknowledge
    /// bit from the ninth clock.
    pub fn send_byte(&mut self, byte: u8) -> Ack {
        let mut b = byte;
        for _ in 0..8 {
            self.send_bit(b & 0x80 != 0);
            b <<= 1;
        }
        Ack::from_bit(self.read_bit())
    }

    /// Read one byte MSB-first.
    ///
    /// Does not acknowledge: whether to ACK (continue) or NACK (end the
    /// read) belongs to the transfer-level protocol, so the caller follows
    /// up with [`send_ack`](Self::send_ack).
    pub fn read_byte(&mut self) -> u8 {
        let mut byte = 0u8;
        for _ in 0..8 {
            byte = (byte << 1) | self.read_bit() as u8;
        }
        byte
    }

    // ----- signaling sequences --------------------------------------------

    /// Issue a START condition: SDA falling while SCL is released.
    ///
    /// Valid both from idle and mid-transaction (repeated start, used for
    /// read-after-write addressing). If SDA turns out to be stuck low,
    /// the bus is put through recovery first.
    pub fn start(&mut self) -> BusStatus {
        let mut status = BusStatus::Ok;
        if !self.release_sda() {
            status = self.reset();
        }
        status = status.and(self.release_scl_wait());
        self.pull_sda();
        self.pull_scl();
        status
    }

    /// Issue a STOP condition: SDA rising while SCL is released.
    ///
    /// If SDA fails to rise, a peripheral is still holding it and the bus
    /// is put through recovery.
    pub fn stop(&mut self) -> BusStatus {
        let mut status = self.release_scl_wait();
        if !self.release_sda() {
            status = status.and(self.reset());
        }
        status
    }

    /// Force the bus back to idle.
    ///
    /// Releases SDA, then pulses SCL in bursts to walk a peripheral that
    /// is stuck mid-transaction through enough clock edges to finish and
    /// let go of the data line. Re-checks SDA after each burst, bounded by
    /// the configured burst budget; on exhaustion it reports the stall and
    /// gives up rather than hanging the caller. Finishes with a STOP shape
    /// so the bus is left released either way.
    pub fn reset(&mut self) -> BusStatus {
        self.release_sda();

        let mut freed = false;
        for burst in 0..self.config.recovery_burst_limit {
            if burst > 0 {
                self.delay.delay_ms(self.config.recovery_burst_delay_ms);
            }
            for _ in 0..self.config.recovery_pulses {
                self.pull_scl();
                self.release_scl();
            }
            if self.sda.is_high() {
                freed = true;
                break;
            }
        }

        let mut status = if freed {
            BusStatus::Ok
        } else {
            self.note_stall("SDA still held low after recovery bursts");
            BusStatus::Stalled
        };

        // Leave the bus idle with a STOP shape: pin both lines, then
        // release them while SCL is high. Inlined rather than calling
        // stop() so a still-stuck SDA cannot re-enter recovery from here.
        self.pull_scl();
        self.pull_sda();
        status = status.and(self.release_scl_wait());
        if !self.release_sda() {
            status = status.and(BusStatus::Stalled);
        }
        status
    }
}
