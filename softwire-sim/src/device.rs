//! Simulated peripherals
//!
//! Edge-driven models that sit on the simulated bus: a generic I2C target
//! (enough of a slave to ack its address, absorb writes and stream reads)
//! and a stuck-line fault injector. Like real slaves, the target samples
//! SDA on SCL rising edges and changes its own drive only on falling
//! edges.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::bus::Wire;

/// What a peripheral is currently pulling low.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineDrive {
    pub scl_low: bool,
    pub sda_low: bool,
}

/// A participant on the simulated bus.
///
/// Called after every master-side transition with the settled line
/// levels (which include the peripheral's own drive); returns what the
/// peripheral pulls low from now on.
pub trait SimPeripheral {
    fn update(&mut self, scl: bool, sda: bool) -> LineDrive;
}

// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Not addressed; waiting for a START.
    Idle,
    /// Shifting in the address byte.
    Address { bits: u8, count: u8 },
    /// Driving SDA low for the address acknowledge slot.
    AckAddress { read: bool },
    /// Shifting in a data byte from the master.
    Write { bits: u8, count: u8 },
    /// Driving SDA low for a data acknowledge slot.
    AckWrite,
    /// Shifting a data byte out to the master.
    Read { byte: u8, sent: u8 },
    /// Waiting for the master's acknowledge after a byte we sent.
    WaitAck,
}

struct TargetInner {
    address: u8,
    phase: Phase,
    prev_scl: bool,
    prev_sda: bool,
    sda_low: bool,
    master_acked: bool,
    written: Vec<u8>,
    read_data: VecDeque<u8>,
}

impl TargetInner {
    fn drive(&self) -> LineDrive {
        LineDrive {
            scl_low: false,
            sda_low: self.sda_low,
        }
    }

    /// Next byte for the master; an exhausted stream reads as a released
    /// line, i.e. 0xFF.
    fn next_read_byte(&mut self) -> u8 {
        self.read_data.pop_front().unwrap_or(0xFF)
    }

    fn output_read_bit(&mut self, byte: u8, index: u8) {
        let bit = (byte >> (7 - index)) & 1;
        self.sda_low = bit == 0;
    }

    fn update(&mut self, scl: bool, sda: bool) -> LineDrive {
        let prev_scl = self.prev_scl;
        let prev_sda = self.prev_sda;
        self.prev_scl = scl;
        self.prev_sda = sda;

        // START/STOP are SDA transitions while SCL stays high. We cannot
        // be the cause while driving SDA low ourselves.
        if scl && prev_scl && !self.sda_low {
            if prev_sda && !sda {
                self.phase = Phase::Address { bits: 0, count: 0 };
                return self.drive();
            }
            if !prev_sda && sda {
                self.phase = Phase::Idle;
                return self.drive();
            }
        }

        if scl && !prev_scl {
            self.on_scl_rise(sda);
        } else if !scl && prev_scl {
            self.on_scl_fall();
        }
        self.drive()
    }

    /// Rising edge: sample.
    fn on_scl_rise(&mut self, sda: bool) {
        match &mut self.phase {
            Phase::Address { bits, count } | Phase::Write { bits, count } => {
                *bits = (*bits << 1) | sda as u8;
                *count += 1;
            }
            Phase::Read { sent, .. } => {
                // master just clocked our current bit in
                *sent += 1;
            }
            Phase::WaitAck => {
                self.master_acked = !sda;
            }
            _ => {}
        }
    }

    /// Falling edge: change outputs.
    fn on_scl_fall(&mut self) {
        match self.phase {
            Phase::Address { bits, count: 8 } => {
                if bits >> 1 == self.address {
                    self.sda_low = true;
                    self.phase = Phase::AckAddress {
                        read: bits & 1 == 1,
                    };
                } else {
                    self.phase = Phase::Idle;
                }
            }
            Phase::AckAddress { read } => {
                self.sda_low = false;
                if read {
                    let byte = self.next_read_byte();
                    self.phase = Phase::Read { byte, sent: 0 };
                    self.output_read_bit(byte, 0);
                } else {
                    self.phase = Phase::Write { bits: 0, count: 0 };
                }
            }
            Phase::Write { bits, count: 8 } => {
                self.written.push(bits);
                self.sda_low = true;
                self.phase = Phase::AckWrite;
            }
            Phase::AckWrite => {
                self.sda_low = false;
                self.phase = Phase::Write { bits: 0, count: 0 };
            }
            Phase::Read { byte, sent } => {
                if sent == 8 {
                    // byte done; hand SDA back for the master's ack
                    self.sda_low = false;
                    self.phase = Phase::WaitAck;
                } else {
                    self.output_read_bit(byte, sent);
                }
            }
            Phase::WaitAck => {
                if self.master_acked {
                    let byte = self.next_read_byte();
                    self.phase = Phase::Read { byte, sent: 0 };
                    self.output_read_bit(byte, 0);
                } else {
                    self.sda_low = false;
                    self.phase = Phase::Idle;
                }
            }
            _ => {}
        }
    }
}

/// A generic I2C target: acks its own address, records written bytes,
/// streams scripted read data (0xFF once the script runs out).
///
/// Cloning yields another handle to the same device, so tests can keep
/// one for assertions after attaching the other to the bus.
#[derive(Clone)]
pub struct SimTarget {
    inner: Rc<RefCell<TargetInner>>,
}

impl SimTarget {
    pub fn new(address: u8) -> Self {
        Self {
            inner: Rc::new(RefCell::new(TargetInner {
                address,
                phase: Phase::Idle,
                prev_scl: true,
                prev_sda: true,
                sda_low: false,
                master_acked: false,
                written: Vec::new(),
                read_data: VecDeque::new(),
            })),
        }
    }

    /// Every data byte the master has written to this device.
    pub fn written(&self) -> Vec<u8> {
        self.inner.borrow().written.clone()
    }

    /// Replace the scripted read stream.
    pub fn set_read_data(&self, data: &[u8]) {
        let mut inner = self.inner.borrow_mut();
        inner.read_data.clear();
        inner.read_data.extend(data.iter().copied());
    }
}

impl SimPeripheral for SimTarget {
    fn update(&mut self, scl: bool, sda: bool) -> LineDrive {
        self.inner.borrow_mut().update(scl, sda)
    }
}

// ---------------------------------------------------------------------------

struct StuckInner {
    wire: Wire,
    holding: bool,
    release_after: Option<u32>,
    prev_scl: bool,
}

/// Fault injector: holds one wire low, optionally letting go after a
/// number of SCL pulses, like a peripheral abandoned mid-byte that the
/// recovery sequence can walk free.
#[derive(Clone)]
pub struct StuckLine {
    inner: Rc<RefCell<StuckInner>>,
}

impl StuckLine {
    /// Hold `wire` low until `pulses` SCL falling edges have passed.
    pub fn until_clocked(wire: Wire, pulses: u32) -> Self {
        Self::build(wire, Some(pulses))
    }

    /// Hold `wire` low forever.
    pub fn holding(wire: Wire) -> Self {
        Self::build(wire, None)
    }

    fn build(wire: Wire, release_after: Option<u32>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(StuckInner {
                wire,
                holding: true,
                release_after,
                prev_scl: true,
            })),
        }
    }

    /// Whether the injector has let go of the wire.
    pub fn released(&self) -> bool {
        !self.inner.borrow().holding
    }
}

impl SimPeripheral for StuckLine {
    fn update(&mut self, scl: bool, _sda: bool) -> LineDrive {
        let mut inner = self.inner.borrow_mut();
        let fell = inner.prev_scl && !scl;
        inner.prev_scl = scl;

        if fell && inner.holding {
            if let Some(remaining) = inner.release_after.as_mut() {
                *remaining = remaining.saturating_sub(1);
                if *remaining == 0 {
                    inner.holding = false;
                }
            }
        }

        LineDrive {
            scl_low: inner.holding && inner.wire == Wire::Scl,
            sda_low: inner.holding && inner.wire == Wire::Sda,
        }
    }
}
