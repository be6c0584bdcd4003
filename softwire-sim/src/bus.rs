//! The simulated bus
//!
//! Two wired-AND wires, master-side line handles implementing
//! [`OpenDrainLine`], a virtual-time delay source, and the settle loop
//! that lets attached peripherals react to every transition.

use std::cell::RefCell;
use std::mem;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use softwire_hal::OpenDrainLine;

use crate::device::SimPeripheral;
use crate::trace::{BusEvent, Trace};

/// Which of the two bus wires a handle refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wire {
    Scl,
    Sda,
}

struct BusState {
    master_scl_low: bool,
    master_sda_low: bool,
    devices: Vec<Box<dyn SimPeripheral>>,
    device_scl_low: Vec<bool>,
    device_sda_low: Vec<bool>,
    trace: Trace,
    now_ns: u64,
}

impl BusState {
    /// Wired-AND: the wire is high unless someone pulls it low.
    fn level(&self, wire: Wire) -> bool {
        match wire {
            Wire::Scl => !self.master_scl_low && !self.device_scl_low.iter().any(|&low| low),
            Wire::Sda => !self.master_sda_low && !self.device_sda_low.iter().any(|&low| low),
        }
    }

    /// Let the peripherals react until the lines stop moving, then feed
    /// the settled state to the trace decoder. Peripherals only change
    /// their drive on SCL edges they have just observed, so this
    /// converges in a couple of rounds.
    fn settle(&mut self) {
        for _ in 0..4 {
            let scl = self.level(Wire::Scl);
            let sda = self.level(Wire::Sda);
            let mut changed = false;
            for (i, device) in self.devices.iter_mut().enumerate() {
                let drive = device.update(scl, sda);
                if drive.scl_low != self.device_scl_low[i] || drive.sda_low != self.device_sda_low[i]
                {
                    changed = true;
                    self.device_scl_low[i] = drive.scl_low;
                    self.device_sda_low[i] = drive.sda_low;
                }
            }
            if !changed {
                break;
            }
        }
        let scl = self.level(Wire::Scl);
        let sda = self.level(Wire::Sda);
        self.trace.observe(scl, sda);
    }
}

/// A simulated two-wire bus. Clone-free handle type: lines, delay and
/// peripherals all share the one state behind `Rc`.
pub struct SimBus {
    state: Rc<RefCell<BusState>>,
}

impl SimBus {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(BusState {
                master_scl_low: false,
                master_sda_low: false,
                devices: Vec::new(),
                device_scl_low: Vec::new(),
                device_sda_low: Vec::new(),
                trace: Trace::new(),
                now_ns: 0,
            })),
        }
    }

    /// Master-side handle for the clock wire.
    pub fn scl(&self) -> SimLine {
        SimLine {
            state: Rc::clone(&self.state),
            wire: Wire::Scl,
        }
    }

    /// Master-side handle for the data wire.
    pub fn sda(&self) -> SimLine {
        SimLine {
            state: Rc::clone(&self.state),
            wire: Wire::Sda,
        }
    }

    /// Virtual-time delay source for the master.
    pub fn delay(&self) -> SimDelay {
        SimDelay {
            state: Rc::clone(&self.state),
        }
    }

    /// Attach a peripheral to the bus.
    pub fn attach(&self, device: impl SimPeripheral + 'static) {
        let mut state = self.state.borrow_mut();
        state.devices.push(Box::new(device));
        state.device_scl_low.push(false);
        state.device_sda_low.push(false);
    }

    /// Current level of a wire.
    pub fn level(&self, wire: Wire) -> bool {
        self.state.borrow().level(wire)
    }

    /// Virtual time elapsed, in microseconds.
    pub fn now_us(&self) -> u64 {
        self.state.borrow().now_ns / 1_000
    }

    /// Take (and clear) the decoded wire events recorded so far.
    pub fn take_events(&self) -> Vec<BusEvent> {
        mem::take(&mut self.state.borrow_mut().trace.events)
    }
}

impl Default for SimBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Master-side view of one wire.
pub struct SimLine {
    state: Rc<RefCell<BusState>>,
    wire: Wire,
}

impl OpenDrainLine for SimLine {
    fn drive_low(&mut self) {
        let mut state = self.state.borrow_mut();
        match self.wire {
            Wire::Scl => state.master_scl_low = true,
            Wire::Sda => state.master_sda_low = true,
        }
        state.settle();
    }

    fn release(&mut self) {
        let mut state = self.state.borrow_mut();
        match self.wire {
            Wire::Scl => state.master_scl_low = false,
            Wire::Sda => state.master_sda_low = false,
        }
        state.settle();
    }

    fn is_high(&self) -> bool {
        self.state.borrow().level(self.wire)
    }
}

/// Delay source that advances the virtual clock instead of sleeping.
pub struct SimDelay {
    state: Rc<RefCell<BusState>>,
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.state.borrow_mut().now_ns += ns as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wired_and() {
        let bus = SimBus::new();
        let mut scl = bus.scl();
        let mut sda = bus.sda();

        // idle: pull-ups win
        assert!(bus.level(Wire::Scl));
        assert!(bus.level(Wire::Sda));

        scl.drive_low();
        assert!(!bus.level(Wire::Scl));
        assert!(bus.level(Wire::Sda));

        sda.drive_low();
        scl.release();
        assert!(bus.level(Wire::Scl));
        assert!(!bus.level(Wire::Sda));

        sda.release();
        assert!(bus.level(Wire::Sda));
    }

    #[test]
    fn test_virtual_time() {
        let bus = SimBus::new();
        let mut delay = bus.delay();
        delay.delay_us(5);
        delay.delay_ms(2);
        assert_eq!(bus.now_us(), 2_005);
    }
}
