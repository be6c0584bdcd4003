//! Simulated open-drain bus for host-side testing
//!
//! Implements the `softwire-hal` capability traits over a pair of
//! in-memory wires with wired-AND semantics: a wire is high unless some
//! participant (the master or an attached peripheral) is pulling it low.
//! Time is virtual: the delay source only advances a counter, so tests of
//! multi-second retry budgets finish instantly.
//!
//! Peripherals are edge-driven: after every master-side line transition
//! the bus settles, each attached [`SimPeripheral`] observes the new line
//! levels, and its drive decisions are folded back into the wires. The
//! decoded wire activity (START/STOP conditions and sampled bits) is
//! recorded and can be taken for assertions.
//!
//! Everything here is test instrumentation; nothing in this crate is
//! meant to run on a target.

pub mod bus;
pub mod device;
pub mod trace;

pub use bus::{SimBus, SimDelay, SimLine, Wire};
pub use device::{LineDrive, SimPeripheral, SimTarget, StuckLine};
pub use trace::{frames, BusEvent, Frame};
