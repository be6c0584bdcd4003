//! GPIO line abstractions
//!
//! Provides the open-drain line trait the bus engine drives. An open-drain
//! line is never driven high: logic 1 is reached by releasing the line and
//! letting an external pull-up restore it. Any participant pulling the
//! line low wins (wired-AND), which is what lets a peripheral stretch the
//! clock or hold data without an arbitration protocol.

/// A single open-drain bus line.
///
/// Implementations map [`drive_low`] to "direction = output, level = 0"
/// and [`release`] to "direction = input" on the underlying pin. There is
/// deliberately no way to drive the line high.
///
/// [`drive_low`]: Self::drive_low
/// [`release`]: Self::release
pub trait OpenDrainLine {
    /// Actively drive the line to logic 0.
    fn drive_low(&mut self);

    /// Stop driving the line; it floats and the pull-up (or another
    /// participant holding it low) determines the level.
    fn release(&mut self);

    /// Sample the current logic level of the line.
    ///
    /// After [`release`], a reading of `false` means another participant
    /// is holding the line low, or the pull-up is missing.
    ///
    /// [`release`]: Self::release
    fn is_high(&self) -> bool;

    /// Sample the current logic level, inverted.
    fn is_low(&self) -> bool {
        !self.is_high()
    }
}
