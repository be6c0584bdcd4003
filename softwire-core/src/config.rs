//! Bus configuration
//!
//! All timing values and retry bounds are named fields with the reference
//! defaults, so they can be tuned for slower platforms without touching
//! the engine.

/// Configuration for one emulated bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Target bit rate in Hz. Determines the half-bit-period delay used
    /// by every timed line transition.
    pub frequency_hz: u32,
    /// Emit a `defmt` warning when a bounded wait expires.
    pub warn_on_timeout: bool,
    /// Poll interval, in milliseconds, while waiting for a released SCL
    /// to actually rise (clock stretching).
    pub stretch_poll_ms: u32,
    /// Maximum number of stretch polls before giving up (soft failure).
    pub stretch_poll_limit: u32,
    /// Clock pulses per recovery burst. Enough edges to walk a peripheral
    /// stuck mid-byte through the rest of its transaction.
    pub recovery_pulses: u32,
    /// Maximum recovery bursts before giving up (soft failure).
    pub recovery_burst_limit: u32,
    /// Delay between recovery bursts, in milliseconds.
    pub recovery_burst_delay_ms: u32,
}

/// Construction-time configuration errors.
///
/// These are caller programming errors, not runtime bus conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// `frequency_hz` was zero; the half period would be undefined.
    ZeroFrequency,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frequency_hz: 100_000, // 100kHz standard mode
            warn_on_timeout: true,
            stretch_poll_ms: 100,
            stretch_poll_limit: 50,
            recovery_pulses: 10,
            recovery_burst_limit: 100,
            recovery_burst_delay_ms: 10,
        }
    }
}

impl Config {
    /// Standard mode (100 kHz), warnings enabled.
    pub const STANDARD: Self = Self {
        frequency_hz: 100_000,
        warn_on_timeout: true,
        stretch_poll_ms: 100,
        stretch_poll_limit: 50,
        recovery_pulses: 10,
        recovery_burst_limit: 100,
        recovery_burst_delay_ms: 10,
    };

    /// Fast mode (400 kHz), warnings enabled.
    pub const FAST: Self = Self {
        frequency_hz: 400_000,
        ..Self::STANDARD
    };

    /// Standard mode with a given frequency.
    pub const fn with_frequency(frequency_hz: u32) -> Self {
        Self {
            frequency_hz,
            ..Self::STANDARD
        }
    }

    /// Half of one bit period, in microseconds.
    ///
    /// Every line transition a peripheral can perceive is followed by
    /// this delay, which enforces the minimum setup/hold time.
    ///
    /// Divides by `frequency_hz` and panics on a zero frequency; run
    /// [`validate`](Self::validate) first on a hand-built config. The
    /// engine only calls this after validating at construction.
    pub const fn half_period_us(&self) -> u32 {
        500_000 / self.frequency_hz
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frequency_hz == 0 {
            return Err(ConfigError::ZeroFrequency);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_period() {
        // 100 kHz -> 10 us bit period -> 5 us half period
        assert_eq!(Config::STANDARD.half_period_us(), 5);
        // Doubling the frequency halves the delay
        assert_eq!(Config::with_frequency(200_000).half_period_us(), 2);
        assert_eq!(Config::FAST.half_period_us(), 1);
    }

    #[test]
    fn test_default_bounds() {
        let c = Config::default();
        // Reference bounds: 50 polls x 100 ms stretch budget,
        // 100 bursts x 10 pulses with 10 ms spacing for recovery
        assert_eq!(c.stretch_poll_ms * c.stretch_poll_limit, 5_000);
        assert_eq!(c.recovery_pulses, 10);
        assert_eq!(c.recovery_burst_limit, 100);
    }

    #[test]
    fn test_zero_frequency_rejected() {
        let c = Config {
            frequency_hz: 0,
            ..Config::default()
        };
        assert_eq!(c.validate(), Err(ConfigError::ZeroFrequency));
        assert!(Config::default().validate().is_ok());
    }
}
