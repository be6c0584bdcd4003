//! Wire activity decoder
//!
//! Watches the settled line levels and records the protocol-visible
//! events: START (SDA falling while SCL high), STOP (SDA rising while SCL
//! high), and the SDA level at every SCL rising edge (the instant a
//! receiver samples).

/// One decoded wire event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusEvent {
    /// SDA fell while SCL was released.
    Start,
    /// SDA rose while SCL was released.
    Stop,
    /// SCL rose; the payload is the SDA level at that instant.
    Bit(bool),
}

/// One 9-bit frame between a START and a STOP: eight data bits MSB-first
/// plus the acknowledge-slot level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// The eight data bits, assembled MSB-first.
    pub byte: u8,
    /// Level during the ninth slot; `true` means nobody acknowledged.
    pub ack_bit: bool,
}

/// Group the bit events of a trace into frames.
///
/// Bits outside a START..STOP window are ignored; a START resets the bit
/// accumulator, so a repeated start mid-byte discards the partial byte
/// the way a real receiver would.
pub fn frames(events: &[BusEvent]) -> Vec<Frame> {
    let mut frames = Vec::new();
    let mut bits: Vec<bool> = Vec::new();
    let mut active = false;
    for event in events {
        match event {
            BusEvent::Start => {
                active = true;
                bits.clear();
            }
            BusEvent::Stop => {
                active = false;
                bits.clear();
            }
            BusEvent::Bit(level) if active => {
                bits.push(*level);
                if bits.len() == 9 {
                    let mut byte = 0u8;
                    for &bit in &bits[..8] {
                        byte = (byte << 1) | bit as u8;
                    }
                    frames.push(Frame {
                        byte,
                        ack_bit: bits[8],
                    });
                    bits.clear();
                }
            }
            BusEvent::Bit(_) => {}
        }
    }
    frames
}

/// Incremental decoder fed with every settled line state.
pub(crate) struct Trace {
    prev_scl: bool,
    prev_sda: bool,
    pub(crate) events: Vec<BusEvent>,
}

impl Trace {
    pub(crate) fn new() -> Self {
        Self {
            prev_scl: true,
            prev_sda: true,
            events: Vec::new(),
        }
    }

    pub(crate) fn observe(&mut self, scl: bool, sda: bool) {
        if scl && !self.prev_scl {
            self.events.push(BusEvent::Bit(sda));
        } else if scl && self.prev_scl {
            if self.prev_sda && !sda {
                self.events.push(BusEvent::Start);
            } else if !self.prev_sda && sda {
                self.events.push(BusEvent::Stop);
            }
        }
        self.prev_scl = scl;
        self.prev_sda = sda;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_start_bits_stop() {
        let mut trace = Trace::new();
        // START: SDA falls with SCL high
        trace.observe(true, false);
        // one high bit: SCL low, SDA high, SCL high, SCL low
        trace.observe(false, false);
        trace.observe(false, true);
        trace.observe(true, true);
        trace.observe(false, true);
        // STOP: SDA low, SCL high, SDA rises
        trace.observe(false, false);
        trace.observe(true, false);
        trace.observe(true, true);

        assert_eq!(
            trace.events,
            [BusEvent::Start, BusEvent::Bit(true), BusEvent::Stop]
        );
    }

    #[test]
    fn test_frames_groups_nine_bits() {
        let mut events = vec![BusEvent::Start];
        // 0xA5 MSB-first, then a NACK slot
        for bit in [true, false, true, false, false, true, false, true] {
            events.push(BusEvent::Bit(bit));
        }
        events.push(BusEvent::Bit(true));
        events.push(BusEvent::Stop);

        let frames = frames(&events);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].byte, 0xA5);
        assert!(frames[0].ack_bit);
    }

    #[test]
    fn test_bits_outside_transaction_ignored() {
        let events = [
            BusEvent::Bit(true),
            BusEvent::Bit(false),
            BusEvent::Start,
            BusEvent::Stop,
        ];
        assert!(frames(&events).is_empty());
    }
}
