//! # Tone output
//! The interface to whatever makes the noise, and the PWM arithmetic to drive a passive
//! piezo speaker at a given pitch.

/// Something that can play a single tone.
///
/// `start` must not block: the beeper times the tone itself and calls `stop` when it is over.
pub trait ToneActuator {
    /// Error raised by the underlying hardware
    type Error;

    /// Start sounding at `frequency_hz`
    fn start(&mut self, frequency_hz: u32) -> Result<(), Self::Error>;

    /// Silence the output
    fn stop(&mut self) -> Result<(), Self::Error>;
}

/// Counter settings for a PWM slice that produce a square wave at the requested pitch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PwmTiming {
    /// Integer clock divider (1..=255)
    pub divider: u8,
    /// Counter wrap value
    pub top: u16,
    /// Compare value for a 50% duty cycle
    pub compare: u16,
}

impl PwmTiming {
    /// Find the smallest integer divider that lets the 16 bit counter reach `frequency_hz`
    /// from a `clock_hz` system clock. A small divider keeps the pitch error low.
    ///
    /// Returns `None` for 0 Hz or for pitches too low (or too high) to reach.
    #[must_use]
    pub fn for_frequency(clock_hz: u32, frequency_hz: u32) -> Option<Self> {
        if frequency_hz == 0 {
            return None;
        }
        (1..=u8::MAX).find_map(|divider| {
            let period = u64::from(clock_hz) / (u64::from(divider) * u64::from(frequency_hz));
            if period < 2 {
                return None;
            }
            let top = u16::try_from(period - 1).ok()?;
            Some(Self {
                divider,
                top,
                compare: top / 2 + 1,
            })
        })
    }
}
