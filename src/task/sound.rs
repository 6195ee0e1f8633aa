//! # Sound
//! Drives the passive piezo speaker with a square wave from a PWM slice.
//!
//! A tone is just a PWM configuration: the counter wraps at the pitch, channel A is high for
//! half of the period. Silence is a compare value of 0.
use crate::task::resources::SpeakerResources;
use defmt::{Format, warn};
use embassy_rp::clocks::clk_sys_freq;
use embassy_rp::pwm::{Config, Pwm};
use pico_alarm_buzzer::tone::{PwmTiming, ToneActuator};

/// The requested pitch cannot be produced from the system clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub struct UnreachablePitch(pub u32);

/// The speaker on its PWM slice
pub struct PwmTone {
    /// PWM output driving the speaker
    pwm: Pwm<'static>,
    /// Current configuration of the slice
    config: Config,
}

impl PwmTone {
    /// Set up the slice, silent.
    pub fn new(r: SpeakerResources) -> Self {
        let mut config = Config::default();
        config.compare_a = 0;
        let pwm = Pwm::new_output_a(r.pwm_slice, r.pin, config.clone());
        Self { pwm, config }
    }
}

impl ToneActuator for PwmTone {
    type Error = UnreachablePitch;

    fn start(&mut self, frequency_hz: u32) -> Result<(), UnreachablePitch> {
        let Some(timing) = PwmTiming::for_frequency(clk_sys_freq(), frequency_hz) else {
            warn!("cannot play {} Hz", frequency_hz);
            return Err(UnreachablePitch(frequency_hz));
        };
        self.config.divider = timing.divider.into();
        self.config.top = timing.top;
        self.config.compare_a = timing.compare;
        self.pwm.set_config(&self.config);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), UnreachablePitch> {
        self.config.compare_a = 0;
        self.pwm.set_config(&self.config);
        Ok(())
    }
}
