//! # Temperature
//! Reads the RP2040's on-die temperature sensor through the ADC.
use crate::task::resources::{Irqs, SensorResources};
use embassy_rp::adc::{Adc, Async, Channel, Config, Error};
use pico_alarm_buzzer::temperature::{TemperatureSensor, celsius_from_adc};

/// The ADC with the temperature channel selected
pub struct OnboardTemperature {
    /// The converter
    adc: Adc<'static, Async>,
    /// Internal temperature channel
    channel: Channel<'static>,
}

impl OnboardTemperature {
    /// Set up the ADC for the temperature channel
    pub fn new(r: SensorResources) -> Self {
        Self {
            adc: Adc::new(r.adc, Irqs, Config::default()),
            channel: Channel::new_temp_sensor(r.temp_sensor),
        }
    }
}

impl TemperatureSensor for OnboardTemperature {
    type Error = Error;

    async fn read_celsius(&mut self) -> Result<f32, Error> {
        let raw = self.adc.read(&mut self.channel).await?;
        Ok(celsius_from_adc(raw))
    }
}
