//! # Temperature
//! Sensor interface and the conversion for the RP2040's on-die temperature sensor.
#![allow(async_fn_in_trait)]

/// Anything that can produce a temperature reading on demand.
pub trait TemperatureSensor {
    /// Error raised by the underlying hardware
    type Error;

    /// Take a fresh reading, in degrees Celsius
    async fn read_celsius(&mut self) -> Result<f32, Self::Error>;
}

/// ADC reference voltage on the Pico
const ADC_VREF: f32 = 3.3;
/// Full scale of the 12 bit ADC
const ADC_FULL_SCALE: f32 = 4096.0;
/// Sensor voltage at 27 °C, from the RP2040 datasheet
const SENSOR_V_AT_27C: f32 = 0.706;
/// Sensor slope in volts per degree, from the RP2040 datasheet
const SENSOR_SLOPE_V_PER_C: f32 = 0.001_721;

/// Convert a raw 12 bit reading of the internal temperature channel to degrees Celsius.
#[must_use]
pub fn celsius_from_adc(raw: u16) -> f32 {
    let volts = f32::from(raw) * ADC_VREF / ADC_FULL_SCALE;
    27.0 - (volts - SENSOR_V_AT_27C) / SENSOR_SLOPE_V_PER_C
}
