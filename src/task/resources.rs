//! # Resources
//! Peripherals grouped per task, and the interrupt bindings they need.
use assign_resources::assign_resources;
use embassy_rp::adc::InterruptHandler as AdcInterruptHandler;
use embassy_rp::peripherals::PIO0;
use embassy_rp::pio::InterruptHandler as PioInterruptHandler;
use embassy_rp::{Peripherals, bind_interrupts, peripherals};

// group the peripherals into resources, to be used in the tasks
assign_resources! {
    wifi: WifiResources {
        pwr_pin: PIN_23,
        cs_pin: PIN_25,
        pio_sm: PIO0,
        dio_pin: PIN_24,
        clk_pin: PIN_29,
        dma_ch: DMA_CH0,
    },
    speaker: SpeakerResources {
        // GPIO 20 is channel A of PWM slice 2
        pwm_slice: PWM_SLICE2,
        pin: PIN_20,
    },
    sensor: SensorResources {
        adc: ADC,
        temp_sensor: ADC_TEMP_SENSOR,
    },
    watchdog: WatchdogResources {
        watchdog: WATCHDOG,
    },
}

bind_interrupts!(pub struct Irqs {
    PIO0_IRQ_0 => PioInterruptHandler<PIO0>;
    ADC_IRQ_FIFO => AdcInterruptHandler;
});

/// All resources the firmware uses, split out of the peripherals once at startup
pub struct Resources {
    /// Radio
    pub wifi: WifiResources,
    /// Piezo speaker
    pub speaker: SpeakerResources,
    /// On-die temperature sensor
    pub sensor: SensorResources,
    /// Hardware watchdog
    pub watchdog: WatchdogResources,
}

impl Resources {
    /// Take what we need from the peripherals.
    pub fn take(p: Peripherals) -> Self {
        Self {
            wifi: WifiResources {
                pwr_pin: p.PIN_23,
                cs_pin: p.PIN_25,
                pio_sm: p.PIO0,
                dio_pin: p.PIN_24,
                clk_pin: p.PIN_29,
                dma_ch: p.DMA_CH0,
            },
            speaker: SpeakerResources {
                pwm_slice: p.PWM_SLICE2,
                pin: p.PIN_20,
            },
            sensor: SensorResources {
                adc: p.ADC,
                temp_sensor: p.ADC_TEMP_SENSOR,
            },
            watchdog: WatchdogResources { watchdog: p.WATCHDOG },
        }
    }
}
