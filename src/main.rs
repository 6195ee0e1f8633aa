//! # Pico alarm buzzer firmware
//! Network alarm buzzer for the Raspberry Pi Pico W.
//!
//! Joins the configured WiFi with a fixed address, serves a small control page on port 80 and
//! beeps on GPIO 20 while the alarm is switched on. Any fault resets the device through the
//! watchdog, which also guards against a stalled executor.

// we are in an environment with constrained resources, so we do not use the standard library and we define a different entry point.
#![no_std]
#![no_main]

use crate::task::resources::Resources;
use crate::task::supervisor::supervise;
use crate::task::watchdog::WatchdogReset;
use defmt::info;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_futures::select::{Either, select};
use embassy_time::{Duration, Timer};
use pico_alarm_buzzer::supervisor::run_then_reset;
#[cfg(feature = "halt-on-panic")]
use panic_probe as _;

mod task;

/// Time for the RTT buffer to drain before the reset
const RESET_DELAY: Duration = Duration::from_millis(500);

/// Entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Program start");

    let p = embassy_rp::init(Default::default());
    let r = Resources::take(p);

    let mut watchdog = WatchdogReset::start(r.watchdog);

    run_then_reset(&mut watchdog, async move |watchdog: &mut WatchdogReset| {
        let fault = match select(supervise(spawner, r.wifi, r.speaker, r.sensor), watchdog.keep_alive()).await {
            Either::First(fault) => fault,
            Either::Second(never) => never,
        };
        Timer::after(RESET_DELAY).await;
        fault
    })
    .await;
}

/// Reset on panic, same as for any other fault
#[cfg(not(feature = "halt-on-panic"))]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    defmt::error!("panic: {}", defmt::Display2Format(info));
    cortex_m::peripheral::SCB::sys_reset()
}
