//! Hardware watchdog: resets the device if the executor stops running, and performs the one
//! reset that ends every run.
//!
//! The run feeds the watchdog from the main task, raced against the supervisor. A task that
//! never yields starves the feeding and the watchdog bites.
use crate::task::resources::WatchdogResources;
use defmt::{info, warn};
use embassy_rp::watchdog::Watchdog;
use embassy_time::{Duration, Timer};
use pico_alarm_buzzer::supervisor::DeviceReset;

/// Hardware watchdog timeout
const HARDWARE_WATCHDOG_TIMEOUT: Duration = Duration::from_millis(8000);
/// How often the watchdog is fed
const FEED_INTERVAL: Duration = Duration::from_secs(2);

/// Resets the device through the watchdog
pub struct WatchdogReset(Watchdog);

impl WatchdogReset {
    /// Start the hardware watchdog. It must be fed from now on.
    pub fn start(r: WatchdogResources) -> Self {
        let mut watchdog = Watchdog::new(r.watchdog);
        watchdog.pause_on_debug(true);
        watchdog.start(HARDWARE_WATCHDOG_TIMEOUT);
        info!(
            "watchdog started, timeout {} ms, fed every {} s",
            HARDWARE_WATCHDOG_TIMEOUT.as_millis(),
            FEED_INTERVAL.as_secs()
        );
        Self(watchdog)
    }

    /// Feed the watchdog forever
    pub async fn keep_alive(&mut self) -> ! {
        loop {
            self.0.feed();
            Timer::after(FEED_INTERVAL).await;
        }
    }
}

impl DeviceReset for WatchdogReset {
    fn reset(&mut self) {
        warn!("resetting");
        self.0.trigger_reset();
    }
}
