//! # Alarm state
//! The one piece of state shared between the HTTP responder and the beeper loop.
//!
//! The responder is the only writer, the beeper the only (blocking) reader. The flag itself is a
//! plain atomic; the signal only exists so the beeper does not have to poll while the alarm is off.
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use portable_atomic::{AtomicBool, Ordering};

/// Alarm on/off flag plus the wake signal for the beeper.
pub struct AlarmState {
    /// Whether the alarm should be sounding
    enabled: AtomicBool,
    /// Released when the alarm is switched on, reset when it is switched off
    wake: Signal<CriticalSectionRawMutex, ()>,
}

impl AlarmState {
    /// Create a new, disabled alarm state. `const` so it can live in a `static`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            enabled: AtomicBool::new(false),
            wake: Signal::new(),
        }
    }

    /// Switch the alarm on or off.
    ///
    /// Switching on releases a waiting beeper. Switching off clears a pending wake, so the next
    /// `wait_enabled` suspends again, but keeps a beeper that is already waiting registered.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
        if enabled {
            self.wake.signal(());
        } else {
            let _ = self.wake.try_take();
        }
    }

    /// Current value of the flag
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Suspend until the alarm is enabled. Returns immediately if it already is.
    pub async fn wait_enabled(&self) {
        while !self.is_enabled() {
            self.wake.wait().await;
        }
    }
}

impl Default for AlarmState {
    fn default() -> Self {
        Self::new()
    }
}
