//! # Task messages of the system
//! The state shared between the tasks.
//!
//! The alarm flag is written by the HTTP listener and read by the beeper. Faults travel the
//! other way: background tasks raise them, the supervisor waits for them and ends the run.
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use pico_alarm_buzzer::alarm::AlarmState;
use pico_alarm_buzzer::fault::Fault;

/// Whether the alarm is on, plus the wake signal for the beeper. Off after every reset.
pub static ALARM_STATE: AlarmState = AlarmState::new();

/// For faults raised by background tasks. The first one ends the run.
pub static FAULT_SIGNAL: Signal<CriticalSectionRawMutex, Fault> = Signal::new();
