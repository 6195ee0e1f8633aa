//! # Pico alarm buzzer
//! The hardware independent part of the alarm buzzer firmware: the shared alarm flag, the beeper
//! state machine, the HTTP responder and the startup/fault logic. The RP2040 specifics live in
//! the firmware binary and plug in through the traits defined here, which is also how the host
//! tests drive everything.
#![no_std]

#[cfg(test)]
extern crate std;

#[macro_use]
mod fmt;

pub mod alarm;
pub mod beeper;
pub mod config;
pub mod fault;
pub mod http;
pub mod link;
pub mod page;
pub mod supervisor;
pub mod temperature;
pub mod tone;
