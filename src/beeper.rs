//! # Beeper loop
//! Plays the alarm pattern while the alarm is enabled and sleeps on the wake signal while it
//! is not.
//!
//! The pattern is a short chirp followed by a long one, repeating every 1.8 seconds. Every
//! tone is started, timed with a cooperative delay, and stopped, so the HTTP listener keeps
//! running between the chirps. The flag is only re-checked at the end of a full cycle:
//! switching the alarm off never cuts a chirp short.
use core::convert::Infallible;

use embedded_hal_async::delay::DelayNs;

use crate::alarm::AlarmState;
use crate::tone::ToneActuator;

/// One tone of the pattern and the time slot it occupies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Chirp {
    /// Pitch of the tone
    pub frequency_hz: u32,
    /// How long the tone sounds
    pub tone_ms: u32,
    /// Time from the start of this tone to the start of the next one
    pub slot_ms: u32,
}

/// Short chirp, pause, long chirp, longer pause. 1.8 s per cycle.
pub const ALARM_PATTERN: [Chirp; 2] = [
    Chirp {
        frequency_hz: 262,
        tone_ms: 100,
        slot_ms: 200,
    },
    Chirp {
        frequency_hz: 262,
        tone_ms: 600,
        slot_ms: 1_600,
    },
];

/// Length of one pass over `pattern`, in milliseconds
#[must_use]
pub fn cycle_ms(pattern: &[Chirp]) -> u32 {
    pattern.iter().map(|chirp| chirp.slot_ms).sum()
}

/// The two states of the beeper.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BeeperPhase {
    /// Waiting for the alarm to be switched on
    Silent,
    /// Playing the pattern, cycle after cycle
    Sounding,
}

/// The beeper state machine, driving a tone actuator with a delay provider.
pub struct BeeperLoop<'a, T, D> {
    /// Shared alarm flag
    alarm: &'a AlarmState,
    /// The noise maker
    tone: T,
    /// Cooperative delay
    delay: D,
    /// Current state
    phase: BeeperPhase,
    /// What to play
    pattern: &'a [Chirp],
}

impl<'a, T, D> BeeperLoop<'a, T, D>
where
    T: ToneActuator,
    D: DelayNs,
{
    /// Create a silent beeper playing the standard alarm pattern.
    pub const fn new(alarm: &'a AlarmState, tone: T, delay: D) -> Self {
        Self::with_pattern(alarm, tone, delay, &ALARM_PATTERN)
    }

    /// Create a silent beeper playing a custom pattern.
    pub const fn with_pattern(alarm: &'a AlarmState, tone: T, delay: D, pattern: &'a [Chirp]) -> Self {
        Self {
            alarm,
            tone,
            delay,
            phase: BeeperPhase::Silent,
            pattern,
        }
    }

    /// Current state
    pub const fn phase(&self) -> BeeperPhase {
        self.phase
    }

    /// Run one step of the state machine and return the state it ends in.
    ///
    /// Silent: suspend until the alarm is enabled, then switch to Sounding.
    /// Sounding: play one full cycle, then go Silent if the alarm has been switched off.
    pub async fn step(&mut self) -> Result<BeeperPhase, T::Error> {
        match self.phase {
            BeeperPhase::Silent => {
                self.alarm.wait_enabled().await;
                info!("alarm enabled, sounding");
                self.phase = BeeperPhase::Sounding;
            }
            BeeperPhase::Sounding => {
                self.play_cycle().await?;
                if !self.alarm.is_enabled() {
                    info!("alarm disabled, going silent");
                    self.phase = BeeperPhase::Silent;
                }
            }
        }
        Ok(self.phase)
    }

    /// Step forever. Only returns if the actuator fails.
    pub async fn run(&mut self) -> Result<Infallible, T::Error> {
        loop {
            self.step().await?;
        }
    }

    /// Play every chirp of the pattern once.
    async fn play_cycle(&mut self) -> Result<(), T::Error> {
        let pattern = self.pattern;
        for chirp in pattern {
            self.tone.start(chirp.frequency_hz)?;
            self.delay.delay_ms(chirp.tone_ms).await;
            self.tone.stop()?;
            self.delay
                .delay_ms(chirp.slot_ms.saturating_sub(chirp.tone_ms))
                .await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::join::join;
    use embassy_futures::yield_now;
    use std::cell::RefCell;
    use std::vec::Vec;

    /// What happened, in order, across the fake tone and the fake delay
    #[derive(Debug, PartialEq, Eq, Clone, Copy)]
    enum Trace {
        Start(u32),
        Stop,
        Sleep(u32),
    }

    type Log = RefCell<Vec<Trace>>;

    struct FakeTone<'a> {
        log: &'a Log,
        fail_after_starts: Option<usize>,
    }

    #[derive(Debug, PartialEq, Eq)]
    struct Jammed;

    impl ToneActuator for FakeTone<'_> {
        type Error = Jammed;

        fn start(&mut self, frequency_hz: u32) -> Result<(), Jammed> {
            if let Some(n) = self.fail_after_starts {
                if n == 0 {
                    return Err(Jammed);
                }
                self.fail_after_starts = Some(n - 1);
            }
            self.log.borrow_mut().push(Trace::Start(frequency_hz));
            Ok(())
        }

        fn stop(&mut self) -> Result<(), Jammed> {
            self.log.borrow_mut().push(Trace::Stop);
            Ok(())
        }
    }

    /// Records every delay and returns at once. Optionally switches the alarm off on the
    /// n-th delay, which lands in the middle of a cycle.
    struct FakeDelay<'a> {
        log: &'a Log,
        alarm: &'a AlarmState,
        disable_on_sleep: Option<usize>,
        sleeps: usize,
    }

    impl DelayNs for FakeDelay<'_> {
        async fn delay_ns(&mut self, ns: u32) {
            self.delay_ms(ns / 1_000_000).await;
        }

        async fn delay_ms(&mut self, ms: u32) {
            self.sleeps += 1;
            self.log.borrow_mut().push(Trace::Sleep(ms));
            if self.disable_on_sleep == Some(self.sleeps) {
                self.alarm.set_enabled(false);
            }
        }
    }

    fn one_cycle() -> [Trace; 8] {
        [
            Trace::Start(262),
            Trace::Sleep(100),
            Trace::Stop,
            Trace::Sleep(100),
            Trace::Start(262),
            Trace::Sleep(600),
            Trace::Stop,
            Trace::Sleep(1_000),
        ]
    }

    fn beeper<'a>(
        alarm: &'a AlarmState,
        log: &'a Log,
        disable_on_sleep: Option<usize>,
    ) -> BeeperLoop<'a, FakeTone<'a>, FakeDelay<'a>> {
        BeeperLoop::new(
            alarm,
            FakeTone {
                log,
                fail_after_starts: None,
            },
            FakeDelay {
                log,
                alarm,
                disable_on_sleep,
                sleeps: 0,
            },
        )
    }

    #[test]
    fn cycle_is_1800_ms() {
        assert_eq!(cycle_ms(&ALARM_PATTERN), 1_800);
    }

    #[tokio::test]
    async fn wakes_into_sounding_when_enabled() {
        let alarm = AlarmState::new();
        let log = Log::default();
        let mut beeper = beeper(&alarm, &log, None);
        assert_eq!(beeper.phase(), BeeperPhase::Silent);

        let (phase, ()) = join(beeper.step(), async {
            yield_now().await;
            alarm.set_enabled(true);
        })
        .await;

        assert_eq!(phase, Ok(BeeperPhase::Sounding));
        // waking up itself makes no noise, the first cycle starts on the next step
        assert!(log.borrow().is_empty());
    }

    #[tokio::test]
    async fn plays_the_exact_cadence() {
        let alarm = AlarmState::new();
        alarm.set_enabled(true);
        let log = Log::default();
        let mut beeper = beeper(&alarm, &log, None);

        assert_eq!(beeper.step().await, Ok(BeeperPhase::Sounding));
        assert_eq!(beeper.step().await, Ok(BeeperPhase::Sounding));
        assert_eq!(beeper.step().await, Ok(BeeperPhase::Sounding));

        let expected: Vec<Trace> = one_cycle().iter().chain(one_cycle().iter()).copied().collect();
        assert_eq!(*log.borrow(), expected);
        let slept: u32 = log
            .borrow()
            .iter()
            .map(|t| if let Trace::Sleep(ms) = t { *ms } else { 0 })
            .sum();
        assert_eq!(slept, 2 * cycle_ms(&ALARM_PATTERN));
    }

    #[tokio::test]
    async fn disabling_mid_cycle_finishes_the_cycle() {
        let alarm = AlarmState::new();
        alarm.set_enabled(true);
        let log = Log::default();
        // the first sleep is inside the short chirp
        let mut beeper = beeper(&alarm, &log, Some(1));

        assert_eq!(beeper.step().await, Ok(BeeperPhase::Sounding));
        assert_eq!(beeper.step().await, Ok(BeeperPhase::Silent));
        assert_eq!(*log.borrow(), one_cycle().to_vec());
    }

    #[tokio::test]
    async fn goes_back_to_sleep_and_wakes_again() {
        let alarm = AlarmState::new();
        alarm.set_enabled(true);
        let log = Log::default();
        let mut beeper = beeper(&alarm, &log, Some(4));

        assert_eq!(beeper.step().await, Ok(BeeperPhase::Sounding));
        assert_eq!(beeper.step().await, Ok(BeeperPhase::Silent));

        let (phase, ()) = join(beeper.step(), async {
            for _ in 0..3 {
                yield_now().await;
            }
            alarm.set_enabled(true);
        })
        .await;
        assert_eq!(phase, Ok(BeeperPhase::Sounding));
        assert_eq!(log.borrow().len(), one_cycle().len());
    }

    #[tokio::test]
    async fn actuator_errors_end_the_loop() {
        let alarm = AlarmState::new();
        alarm.set_enabled(true);
        let log = Log::default();
        let mut beeper = BeeperLoop::new(
            &alarm,
            FakeTone {
                log: &log,
                fail_after_starts: Some(3),
            },
            FakeDelay {
                log: &log,
                alarm: &alarm,
                disable_on_sleep: None,
                sleeps: 0,
            },
        );

        assert_eq!(beeper.run().await, Err(Jammed));
        // one and a half cycles made it out before the failure
        assert_eq!(
            log.borrow().iter().filter(|t| matches!(t, Trace::Start(_))).count(),
            3
        );
    }
}
