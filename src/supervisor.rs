//! # Supervisor
//! Startup order and the single way a run ends.
//!
//! A run connects to the network, then hands over to the serving phase (responder in the
//! background, beeper in the foreground). Whatever goes wrong, the run ends with a [`Fault`]
//! and the device is reset exactly once. Nothing is retried locally.
use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;
use embedded_hal_async::delay::DelayNs;

use crate::beeper::BeeperLoop;
use crate::fault::Fault;
use crate::link::{Credentials, NetworkLink, connect};
use crate::tone::ToneActuator;

/// Something that can restart the whole device
pub trait DeviceReset {
    /// Reset the device. On hardware this does not return.
    fn reset(&mut self);
}

/// Connect, then run `serve` on the connected link until it reports a fault.
///
/// `serve` is not started if the network cannot be brought up.
pub async fn run_until_fault<L, D, S>(link: &mut L, credentials: &Credentials<'_>, delay: &mut D, serve: S) -> Fault
where
    L: NetworkLink,
    D: DelayNs,
    S: AsyncFnOnce(&mut L) -> Fault,
{
    match connect(link, credentials, delay).await {
        Ok(attempt) => {
            info!("connected after {} status checks, serving", attempt.polls);
            serve(link).await
        }
        Err(e) => Fault::Connectivity(e),
    }
}

/// Run the beeper until it fails or a background task raises a fault.
pub async fn sound_until_fault<M, T, D>(beeper: &mut BeeperLoop<'_, T, D>, faults: &Signal<M, Fault>) -> Fault
where
    M: RawMutex,
    T: ToneActuator,
    D: DelayNs,
{
    match select(beeper.run(), faults.wait()).await {
        Either::First(Ok(never)) => match never {},
        Either::First(Err(_)) => Fault::Actuator,
        Either::Second(fault) => fault,
    }
}

/// Log the fault and reset the device.
pub fn fail_hard<R: DeviceReset>(fault: Fault, reset: &mut R) {
    error!("fatal fault, resetting: {}", fault);
    reset.reset();
}

/// Run until the first fault, then reset exactly once.
///
/// The run borrows the reset device while it lasts, e.g. to keep a watchdog fed. The fault is
/// returned for the case where the reset does return, as it does on the host.
pub async fn run_then_reset<R, F>(reset: &mut R, run: F) -> Fault
where
    R: DeviceReset,
    F: AsyncFnOnce(&mut R) -> Fault,
{
    let fault = run(reset).await;
    fail_hard(fault, reset);
    fault
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::AlarmState;
    use crate::fault::ConnectivityError;
    use crate::link::LinkStatus;
    use core::cell::Cell;
    use embassy_futures::join::join;
    use embassy_futures::yield_now;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

    struct FixedLink(LinkStatus);

    impl NetworkLink for FixedLink {
        type Error = ();

        async fn join(&mut self, _: &Credentials<'_>) -> Result<(), ()> {
            Ok(())
        }

        fn status(&mut self) -> LinkStatus {
            self.0
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        async fn delay_ns(&mut self, _: u32) {
            yield_now().await;
        }
    }

    /// Counts resets instead of performing them
    #[derive(Default)]
    struct CountingReset(usize);

    impl DeviceReset for CountingReset {
        fn reset(&mut self) {
            self.0 += 1;
        }
    }

    struct Quiet;

    impl ToneActuator for Quiet {
        type Error = ();

        fn start(&mut self, _: u32) -> Result<(), ()> {
            Ok(())
        }

        fn stop(&mut self) -> Result<(), ()> {
            Ok(())
        }
    }

    struct Broken;

    impl ToneActuator for Broken {
        type Error = ();

        fn start(&mut self, _: u32) -> Result<(), ()> {
            Err(())
        }

        fn stop(&mut self) -> Result<(), ()> {
            Ok(())
        }
    }

    const CREDENTIALS: Credentials<'static> = Credentials {
        ssid: "alarmnet",
        password: "wrong",
    };

    #[tokio::test]
    async fn no_link_means_no_serving_and_one_reset() {
        let mut link = FixedLink(LinkStatus::Connecting);
        let served = Cell::new(false);
        let mut reset = CountingReset::default();

        let fault = run_then_reset(&mut reset, async |reset: &mut CountingReset| {
            let fault = run_until_fault(&mut link, &CREDENTIALS, &mut NoDelay, async |_: &mut FixedLink| {
                served.set(true);
                Fault::Spawn
            })
            .await;
            assert_eq!(reset.0, 0);
            fault
        })
        .await;

        assert_eq!(fault, Fault::Connectivity(ConnectivityError::TimedOut { polls: 10 }));
        assert!(!served.get());
        assert_eq!(reset.0, 1);
    }

    #[tokio::test]
    async fn serving_fault_resets_once() {
        let mut link = FixedLink(LinkStatus::Connected);
        let mut reset = CountingReset::default();

        let fault = run_then_reset(&mut reset, async |_: &mut CountingReset| {
            run_until_fault(&mut link, &CREDENTIALS, &mut NoDelay, async |_: &mut FixedLink| Fault::Render).await
        })
        .await;

        assert_eq!(fault, Fault::Render);
        assert_eq!(reset.0, 1);
    }

    #[tokio::test]
    async fn serving_fault_ends_the_run() {
        let mut link = FixedLink(LinkStatus::Connected);
        let fault = run_until_fault(&mut link, &CREDENTIALS, &mut NoDelay, async |link: &mut FixedLink| {
            assert_eq!(link.status(), LinkStatus::Connected);
            Fault::Sensor
        })
        .await;
        assert_eq!(fault, Fault::Sensor);
    }

    #[tokio::test]
    async fn background_fault_stops_the_beeper() {
        let alarm = AlarmState::new();
        alarm.set_enabled(true);
        let faults: Signal<CriticalSectionRawMutex, Fault> = Signal::new();
        let mut beeper = BeeperLoop::new(&alarm, Quiet, NoDelay);

        let (fault, ()) = join(sound_until_fault(&mut beeper, &faults), async {
            for _ in 0..5 {
                yield_now().await;
            }
            faults.signal(Fault::Render);
        })
        .await;
        assert_eq!(fault, Fault::Render);
    }

    #[tokio::test]
    async fn silent_beeper_still_sees_faults() {
        let alarm = AlarmState::new();
        let faults: Signal<CriticalSectionRawMutex, Fault> = Signal::new();
        faults.signal(Fault::Sensor);
        let mut beeper = BeeperLoop::new(&alarm, Quiet, NoDelay);

        assert_eq!(sound_until_fault(&mut beeper, &faults).await, Fault::Sensor);
    }

    #[tokio::test]
    async fn actuator_failure_is_a_fault() {
        let alarm = AlarmState::new();
        alarm.set_enabled(true);
        let faults: Signal<CriticalSectionRawMutex, Fault> = Signal::new();
        let mut beeper = BeeperLoop::new(&alarm, Broken, NoDelay);

        assert_eq!(sound_until_fault(&mut beeper, &faults).await, Fault::Actuator);
    }
}
