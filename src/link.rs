//! # Connectivity
//! Joining the configured access point and waiting for the link to come up.
//!
//! The radio driver sits behind [`NetworkLink`]. Once the join has been issued the status is
//! polled once a second, ten times at most, and checked one last time after the final wait.
//! There are no retries here: a failed attempt is a fault and the device restarts.
#![allow(async_fn_in_trait)]

use embedded_hal_async::delay::DelayNs;

use crate::fault::ConnectivityError;

/// How often the link status is checked before giving up
pub const MAX_STATUS_POLLS: u8 = 10;

/// Time between two status checks
pub const POLL_INTERVAL_MS: u32 = 1_000;

/// Network name and passphrase
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Credentials<'a> {
    /// SSID of the access point
    pub ssid: &'a str,
    /// WPA2 passphrase
    pub password: &'a str,
}

/// Link state as reported by the driver
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkStatus {
    /// Association or address configuration still in progress
    Connecting,
    /// Associated and the static address is up
    Connected,
    /// The driver gave up, e.g. on a wrong passphrase
    Failed,
}

/// A wireless interface that can join a network.
pub trait NetworkLink {
    /// Error raised when the join request itself is refused
    type Error;

    /// Start joining. Returning `Ok` does not mean the link is usable yet.
    async fn join(&mut self, credentials: &Credentials<'_>) -> Result<(), Self::Error>;

    /// Current state of the link
    fn status(&mut self) -> LinkStatus;
}

/// A successful connection attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectionAttempt {
    /// Status checks it took, 1 if the link was already up after the join. At most
    /// `MAX_STATUS_POLLS + 1`, counting the last check after the final wait.
    pub polls: u8,
}

/// Join the network and wait until the link is up.
///
/// # Errors
/// - [`ConnectivityError::JoinRejected`] if the driver refused the join
/// - [`ConnectivityError::LinkFailed`] if the driver reported failure while waiting
/// - [`ConnectivityError::TimedOut`] if the link was not up after [`MAX_STATUS_POLLS`] checks
pub async fn connect<L, D>(
    link: &mut L,
    credentials: &Credentials<'_>,
    delay: &mut D,
) -> Result<ConnectionAttempt, ConnectivityError>
where
    L: NetworkLink,
    D: DelayNs,
{
    info!("joining {}", credentials.ssid);
    if link.join(credentials).await.is_err() {
        error!("join rejected");
        return Err(ConnectivityError::JoinRejected);
    }

    for poll in 1..=MAX_STATUS_POLLS {
        match link.status() {
            LinkStatus::Connected => {
                info!("link up after {} status checks", poll);
                return Ok(ConnectionAttempt { polls: poll });
            }
            LinkStatus::Failed => {
                error!("link failed");
                return Err(ConnectivityError::LinkFailed);
            }
            LinkStatus::Connecting => {
                debug!("waiting for connection ({}/{})", poll, MAX_STATUS_POLLS);
                delay.delay_ms(POLL_INTERVAL_MS).await;
            }
        }
    }

    match link.status() {
        LinkStatus::Connected => {
            info!("link up on the last status check");
            Ok(ConnectionAttempt {
                polls: MAX_STATUS_POLLS + 1,
            })
        }
        LinkStatus::Failed => {
            error!("link failed");
            Err(ConnectivityError::LinkFailed)
        }
        LinkStatus::Connecting => {
            error!("no link after {} status checks", MAX_STATUS_POLLS);
            Err(ConnectivityError::TimedOut {
                polls: MAX_STATUS_POLLS,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    /// Reports `Connecting` for a number of checks, then a final status.
    struct ScriptedLink {
        join_ok: bool,
        connecting_for: usize,
        then: LinkStatus,
        checks: usize,
        joined: bool,
    }

    impl ScriptedLink {
        fn new(connecting_for: usize, then: LinkStatus) -> Self {
            Self {
                join_ok: true,
                connecting_for,
                then,
                checks: 0,
                joined: false,
            }
        }
    }

    impl NetworkLink for ScriptedLink {
        type Error = ();

        async fn join(&mut self, credentials: &Credentials<'_>) -> Result<(), ()> {
            if !self.join_ok {
                return Err(());
            }
            assert_eq!(*credentials, CREDENTIALS);
            self.joined = true;
            Ok(())
        }

        fn status(&mut self) -> LinkStatus {
            self.checks += 1;
            if self.checks > self.connecting_for {
                self.then
            } else {
                LinkStatus::Connecting
            }
        }
    }

    #[derive(Default)]
    struct CountingDelay {
        waits: Vec<u32>,
    }

    impl DelayNs for CountingDelay {
        async fn delay_ns(&mut self, ns: u32) {
            self.waits.push(ns / 1_000_000);
        }

        async fn delay_ms(&mut self, ms: u32) {
            self.waits.push(ms);
        }
    }

    const CREDENTIALS: Credentials<'static> = Credentials {
        ssid: "alarmnet",
        password: "hunter22",
    };

    #[tokio::test]
    async fn connects_while_polling() {
        let mut link = ScriptedLink::new(3, LinkStatus::Connected);
        let mut delay = CountingDelay::default();

        let attempt = connect(&mut link, &CREDENTIALS, &mut delay).await;
        assert_eq!(attempt, Ok(ConnectionAttempt { polls: 4 }));
        assert!(link.joined);
        assert_eq!(delay.waits, [POLL_INTERVAL_MS; 3]);
    }

    #[tokio::test]
    async fn already_up_after_join() {
        let mut link = ScriptedLink::new(0, LinkStatus::Connected);
        let mut delay = CountingDelay::default();

        let attempt = connect(&mut link, &CREDENTIALS, &mut delay).await;
        assert_eq!(attempt, Ok(ConnectionAttempt { polls: 1 }));
        assert!(delay.waits.is_empty());
    }

    #[tokio::test]
    async fn last_poll_still_counts() {
        let mut link = ScriptedLink::new(usize::from(MAX_STATUS_POLLS) - 1, LinkStatus::Connected);
        let mut delay = CountingDelay::default();

        let attempt = connect(&mut link, &CREDENTIALS, &mut delay).await;
        assert_eq!(
            attempt,
            Ok(ConnectionAttempt {
                polls: MAX_STATUS_POLLS
            })
        );
    }

    #[tokio::test]
    async fn up_on_the_last_check() {
        let mut link = ScriptedLink::new(usize::from(MAX_STATUS_POLLS), LinkStatus::Connected);
        let mut delay = CountingDelay::default();

        let attempt = connect(&mut link, &CREDENTIALS, &mut delay).await;
        assert_eq!(attempt, Ok(ConnectionAttempt { polls: 11 }));
        assert_eq!(delay.waits.len(), 10);
    }

    #[tokio::test]
    async fn gives_up_after_ten_seconds() {
        let mut link = ScriptedLink::new(usize::MAX, LinkStatus::Connected);
        let mut delay = CountingDelay::default();

        let attempt = connect(&mut link, &CREDENTIALS, &mut delay).await;
        assert_eq!(attempt, Err(ConnectivityError::TimedOut { polls: 10 }));
        assert_eq!(link.checks, 11);
        assert_eq!(delay.waits.iter().sum::<u32>(), 10_000);
    }

    #[tokio::test]
    async fn driver_failure_stops_polling() {
        let mut link = ScriptedLink::new(2, LinkStatus::Failed);
        let mut delay = CountingDelay::default();

        let attempt = connect(&mut link, &CREDENTIALS, &mut delay).await;
        assert_eq!(attempt, Err(ConnectivityError::LinkFailed));
        assert_eq!(link.checks, 3);
    }

    #[tokio::test]
    async fn rejected_join_never_polls() {
        let mut link = ScriptedLink::new(0, LinkStatus::Connected);
        link.join_ok = false;
        let mut delay = CountingDelay::default();

        let attempt = connect(&mut link, &CREDENTIALS, &mut delay).await;
        assert_eq!(attempt, Err(ConnectivityError::JoinRejected));
        assert_eq!(link.checks, 0);
        assert!(delay.waits.is_empty());
    }
}
