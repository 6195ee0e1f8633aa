//! # Faults
//! Everything that ends a run of the controller. There is no local recovery from any of these:
//! the supervisor logs the fault and resets the device.
use core::fmt::{Display, Formatter};

/// Why the network could not be brought up
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectivityError {
    /// The driver refused the join request
    JoinRejected,
    /// The driver reported a failed link while we waited
    LinkFailed,
    /// Still not connected after the given number of status checks
    TimedOut {
        /// Status checks made
        polls: u8,
    },
}

impl Display for ConnectivityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::JoinRejected => f.write_str("join rejected"),
            Self::LinkFailed => f.write_str("link failed"),
            Self::TimedOut { polls } => write!(f, "no link after {polls} status checks"),
        }
    }
}

impl core::error::Error for ConnectivityError {}

/// A condition that requires a device reset
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Fault {
    /// Network bring-up failed
    Connectivity(ConnectivityError),
    /// The speaker could not be driven
    Actuator,
    /// The temperature sensor could not be read
    Sensor,
    /// The status page could not be rendered
    Render,
    /// A background task could not be started
    Spawn,
}

impl From<ConnectivityError> for Fault {
    fn from(error: ConnectivityError) -> Self {
        Self::Connectivity(error)
    }
}

impl Display for Fault {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Connectivity(e) => write!(f, "connectivity: {e}"),
            Self::Actuator => f.write_str("tone actuator failed"),
            Self::Sensor => f.write_str("temperature sensor failed"),
            Self::Render => f.write_str("status page rendering failed"),
            Self::Spawn => f.write_str("task spawn failed"),
        }
    }
}

impl core::error::Error for Fault {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Connectivity(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::error::Error;
    use std::string::ToString;

    #[test]
    fn messages() {
        let fault = Fault::from(ConnectivityError::TimedOut { polls: 10 });
        assert_eq!(fault.to_string(), "connectivity: no link after 10 status checks");
        assert_eq!(Fault::Spawn.to_string(), "task spawn failed");
    }

    #[test]
    fn connectivity_is_the_source() {
        let fault = Fault::Connectivity(ConnectivityError::JoinRejected);
        assert_eq!(fault.source().map(ToString::to_string).as_deref(), Some("join rejected"));
        assert!(Fault::Actuator.source().is_none());
    }
}
