//! # Network configuration
//! The station settings the firmware is built with. `build.rs` turns
//! `config/network_config.json` into a `NETWORK` constant of this type.
use crate::link::Credentials;

/// Station settings: who to join and which static address to take.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NetworkConfig {
    /// SSID of the access point
    pub ssid: &'static str,
    /// WPA2 passphrase
    pub password: &'static str,
    /// Static IPv4 address
    pub address: [u8; 4],
    /// IPv4 netmask
    pub netmask: [u8; 4],
    /// Default gateway. The controller only talks to its own subnet, so this is usually unset.
    pub gateway: Option<[u8; 4]>,
}

impl NetworkConfig {
    /// Credentials for joining
    #[must_use]
    pub const fn credentials(&self) -> Credentials<'static> {
        Credentials {
            ssid: self.ssid,
            password: self.password,
        }
    }

    /// Prefix length of the netmask, `None` if the mask is not contiguous.
    #[must_use]
    pub const fn prefix_len(&self) -> Option<u8> {
        netmask_to_prefix(self.netmask)
    }
}

/// Turn a dotted netmask into a CIDR prefix length, e.g. `255.255.255.0` into 24.
#[must_use]
pub const fn netmask_to_prefix(mask: [u8; 4]) -> Option<u8> {
    let value = u32::from_be_bytes(mask);
    let ones = value.count_ones();
    let contiguous = match u32::MAX.checked_shl(32 - ones) {
        Some(bits) => bits,
        None => 0,
    };
    // at most 32
    #[allow(clippy::cast_possible_truncation)]
    let prefix = ones as u8;
    if contiguous == value { Some(prefix) } else { None }
}
