//! # Network
//! Bring-up of the CYW43 radio and the embassy-net stack, and the [`NetworkLink`] adapter the
//! connectivity logic drives.
//!
//! # network configuration
//! `build.rs` generates the `NETWORK` constant from `config/network_config.json`, formatted as
//! follows:
//!```json
//!  {
//!     "ssid": "some_ssid_here",
//!     "password": "some_password_here",
//!     "address": "192.168.4.2",
//!     "netmask": "255.255.255.0"
//! }
//! ```
//! The CYW43 firmware blobs are expected in flash, see the README.

include!(concat!(env!("OUT_DIR"), "/network_config.rs"));

use crate::task::resources::{Irqs, WifiResources};
use cyw43::JoinOptions;
use cyw43_pio::{DEFAULT_CLOCK_DIVIDER, PioSpi};
use defmt::{Debug2Format, info, warn};
use embassy_executor::{SpawnError, Spawner};
use embassy_net::{Config, Ipv4Address, Ipv4Cidr, Stack, StackResources, StaticConfigV4};
use embassy_rp::clocks::RoscRng;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::{DMA_CH0, PIO0};
use embassy_rp::pio::Pio;
use embassy_time::{Duration, with_timeout};
use pico_alarm_buzzer::link::{Credentials, LinkStatus, NetworkLink};
use rand::RngCore;
use static_cell::StaticCell;

/// Prefix length of the configured netmask, checked at compile time
const PREFIX_LEN: u8 = match NETWORK.prefix_len() {
    Some(len) => len,
    None => panic!("netmask in config/network_config.json is not contiguous"),
};

/// How long a single join request may take
const JOIN_TIMEOUT: Duration = Duration::from_secs(10);

/// GPIO of the CYW43 that drives the on-board LED
const LED_GPIO: u8 = 0;

/// Sockets for the stack. The responder needs one, the rest is headroom.
const SOCKET_COUNT: usize = 3;

#[embassy_executor::task]
async fn wifi_task(runner: cyw43::Runner<'static, Output<'static>, PioSpi<'static, PIO0, 0, DMA_CH0>>) -> ! {
    runner.run().await
}

#[embassy_executor::task]
async fn net_task(mut runner: embassy_net::Runner<'static, cyw43::NetDriver<'static>>) -> ! {
    runner.run().await
}

/// Why a join request did not go through
#[derive(Debug, Clone, Copy, defmt::Format)]
pub enum JoinError {
    /// The radio refused, e.g. unknown SSID or wrong passphrase
    Refused,
    /// No answer within `JOIN_TIMEOUT`
    Timeout,
}

/// The radio plus the network stack on top of it
pub struct CywLink {
    /// Radio control
    control: cyw43::Control<'static>,
    /// Network stack handle
    stack: Stack<'static>,
}

impl CywLink {
    /// Network stack handle, for the listener
    pub const fn stack(&self) -> Stack<'static> {
        self.stack
    }

    /// Turn the on-board LED on
    pub async fn show_connected(&mut self) {
        self.control.gpio_set(LED_GPIO, true).await;
    }
}

impl NetworkLink for CywLink {
    type Error = JoinError;

    async fn join(&mut self, credentials: &Credentials<'_>) -> Result<(), JoinError> {
        match with_timeout(
            JOIN_TIMEOUT,
            self.control
                .join(credentials.ssid, JoinOptions::new(credentials.password.as_bytes())),
        )
        .await
        {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                warn!("join refused: {:?}", Debug2Format(&e));
                Err(JoinError::Refused)
            }
            Err(_) => {
                warn!("join timed out after {} s", JOIN_TIMEOUT.as_secs());
                Err(JoinError::Timeout)
            }
        }
    }

    /// The driver has no sticky failure state, a lost association just reads as `Connecting`.
    fn status(&mut self) -> LinkStatus {
        if self.stack.is_link_up() && self.stack.is_config_up() {
            LinkStatus::Connected
        } else {
            LinkStatus::Connecting
        }
    }
}

/// Power up the radio in station mode with power management off, start the network stack with
/// the static address, and spawn the driver tasks. Joining is left to the caller.
pub async fn bring_up(spawner: Spawner, r: WifiResources) -> Result<CywLink, SpawnError> {
    info!("init wifi");
    let pwr = Output::new(r.pwr_pin, Level::Low);
    let cs = Output::new(r.cs_pin, Level::High);
    let mut pio = Pio::new(r.pio_sm, Irqs);
    let spi = PioSpi::new(
        &mut pio.common,
        pio.sm0,
        DEFAULT_CLOCK_DIVIDER,
        pio.irq0,
        cs,
        r.dio_pin,
        r.clk_pin,
        r.dma_ch,
    );

    // SAFETY: the blobs are flashed to these addresses together with the firmware
    let fw = unsafe { core::slice::from_raw_parts(0x1010_0000 as *const u8, 230_321) };
    let clm = unsafe { core::slice::from_raw_parts(0x1014_0000 as *const u8, 4_752) };

    static STATE: StaticCell<cyw43::State> = StaticCell::new();
    let state = STATE.init(cyw43::State::new());
    let (net_device, mut control, runner) = cyw43::new(state, pwr, spi, fw).await;
    spawner.spawn(wifi_task(runner))?;

    info!("init control");
    control.init(clm).await;
    control
        .set_power_management(cyw43::PowerManagementMode::None)
        .await;

    let [a, b, c, d] = NETWORK.address;
    let config = Config::ipv4_static(StaticConfigV4 {
        address: Ipv4Cidr::new(Ipv4Address::new(a, b, c, d), PREFIX_LEN),
        gateway: NETWORK
            .gateway
            .map(|[a, b, c, d]| Ipv4Address::new(a, b, c, d)),
        dns_servers: Default::default(),
    });
    info!("static address {}.{}.{}.{}/{}", a, b, c, d, PREFIX_LEN);

    let seed = RoscRng.next_u64();

    static RESOURCES: StaticCell<StackResources<SOCKET_COUNT>> = StaticCell::new();
    let (stack, runner) = embassy_net::new(
        net_device,
        config,
        RESOURCES.init(StackResources::new()),
        seed,
    );
    spawner.spawn(net_task(runner))?;

    Ok(CywLink { control, stack })
}
