//! # Supervisor
//! One run of the controller: bring up the network, start the HTTP server, then sound the alarm
//! in the foreground until something fails.
use crate::task::http_server::http_server;
use crate::task::network::{self, CywLink, NETWORK};
use crate::task::resources::{SensorResources, SpeakerResources, WifiResources};
use crate::task::sound::PwmTone;
use crate::task::task_messages::{ALARM_STATE, FAULT_SIGNAL};
use crate::task::temperature::OnboardTemperature;
use defmt::{error, info};
use embassy_executor::Spawner;
use embassy_time::Delay;
use pico_alarm_buzzer::beeper::BeeperLoop;
use pico_alarm_buzzer::fault::Fault;
use pico_alarm_buzzer::supervisor::{run_until_fault, sound_until_fault};

/// Run until the first fault and return it.
pub async fn supervise(
    spawner: Spawner,
    wifi: WifiResources,
    speaker: SpeakerResources,
    sensor: SensorResources,
) -> Fault {
    let mut link = match network::bring_up(spawner, wifi).await {
        Ok(link) => link,
        Err(e) => {
            error!("could not start the network tasks: {:?}", e);
            return Fault::Spawn;
        }
    };

    run_until_fault(
        &mut link,
        &NETWORK.credentials(),
        &mut Delay,
        async move |link: &mut CywLink| {
            link.show_connected().await;

            if let Err(e) = spawner.spawn(http_server(link.stack(), OnboardTemperature::new(sensor))) {
                error!("could not start the HTTP server: {:?}", e);
                return Fault::Spawn;
            }

            info!("alarm is off until switched on over HTTP");
            let mut beeper = BeeperLoop::new(&ALARM_STATE, PwmTone::new(speaker), Delay);
            sound_until_fault(&mut beeper, &FAULT_SIGNAL).await
        },
    )
    .await
}
