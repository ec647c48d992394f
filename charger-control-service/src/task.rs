//! The control loop: demultiplexes telemetry, the periodic tick and the internal
//! command queue into a serialised stream of events fed to a [`ChargerManager`].

use charger_control_interface::Event;
use embassy_futures::select::{Either4, select4};
use embassy_sync::channel::Channel;
use embassy_time::{Duration, Ticker};
use embedded_services::{info, GlobalRawMutex};

use crate::context::ChargerManager;
use crate::hardware::HardwareIo;
use crate::telemetry::{PowerLock, TelemetrySource};

/// Depth of the internal command queue: a bounded FIFO carrying externally injected
/// events (`Plugin`, `Plugout`, and any other out-of-band event) to the control loop.
pub const COMMAND_QUEUE_DEPTH: usize = 10;

/// The internal command queue type.
pub type CommandQueue = Channel<GlobalRawMutex, Event, COMMAND_QUEUE_DEPTH>;

/// Runs the control loop forever.
///
/// Each iteration waits on four sources at once: the next battery sample, the next
/// skin-temperature sample, the periodic tick (suppressed while
/// [`ChargerManager::polling_active`] is `false`, e.g. during a pump-start handshake),
/// and the next queued command. Whichever resolves first is translated into at most
/// one state-machine event and fed to `manager` before the loop waits again, so events
/// are always processed one at a time.
///
/// Generic over the board's concrete `HardwareIo`/`PowerLock`/`TelemetrySource`
/// implementations; a board crate wraps a monomorphized call to this function in its
/// own `#[embassy_executor::task]`.
pub async fn run<H, P, T>(manager: &mut ChargerManager<H, P>, telemetry: &mut T, commands: &CommandQueue) -> !
where
    H: HardwareIo,
    P: PowerLock,
    T: TelemetrySource,
{
    info!("Starting wireless-charge control loop");
    let mut ticker = Ticker::every(Duration::from_millis(u64::from(manager.polling_interval_ms())));

    loop {
        let tick = async {
            if manager.polling_active {
                ticker.next().await;
            } else {
                core::future::pending::<()>().await;
            }
        };

        match select4(
            telemetry.next_battery_sample(),
            telemetry.next_skin_sample(),
            tick,
            commands.receive(),
        )
        .await
        {
            Either4::First(sample) => {
                if let Some(event) = manager.on_battery_sample(sample) {
                    manager.run_state(Some(event)).await;
                }
            }
            Either4::Second(sample) => {
                if let Some(event) = manager.on_skin_sample(sample) {
                    manager.run_state(Some(event)).await;
                }
            }
            Either4::Third(()) => {
                manager.run_state(Some(Event::Tick)).await;
            }
            Either4::Fourth(event) => {
                manager.run_state(Some(event)).await;
            }
        }
    }
}
