//! Charge pump: a voltage-ramp handshake, dead-band regulation and shutdown.

use charger_control_interface::{ChargerStatus, ChipIndex};
use embassy_time::{Duration, Timer};

use crate::algorithm::AlgorithmError;
use crate::hardware::HardwareIo;
use crate::profile::ProfileRow;

/// Maximum wireless-RX supply voltage, in millivolts.
pub const VOUT_MAX: i32 = 9100;
/// Supply voltage a caller may use as a power-up default before the pump ever runs.
pub const VOUT_DEFAULT: u16 = 5500;
/// Nominal working battery voltage the original ramp formula was tuned against.
pub const VOL_WORK_START: i32 = 3650;
/// Fixed offset added to the voltage-ratio term of the ramp target.
pub const VOUT_OFFSET: i32 = 578;
/// Numerator of the 1.91 battery-to-supply voltage ratio.
const VOUT_RATIO_NUM: i32 = 191;
/// Denominator of the 1.91 battery-to-supply voltage ratio.
const VOUT_RATIO_DEN: i32 = 100;
/// Regulation step when dropping supply voltage (mV).
pub const VOUT_STEP_DEC: u16 = 100;
/// Regulation step when raising supply voltage (mV).
pub const VOUT_STEP_INC: u16 = 25;
/// Current dead-band used to decide whether to drop supply voltage (mA).
pub const COUT_STEP_DEC: i16 = 100;
/// Current dead-band used to decide whether to raise supply voltage (mA).
pub const COUT_STEP_INC: i16 = 25;
/// Ramp starting point, in millivolts.
pub const STARTUP_VOLTAGE: i32 = 300;
/// Per-step increment added to the ramp starting point, in millivolts.
pub const STARTUP_VOLTAGE_OFFSET: i32 = 25;
/// Battery voltage below which the pump is considered locked in the "pump up" direction.
pub const VOL_PUMP_UP_LOCKED: u16 = 3450;
/// Battery voltage above which the pump is considered locked in the "pump down" direction.
pub const VOL_PUMP_DOWN_LOCKED: u16 = 3850;

/// Defensive bound on the ramp loop. `300 + 25*64 = 1900`, well inside the natural
/// `rx_target > 9100` cutoff for any realistic battery voltage, so this never changes
/// behavior for a reachable input; it only bounds worst-case loop iterations on this
/// `no_std` port.
pub const PUMP_MAX_RAMP_STEPS: u32 = 64;

/// The charge-pump algorithm.
#[derive(Debug, Clone, Copy)]
pub struct PumpAlgorithm {
    chip: ChipIndex,
    last_row: Option<ProfileRow>,
}

impl PumpAlgorithm {
    /// Creates a pump algorithm driving the given chip.
    pub const fn new(chip: ChipIndex) -> Self {
        Self { chip, last_row: None }
    }

    /// The chip this algorithm drives.
    pub const fn chip(&self) -> ChipIndex {
        self.chip
    }

    /// The most recently applied row, if any.
    pub const fn last_row(&self) -> Option<ProfileRow> {
        self.last_row
    }

    /// Runs the voltage-ramp handshake: pushes the supply voltage up step by step until
    /// the pump's `VBUS_ERROR*` bits clear, then enables the pump and verifies `CHG_EN`.
    pub async fn start<H: HardwareIo>(&mut self, hw: &mut H) -> Result<(), AlgorithmError> {
        let battery_voltage = i32::from(hw.get_battery_voltage().await?);
        let battery_current = i32::from(hw.get_battery_current().await?);
        let vbase = battery_voltage - battery_current / 4;

        for k in 0..PUMP_MAX_RAMP_STEPS {
            let rx_target =
                vbase * VOUT_RATIO_NUM / VOUT_RATIO_DEN + VOUT_OFFSET + STARTUP_VOLTAGE + STARTUP_VOLTAGE_OFFSET * k as i32;
            if rx_target > VOUT_MAX {
                return Err(AlgorithmError::StartFailure);
            }

            let rx_target_mv = rx_target.clamp(0, u16::MAX as i32) as u16;
            hw.set_supply_voltage(rx_target_mv).await?;
            Timer::after(Duration::from_millis(100)).await;

            let status = hw.get_charger_state(self.chip).await?;
            if !status.is_vbus_error() {
                hw.enable_charger(self.chip, true).await?;
                Timer::after(Duration::from_millis(500)).await;

                let status = hw.get_charger_state(self.chip).await?;
                if status.contains(ChargerStatus::CHG_EN) && !status.is_ovp() {
                    self.last_row = None;
                    return Ok(());
                }
                hw.enable_charger(self.chip, false).await?;
                return Err(AlgorithmError::StartFailure);
            }
        }

        Err(AlgorithmError::StartFailure)
    }

    /// Verifies the pump is still healthy, applies a changed row's current target, or
    /// nudges the supply voltage to keep the measured current inside `row`'s dead-band.
    pub async fn update<H: HardwareIo>(&mut self, hw: &mut H, row: &ProfileRow) -> Result<(), AlgorithmError> {
        let status = hw.get_charger_state(self.chip).await?;
        if !status.contains(ChargerStatus::CHG_EN) || status.is_ovp() {
            return Err(AlgorithmError::Fault);
        }

        if self.last_row.as_ref() != Some(row) {
            hw.set_charger_current(self.chip, row.work_current_ma).await?;
            self.last_row = Some(*row);
            return Ok(());
        }

        let current = hw.get_battery_current().await?;
        let supply = hw.get_supply_voltage().await?;
        let target = row.work_current_ma as i16;

        if current < target.saturating_sub(COUT_STEP_DEC) {
            let bumped = (u32::from(supply) + u32::from(VOUT_STEP_INC)).min(VOUT_MAX as u32) as u16;
            hw.set_supply_voltage(bumped).await?;
        } else if current > target.saturating_add(COUT_STEP_INC) {
            let dropped = supply.saturating_sub(VOUT_STEP_DEC);
            hw.set_supply_voltage(dropped).await?;
        }

        Ok(())
    }

    /// Disables the pump and resets the supply voltage to the ramp's starting point.
    pub async fn stop<H: HardwareIo>(&mut self, hw: &mut H) -> Result<(), AlgorithmError> {
        hw.enable_charger(self.chip, false).await?;
        hw.set_supply_voltage(STARTUP_VOLTAGE as u16).await?;
        self.last_row = None;
        Ok(())
    }
}
