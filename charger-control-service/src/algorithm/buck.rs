//! Linear buck converter: on/off plus a constant-current target.

use charger_control_interface::ChipIndex;

use crate::algorithm::AlgorithmError;
use crate::hardware::HardwareIo;
use crate::profile::ProfileRow;

/// Supply voltage the buck algorithm drives the wireless-RX output to while active.
pub const BUCK_SUPPLY_MV: u16 = 3000;

/// The linear buck converter algorithm.
#[derive(Debug, Clone, Copy)]
pub struct BuckAlgorithm {
    chip: ChipIndex,
    last_row: Option<ProfileRow>,
}

impl BuckAlgorithm {
    /// Creates a buck algorithm driving the given chip.
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

    /// Starts the buck: sets the default supply voltage (if a programmable supply
    /// exists), then enables the chip. Clears the cached row.
    pub async fn start<H: HardwareIo>(&mut self, hw: &mut H, has_supply: bool) -> Result<(), AlgorithmError> {
        if has_supply {
            hw.set_supply_voltage(BUCK_SUPPLY_MV).await?;
        }
        hw.enable_charger(self.chip, true).await?;
        self.last_row = None;
        Ok(())
    }

    /// Applies `row` if it differs from the cached row: sets the current target and,
    /// if `row` names a non-zero supply voltage and a programmable supply exists, sets it.
    pub async fn update<H: HardwareIo>(
        &mut self,
        hw: &mut H,
        row: &ProfileRow,
        has_supply: bool,
    ) -> Result<(), AlgorithmError> {
        if self.last_row.as_ref() == Some(row) {
            return Ok(());
        }
        hw.set_charger_current(self.chip, row.work_current_ma).await?;
        if row.supply_voltage_mv > 0 && has_supply {
            hw.set_supply_voltage(row.supply_voltage_mv).await?;
        }
        self.last_row = Some(*row);
        Ok(())
    }

    /// Disables the chip and, if a programmable supply exists, resets it to the default.
    pub async fn stop<H: HardwareIo>(&mut self, hw: &mut H, has_supply: bool) -> Result<(), AlgorithmError> {
        hw.enable_charger(self.chip, false).await?;
        if has_supply {
            hw.set_supply_voltage(BUCK_SUPPLY_MV).await?;
        }
        self.last_row = None;
        Ok(())
    }
}
