//! Static configuration: `ChargerDesc` and its construction-time validation.
//!
//! This crate does not parse a configuration file; it defines the parsed *output*
//! shape an external `Config` producer builds once at startup.

use charger_control_interface::ChipIndex;

use crate::algorithm::AlgorithmKind;
use crate::plot::Hysteresis;
use crate::profile::{BatteryDefaultParameter, ProfileRow, ProfileTable, TempVTerm, MAX_PROFILE_TABLES};

/// Maximum configured charger chips.
pub const MAX_CHIPS: usize = 4;

/// Configuration errors detected once, at [`ChargerDesc::validate`] time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// `profile_tables` is empty; no charging decision could ever be made.
    EmptyProfileTables,
    /// `temp_vterm`'s bands are not contiguous and non-overlapping.
    NonContiguousVterm,
}

/// The parsed static configuration for the control service.
///
/// Built once at startup and immutable for the run.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChargerDesc {
    /// Interval between periodic ticks, in milliseconds.
    pub polling_interval_ms: u32,
    /// State of charge, in percent, that counts as "full".
    pub fullbatt_capacity: u8,
    /// Current, in milliamps, below which the battery counts as "full".
    pub fullbatt_current: i16,
    /// Minimum residency in `FULL` before re-enabling the adapter, in milliseconds.
    pub fullbatt_duration_ms: u32,
    /// Residency in `FAULT` before retrying `CHG`, in milliseconds.
    pub fault_duration_ms: u32,
    /// Battery low-temperature lockout threshold, deci-degrees Celsius.
    pub battery_temp_min: i16,
    /// Battery low-temperature recovery threshold, deci-degrees Celsius.
    pub battery_temp_min_r: i16,
    /// Battery high-temperature lockout threshold, deci-degrees Celsius.
    pub battery_temp_max: i16,
    /// Battery high-temperature recovery threshold, deci-degrees Celsius.
    pub battery_temp_max_r: i16,
    /// Skin low-temperature lockout threshold, deci-degrees Celsius.
    pub skin_temp_min: i32,
    /// Skin low-temperature recovery threshold, deci-degrees Celsius.
    pub skin_temp_min_r: i32,
    /// Skin high-temperature lockout threshold, deci-degrees Celsius.
    pub skin_temp_max: i32,
    /// Skin high-temperature recovery threshold, deci-degrees Celsius.
    pub skin_temp_max_r: i32,
    /// Profile-row / termination-voltage-band selection hysteresis.
    pub hysteresis: Hysteresis,
    /// Charging-curve lookup tables, scoped by adapter-type mask.
    pub profile_tables: heapless::Vec<ProfileTable, MAX_PROFILE_TABLES>,
    /// The fault-state charging profile row.
    pub fault: ProfileRow,
    /// Which algorithm kind drives each configured chip.
    pub chip_algorithms: heapless::Vec<(ChipIndex, AlgorithmKind), MAX_CHIPS>,
    /// Whether a programmable wireless-RX supply exists.
    pub has_supply: bool,
    /// Delay enforced by `enable_adapter(true)`, in milliseconds.
    pub enable_delay_ms: u32,
    /// Temperature-indexed termination-voltage table.
    pub temp_vterm: TempVTerm,
    /// Fallback battery readings when the fuel gauge reports `online = false`.
    pub battery_default_param: BatteryDefaultParameter,
}

impl ChargerDesc {
    /// Checks structural invariants that must hold before the manager starts.
    ///
    /// Checked once at construction; never re-checked at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.profile_tables.is_empty() {
            return Err(ConfigError::EmptyProfileTables);
        }
        if self.temp_vterm.enabled {
            for pair in self.temp_vterm.bands.windows(2) {
                let [lo, hi] = pair else { continue };
                if hi.low != lo.high + 1 {
                    return Err(ConfigError::NonContiguousVterm);
                }
            }
        }
        Ok(())
    }

    /// The algorithm kind configured for `chip`, if any.
    pub fn algorithm_for(&self, chip: ChipIndex) -> Option<AlgorithmKind> {
        self.chip_algorithms
            .iter()
            .find(|(c, _)| *c == chip)
            .map(|(_, kind)| *kind)
    }

    /// All configured chips other than `chip`, for the mutual-exclusion guarantee in
    /// `enable_charger`.
    pub fn other_chips(&self, chip: ChipIndex) -> impl Iterator<Item = ChipIndex> + '_ {
        self.chip_algorithms.iter().map(|(c, _)| *c).filter(move |c| *c != chip)
    }
}
