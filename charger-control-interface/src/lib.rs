//! Wire types shared between the wireless-charge control service and the
//! hardware/telemetry capabilities it is driven by.
//!
//! None of these types carry behavior beyond simple conversions; the control
//! logic that interprets them lives in `charger-control-service`.

#![no_std]

/// A battery telemetry sample, as delivered by the fuel-gauge telemetry source.
///
/// Invariants (enforced by the telemetry producer, not by this type): `temperature_dc`
/// is in deci-degrees Celsius, `voltage_mv` is a positive integer no greater than 5000,
/// and `capacity_pct` is in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BatterySample {
    /// Battery voltage, in millivolts.
    pub voltage_mv: u16,
    /// Battery current, in milliamps. Positive current flows into the battery.
    pub current_ma: i16,
    /// Battery temperature, in deci-degrees Celsius.
    pub temperature_dc: i16,
    /// State of charge, as a percentage in `0..=100`.
    pub capacity_pct: u8,
    /// Whether the fuel gauge is reporting live data (`false` means the gauge is
    /// offline and `HardwareIo` should fall back to the configured default values).
    pub online: bool,
}

/// A skin-temperature telemetry sample, as delivered by the thermal telemetry source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SkinSample {
    /// Skin temperature, in deci-degrees Celsius.
    pub skin_temp_dc: i32,
}

/// Detected wireless charging protocol, as an opaque small integer code.
///
/// Which [`super::ChipIndex`]/current/voltage a given `AdapterType` maps to is entirely
/// data-driven (see `ProfileTable`'s mask field in `charger-control-service`) rather than
/// hardcoded here; this type only carries the raw detected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdapterType(pub u8);

impl AdapterType {
    /// Returns the bit this adapter type occupies in a `ProfileTable` mask.
    pub const fn mask_bit(self) -> u32 {
        1u32 << (self.0 & 31)
    }
}

/// Identifies a charging chip, or the absence of one.
///
/// Mirrors the original table encoding where `-1` in a profile row means "do not charge
/// in this cell" rather than a real chip index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChipIndex(pub i8);

impl ChipIndex {
    /// Sentinel value meaning "no chip" / "do not charge in this cell".
    pub const NONE: ChipIndex = ChipIndex(-1);

    /// Whether this is the "no chip" sentinel.
    pub const fn is_none(self) -> bool {
        self.0 < 0
    }

    /// Returns the chip index as a plain array index, if this isn't the "no chip" sentinel.
    pub const fn index(self) -> Option<usize> {
        if self.is_none() { None } else { Some(self.0 as usize) }
    }
}

bitflags::bitflags! {
    /// Charger status register bits, as read back by `HardwareIo::get_charger_state`.
    ///
    /// Bit positions are a fixed external contract (see the external interfaces section
    /// of the specification this service implements).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct ChargerStatus: u32 {
        /// Battery over-voltage.
        const VBAT_OVP = 1 << 0;
        /// Battery over-current.
        const IBAT_OCP = 1 << 1;
        /// Supply over-voltage.
        const VBUS_OVP = 1 << 2;
        /// Supply over-current.
        const IBUS_OCP = 1 << 3;
        /// Supply under-current.
        const IBUS_UCP = 1 << 4;
        /// Adapter presence latch.
        const ADAPTER_INSERT = 1 << 5;
        /// Battery presence latch.
        const VBAT_INSERT = 1 << 6;
        /// Telemetry conversion complete.
        const ADC_DONE = 1 << 7;
        /// Supply below the pump's regulation window.
        const VBUS_ERRORLO = 1 << 8;
        /// Supply above the pump's regulation window.
        const VBUS_ERRORHI = 1 << 9;
        /// Pump is switching.
        const CP_SWITCHING = 1 << 10;
        /// Charger enable status.
        const CHG_EN = 1 << 11;
    }
}

impl ChargerStatus {
    /// Either over-voltage-protection bit (battery or supply) is set.
    pub const fn is_ovp(self) -> bool {
        self.intersects(ChargerStatus::VBAT_OVP.union(ChargerStatus::VBUS_OVP))
    }

    /// Either vbus-error bit (too low or too high) is set.
    pub const fn is_vbus_error(self) -> bool {
        self.intersects(ChargerStatus::VBUS_ERRORLO.union(ChargerStatus::VBUS_ERRORHI))
    }
}

/// Control-state-machine input events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// A wireless adapter was detected.
    Plugin,
    /// The wireless adapter was removed.
    Plugout,
    /// Periodic polling tick.
    Tick,
    /// A thermal lockout condition just latched.
    OverTemp,
    /// The thermal lockout condition just cleared.
    OverTempRecovery,
}
