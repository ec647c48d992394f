//! Capability trait for the charging hardware: wireless-RX adapter, buck/pump
//! chargers and the fuel gauge.
//!
//! No concrete driver lives in this crate. A board support crate implements
//! `HardwareIo` against its own I2C/GPIO peripherals; `ChargerManager` only
//! ever talks to the trait.

use charger_control_interface::{AdapterType, ChargerStatus, ChipIndex};

/// Error categories surfaced by a `HardwareIo` call.
///
/// Every concrete `HardwareIo::Error` converts into one of these via `Into`, so the
/// control core never needs to know about a driver's own error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HardwareError {
    /// An I/O call to a device returned a transport-level failure.
    Io,
    /// `get_adapter_type` failed to identify the connected protocol.
    ProtocolDiscovery,
}

/// Capability to drive the wireless-RX adapter, the configured charger chips and the
/// fuel gauge.
///
/// Every method reports either success or a categorised failure; retry policy is the
/// caller's decision, never this trait's.
pub trait HardwareIo {
    /// The driver's native error type.
    type Error: Into<HardwareError> + Copy;

    /// Enables or disables the wireless-RX adapter.
    ///
    /// If `on` is `true` and the configured enable delay is non-zero, the call does not
    /// return until that delay has elapsed.
    async fn enable_adapter(&mut self, on: bool) -> Result<(), Self::Error>;

    /// Reads the detected wireless charging protocol.
    async fn get_adapter_type(&mut self) -> Result<AdapterType, Self::Error>;

    /// Sets the wireless-RX output voltage, in millivolts.
    async fn set_supply_voltage(&mut self, mv: u16) -> Result<(), Self::Error>;

    /// Reads the wireless-RX output voltage, in millivolts.
    async fn get_supply_voltage(&mut self) -> Result<u16, Self::Error>;

    /// Enables or disables a charger chip.
    ///
    /// Callers enforce mutual exclusion (only one chip enabled at a time); this method
    /// itself does not serialize against other chips.
    async fn enable_charger(&mut self, chip: ChipIndex, on: bool) -> Result<(), Self::Error>;

    /// Sets a charger chip's constant-current target, in milliamps.
    async fn set_charger_current(&mut self, chip: ChipIndex, ma: u16) -> Result<(), Self::Error>;

    /// Sets a charger chip's termination voltage, in millivolts.
    async fn set_charger_voltage(&mut self, chip: ChipIndex, mv: u16) -> Result<(), Self::Error>;

    /// Reads a charger chip's status register.
    async fn get_charger_state(&mut self, chip: ChipIndex) -> Result<ChargerStatus, Self::Error>;

    /// Reads the fuel gauge's battery voltage, in millivolts.
    async fn get_battery_voltage(&mut self) -> Result<u16, Self::Error>;

    /// Reads the fuel gauge's battery current, in milliamps. Positive means into the battery.
    async fn get_battery_current(&mut self) -> Result<i16, Self::Error>;

    /// Reads the fuel gauge's battery temperature, in deci-degrees Celsius.
    async fn get_battery_temperature(&mut self) -> Result<i16, Self::Error>;

    /// Reads the fuel gauge's state of charge, as a percentage.
    async fn get_battery_capacity(&mut self) -> Result<u8, Self::Error>;

    /// Reads whether the fuel gauge is currently reporting live data.
    async fn get_battery_online(&mut self) -> Result<bool, Self::Error>;

    /// Informs the fuel gauge whether VBUS is present.
    async fn set_battery_vbus_state(&mut self, on: bool) -> Result<(), Self::Error>;
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// In-memory `HardwareIo` double used across this crate's unit tests.
    #[derive(Debug, Clone)]
    pub(crate) struct MockHardware {
        pub adapter_on: bool,
        pub adapter_type: AdapterType,
        pub protocol_fails: bool,
        pub supply_voltage_mv: u16,
        pub enabled_chip: Option<ChipIndex>,
        pub status: ChargerStatus,
        pub battery_voltage_mv: u16,
        pub battery_current_ma: i16,
        pub battery_temperature_dc: i16,
        pub battery_capacity_pct: u8,
        pub battery_online: bool,
        pub set_current_calls: heapless::Vec<u16, 32>,
        pub set_voltage_calls: heapless::Vec<u16, 32>,
        pub set_charger_voltage_calls: heapless::Vec<u16, 32>,
        pub enable_calls: heapless::Vec<(i8, bool), 32>,
    }

    impl Default for MockHardware {
        fn default() -> Self {
            Self {
                adapter_on: false,
                adapter_type: AdapterType(0),
                protocol_fails: false,
                supply_voltage_mv: 0,
                enabled_chip: None,
                status: ChargerStatus::empty(),
                battery_voltage_mv: 3700,
                battery_current_ma: 0,
                battery_temperature_dc: 250,
                battery_capacity_pct: 50,
                battery_online: true,
                set_current_calls: heapless::Vec::new(),
                set_voltage_calls: heapless::Vec::new(),
                set_charger_voltage_calls: heapless::Vec::new(),
                enable_calls: heapless::Vec::new(),
            }
        }
    }

    impl HardwareIo for MockHardware {
        type Error = HardwareError;

        async fn enable_adapter(&mut self, on: bool) -> Result<(), Self::Error> {
            self.adapter_on = on;
            Ok(())
        }

        async fn get_adapter_type(&mut self) -> Result<AdapterType, Self::Error> {
            if self.protocol_fails {
                Err(HardwareError::ProtocolDiscovery)
            } else {
                Ok(self.adapter_type)
            }
        }

        async fn set_supply_voltage(&mut self, mv: u16) -> Result<(), Self::Error> {
            self.supply_voltage_mv = mv;
            let _ = self.set_voltage_calls.push(mv);
            Ok(())
        }

        async fn get_supply_voltage(&mut self) -> Result<u16, Self::Error> {
            Ok(self.supply_voltage_mv)
        }

        async fn enable_charger(&mut self, chip: ChipIndex, on: bool) -> Result<(), Self::Error> {
            self.enabled_chip = if on { Some(chip) } else { None };
            let _ = self.enable_calls.push((chip.0, on));
            Ok(())
        }

        async fn set_charger_current(&mut self, _chip: ChipIndex, ma: u16) -> Result<(), Self::Error> {
            let _ = self.set_current_calls.push(ma);
            Ok(())
        }

        async fn set_charger_voltage(&mut self, _chip: ChipIndex, mv: u16) -> Result<(), Self::Error> {
            let _ = self.set_charger_voltage_calls.push(mv);
            Ok(())
        }

        async fn get_charger_state(&mut self, _chip: ChipIndex) -> Result<ChargerStatus, Self::Error> {
            Ok(self.status)
        }

        async fn get_battery_voltage(&mut self) -> Result<u16, Self::Error> {
            Ok(self.battery_voltage_mv)
        }

        async fn get_battery_current(&mut self) -> Result<i16, Self::Error> {
            Ok(self.battery_current_ma)
        }

        async fn get_battery_temperature(&mut self) -> Result<i16, Self::Error> {
            Ok(self.battery_temperature_dc)
        }

        async fn get_battery_capacity(&mut self) -> Result<u8, Self::Error> {
            Ok(self.battery_capacity_pct)
        }

        async fn get_battery_online(&mut self) -> Result<bool, Self::Error> {
            Ok(self.battery_online)
        }

        async fn set_battery_vbus_state(&mut self, _on: bool) -> Result<(), Self::Error> {
            Ok(())
        }
    }
}
