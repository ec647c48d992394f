//! End-to-end scenarios driving `ChargerManager` through a mock `HardwareIo`
//! and `PowerLock`, covering the control loop's major state transitions.

#![allow(clippy::unwrap_used)]

use charger_control_service::{
    AdapterType, BatteryDefaultParameter, BatterySample, ChargerDesc, ChargerManager, ChargerStatus, ChipIndex,
    ControlState, Event, HardwareError, HardwareIo, Hysteresis, PowerLock, ProfileRow, ProfileTable, SkinSample,
    TempVTerm,
};

#[derive(Debug, Clone)]
struct MockHardware {
    adapter_on: bool,
    adapter_type: AdapterType,
    adapter_type_fails: bool,
    supply_voltage_mv: u16,
    enabled_chip: Option<ChipIndex>,
    status: ChargerStatus,
    battery_voltage_mv: u16,
    battery_current_ma: i16,
    battery_temperature_dc: i16,
    battery_capacity_pct: u8,
    battery_online: bool,
}

impl Default for MockHardware {
    fn default() -> Self {
        Self {
            adapter_on: false,
            adapter_type: AdapterType(0),
            adapter_type_fails: false,
            supply_voltage_mv: 0,
            enabled_chip: None,
            status: ChargerStatus::empty(),
            battery_voltage_mv: 3700,
            battery_current_ma: 0,
            battery_temperature_dc: 250,
            battery_capacity_pct: 50,
            battery_online: true,
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
        if self.adapter_type_fails {
            Err(HardwareError::ProtocolDiscovery)
        } else {
            Ok(self.adapter_type)
        }
    }

    async fn set_supply_voltage(&mut self, mv: u16) -> Result<(), Self::Error> {
        self.supply_voltage_mv = mv;
        Ok(())
    }

    async fn get_supply_voltage(&mut self) -> Result<u16, Self::Error> {
        Ok(self.supply_voltage_mv)
    }

    async fn enable_charger(&mut self, chip: ChipIndex, on: bool) -> Result<(), Self::Error> {
        self.enabled_chip = if on { Some(chip) } else { None };
        if on {
            self.status |= ChargerStatus::CHG_EN;
        } else {
            self.status.remove(ChargerStatus::CHG_EN);
        }
        Ok(())
    }

    async fn set_charger_current(&mut self, _chip: ChipIndex, _ma: u16) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn set_charger_voltage(&mut self, _chip: ChipIndex, _mv: u16) -> Result<(), Self::Error> {
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

struct NoopLock;
impl PowerLock for NoopLock {
    fn acquire(&mut self) {}
    fn release(&mut self) {}
}

fn buck_row() -> ProfileRow {
    ProfileRow {
        temp_min: 0,
        temp_max: 450,
        v_min: 3000,
        v_max: 4200,
        chip_index: ChipIndex(0),
        work_current_ma: 500,
        supply_voltage_mv: 0,
    }
}

fn pump_row() -> ProfileRow {
    ProfileRow {
        temp_min: 0,
        temp_max: 450,
        v_min: 3000,
        v_max: 4200,
        chip_index: ChipIndex(1),
        work_current_ma: 920,
        supply_voltage_mv: 0,
    }
}

fn desc_with_row(row: ProfileRow, chip_is_pump: bool) -> ChargerDesc {
    let mut rows = heapless::Vec::new();
    rows.push(row).unwrap();
    let mut profile_tables = heapless::Vec::new();
    profile_tables
        .push(ProfileTable {
            name: "stand",
            mask: 0b1,
            rows,
        })
        .unwrap();

    let mut chip_algorithms = heapless::Vec::new();
    let kind = if chip_is_pump {
        charger_control_service::algorithm::AlgorithmKind::Pump
    } else {
        charger_control_service::algorithm::AlgorithmKind::Buck
    };
    chip_algorithms.push((row.chip_index, kind)).unwrap();

    ChargerDesc {
        polling_interval_ms: 1000,
        fullbatt_capacity: 100,
        fullbatt_current: 0,
        fullbatt_duration_ms: 3000,
        fault_duration_ms: 3000,
        battery_temp_min: -50,
        battery_temp_min_r: 0,
        battery_temp_max: 450,
        battery_temp_max_r: 400,
        skin_temp_min: -50,
        skin_temp_min_r: 0,
        skin_temp_max: 430,
        skin_temp_max_r: 400,
        hysteresis: Hysteresis {
            temp_rise: 0,
            temp_fall: 0,
            vol_rise: 0,
            vol_fall: 0,
        },
        profile_tables,
        fault: ProfileRow {
            temp_min: -600,
            temp_max: 600,
            v_min: 0,
            v_max: 5000,
            chip_index: ChipIndex::NONE,
            work_current_ma: 0,
            supply_voltage_mv: 0,
        },
        chip_algorithms,
        has_supply: true,
        enable_delay_ms: 0,
        temp_vterm: TempVTerm {
            enabled: false,
            bands: heapless::Vec::new(),
        },
        battery_default_param: BatteryDefaultParameter::default(),
    }
}

#[tokio::test]
async fn cold_device_ramps_to_normal_charging_on_plugin() {
    let desc = desc_with_row(buck_row(), false);
    let hw = MockHardware::default();
    let mut mgr = ChargerManager::new(desc, hw, NoopLock).unwrap();

    assert_eq!(mgr.state(), ControlState::Init);
    mgr.run_state(Some(Event::Plugin)).await;
    assert_eq!(mgr.state(), ControlState::Chg);
    assert!(mgr.polling_active);

    mgr.run_state(Some(Event::Tick)).await;
    assert_eq!(mgr.state(), ControlState::Chg);
}

#[tokio::test]
async fn pump_chip_engages_through_the_ramp_handshake() {
    let desc = desc_with_row(pump_row(), true);
    let hw = MockHardware {
        status: ChargerStatus::CHG_EN,
        ..Default::default()
    };
    let mut mgr = ChargerManager::new(desc, hw, NoopLock).unwrap();

    mgr.run_state(Some(Event::Plugin)).await;
    assert_eq!(mgr.state(), ControlState::Chg);
    mgr.run_state(Some(Event::Tick)).await;
    assert_eq!(mgr.state(), ControlState::Chg);
}

#[tokio::test]
async fn skin_over_temperature_forces_lockout_and_recovers() {
    let desc = desc_with_row(buck_row(), false);
    let hw = MockHardware::default();
    let mut mgr = ChargerManager::new(desc, hw, NoopLock).unwrap();
    mgr.run_state(Some(Event::Plugin)).await;
    assert_eq!(mgr.state(), ControlState::Chg);

    let event = mgr.on_skin_sample(SkinSample { skin_temp_dc: 440 });
    assert_eq!(event, Some(Event::OverTemp));
    mgr.run_state(event).await;
    assert_eq!(mgr.state(), ControlState::TempProtect);

    let event = mgr.on_skin_sample(SkinSample { skin_temp_dc: 250 });
    assert_eq!(event, Some(Event::OverTempRecovery));
    mgr.run_state(event).await;
    assert_eq!(mgr.state(), ControlState::Chg);
}

#[tokio::test]
async fn full_battery_holds_then_resumes_charging() {
    let desc = desc_with_row(buck_row(), false);
    let hw = MockHardware {
        battery_capacity_pct: 100,
        battery_current_ma: 0,
        ..Default::default()
    };
    let mut mgr = ChargerManager::new(desc, hw, NoopLock).unwrap();
    mgr.run_state(Some(Event::Plugin)).await;

    let sample = BatterySample {
        voltage_mv: 3700,
        current_ma: 0,
        temperature_dc: 250,
        capacity_pct: 100,
        online: true,
    };
    mgr.on_battery_sample(sample);
    mgr.on_battery_sample(sample);
    mgr.on_battery_sample(sample);
    mgr.run_state(Some(Event::Tick)).await;
    assert_eq!(mgr.state(), ControlState::Full);

    for _ in 0..3 {
        mgr.run_state(Some(Event::Tick)).await;
    }
    assert_eq!(mgr.state(), ControlState::Chg);
}

#[tokio::test]
async fn protocol_discovery_failure_faults_then_recovers() {
    let desc = desc_with_row(buck_row(), false);
    let hw = MockHardware {
        adapter_type_fails: true,
        battery_online: false,
        ..Default::default()
    };
    let mut mgr = ChargerManager::new(desc, hw, NoopLock).unwrap();

    mgr.run_state(Some(Event::Plugin)).await;
    assert_eq!(mgr.state(), ControlState::Fault);

    for _ in 0..3 {
        mgr.run_state(Some(Event::Tick)).await;
    }
    assert_eq!(mgr.state(), ControlState::Init);
}

#[tokio::test]
async fn fault_plugout_reenables_the_adapter() {
    let desc = desc_with_row(buck_row(), false);
    let hw = MockHardware {
        adapter_type_fails: true,
        ..Default::default()
    };
    let mut mgr = ChargerManager::new(desc, hw, NoopLock).unwrap();

    mgr.run_state(Some(Event::Plugin)).await;
    assert_eq!(mgr.state(), ControlState::Fault);

    mgr.run_state(Some(Event::Plugout)).await;
    assert_eq!(mgr.state(), ControlState::Init);
}

#[tokio::test]
async fn plug_removal_during_pump_regulation_stops_the_pump() {
    let desc = desc_with_row(pump_row(), true);
    let hw = MockHardware {
        status: ChargerStatus::CHG_EN,
        ..Default::default()
    };
    let mut mgr = ChargerManager::new(desc, hw, NoopLock).unwrap();

    mgr.run_state(Some(Event::Plugin)).await;
    mgr.run_state(Some(Event::Tick)).await;
    assert_eq!(mgr.state(), ControlState::Chg);

    mgr.run_state(Some(Event::Plugout)).await;
    assert_eq!(mgr.state(), ControlState::Init);
    assert!(!mgr.polling_active);
}
