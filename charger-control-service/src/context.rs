//! The control state machine: five states, driven by events, algorithms and
//! the hardware/telemetry capabilities.

use charger_control_interface::{AdapterType, BatterySample, ChipIndex, Event, SkinSample};

use crate::algorithm::{AlgorithmError, AlgorithmKind, BuckAlgorithm, PumpAlgorithm};
use crate::config::{ChargerDesc, ConfigError};
use crate::hardware::{HardwareError, HardwareIo};
use crate::plot::{PlotSelector, select_vterm_band};
use crate::profile::ProfileRow;
use crate::telemetry::PowerLock;

/// The five control states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlState {
    /// No adapter present; timer stopped, power lock released.
    Init,
    /// Actively charging.
    Chg,
    /// Thermal lockout engaged.
    TempProtect,
    /// Battery reports full; adapter disabled pending the hold timer.
    Full,
    /// A hardware or protocol fault was observed.
    Fault,
}

/// Errors a state handler can encounter while driving hardware or an algorithm.
///
/// Mirrors the split between an algorithmic failure (`Algorithm`) and a bare hardware
/// I/O failure (`Hardware`), matching the inner/outer error shape used throughout
/// this family of control services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StateMachineError {
    /// A `HardwareIo` call failed outside of an algorithm's own call chain.
    Hardware(HardwareError),
    /// An algorithm's `start`/`update`/`stop` call failed.
    Algorithm(AlgorithmError),
}

impl From<HardwareError> for StateMachineError {
    fn from(e: HardwareError) -> Self {
        StateMachineError::Hardware(e)
    }
}

impl From<AlgorithmError> for StateMachineError {
    fn from(e: AlgorithmError) -> Self {
        StateMachineError::Algorithm(e)
    }
}

/// The mutable control state: hardware handles, algorithm instances, cached telemetry
/// and the state machine's own bookkeeping.
///
/// Owns its `ChargerDesc`, its `HardwareIo` handle and its algorithm instances.
/// At most one algorithm is ever "started" at a time, tracked by `curr_algo`.
pub struct ChargerManager<H: HardwareIo, P: PowerLock> {
    desc: ChargerDesc,
    hw: H,
    power_lock: P,
    state: ControlState,
    protocol: AdapterType,
    battery_temp: i16,
    skin_temp: i32,
    temp_protect_lock: bool,
    full_sample_count: u8,
    fullbatt_timer_cnt: u32,
    fault_timer_cnt: u32,
    curr_algo: Option<AlgorithmKind>,
    buck: BuckAlgorithm,
    pump: PumpAlgorithm,
    last_vterm_band: Option<usize>,
    pm_lock: bool,
    /// Set for the duration of a pump-start ramp; `true` while the hardware handshake
    /// owns exclusive access and timer-driven ticks should be left queued rather than
    /// acted on.
    pub delay_lock: bool,
    /// Whether the periodic tick source should currently be running. Entry into `Init`
    /// clears this; `Plugin` sets it. The task loop that owns the ticker reads this.
    pub polling_active: bool,
}

impl<H: HardwareIo, P: PowerLock> ChargerManager<H, P> {
    /// Builds a new manager, validating `desc` once.
    pub fn new(desc: ChargerDesc, hw: H, power_lock: P) -> Result<Self, ConfigError> {
        desc.validate()?;
        let buck_chip = desc
            .chip_algorithms
            .iter()
            .find(|(_, kind)| *kind == AlgorithmKind::Buck)
            .map(|(c, _)| *c)
            .unwrap_or(ChipIndex::NONE);
        let pump_chip = desc
            .chip_algorithms
            .iter()
            .find(|(_, kind)| *kind == AlgorithmKind::Pump)
            .map(|(c, _)| *c)
            .unwrap_or(ChipIndex::NONE);
        Ok(Self {
            desc,
            hw,
            power_lock,
            state: ControlState::Init,
            protocol: AdapterType(0),
            battery_temp: 0,
            skin_temp: 0,
            temp_protect_lock: false,
            full_sample_count: 0,
            fullbatt_timer_cnt: 0,
            fault_timer_cnt: 0,
            curr_algo: None,
            buck: BuckAlgorithm::new(buck_chip),
            pump: PumpAlgorithm::new(pump_chip),
            last_vterm_band: None,
            pm_lock: false,
            delay_lock: false,
            polling_active: false,
        })
    }

    /// The current control state.
    pub fn state(&self) -> ControlState {
        self.state
    }

    /// The configured polling interval, in milliseconds.
    pub fn polling_interval_ms(&self) -> u32 {
        self.desc.polling_interval_ms
    }

    /// Applies a battery telemetry sample: updates the full-detection jitter filter and
    /// runs the shared thermal-lockout check.
    pub fn on_battery_sample(&mut self, sample: BatterySample) -> Option<Event> {
        let (capacity, current) = if sample.online {
            (sample.capacity_pct, sample.current_ma)
        } else {
            (
                self.desc.battery_default_param.capacity,
                self.desc.battery_default_param.current,
            )
        };

        if capacity == self.desc.fullbatt_capacity && current >= 0 && current <= self.desc.fullbatt_current {
            self.full_sample_count = self.full_sample_count.saturating_add(1);
        } else {
            self.full_sample_count = 0;
        }

        None
    }

    /// Applies a skin telemetry sample and runs the shared thermal-lockout check.
    pub fn on_skin_sample(&mut self, sample: SkinSample) -> Option<Event> {
        self.skin_temp = sample.skin_temp_dc;
        self.check_temp_event()
    }

    /// Returns true once three consecutive qualifying battery samples have been seen.
    fn check_battery_full(&self) -> bool {
        self.full_sample_count >= 3
    }

    /// Over-temperature lockout check (§ thermal and fullness policies): uses the
    /// recovery thresholds while already latched, the primary thresholds otherwise.
    /// Returns the edge-triggered event, if the lockout just engaged or just cleared.
    fn check_temp_event(&mut self) -> Option<Event> {
        let d = &self.desc;
        let (bmin, bmax, smin, smax) = if self.temp_protect_lock {
            (d.battery_temp_min_r, d.battery_temp_max_r, d.skin_temp_min_r, d.skin_temp_max_r)
        } else {
            (d.battery_temp_min, d.battery_temp_max, d.skin_temp_min, d.skin_temp_max)
        };

        let bad = self.battery_temp <= bmin
            || self.battery_temp >= bmax
            || i32::from(self.skin_temp) <= smin
            || i32::from(self.skin_temp) >= smax;

        if bad && !self.temp_protect_lock {
            self.temp_protect_lock = true;
            Some(Event::OverTemp)
        } else if !bad && self.temp_protect_lock {
            self.temp_protect_lock = false;
            Some(Event::OverTempRecovery)
        } else {
            None
        }
    }

    async fn refresh_protocol(&mut self) -> Result<AdapterType, HardwareError> {
        self.hw.get_adapter_type().await.map_err(Into::into)
    }

    /// Runs the state machine to quiescence for one input event, re-invoking the
    /// destination state with `None` on every transition until the state stabilises.
    pub async fn run_state(&mut self, event: Option<Event>) {
        let mut pending = event;
        loop {
            let before = self.state;
            let after = match before {
                ControlState::Init => self.state_init(pending).await,
                ControlState::Chg => self.state_chg(pending).await,
                ControlState::TempProtect => self.state_temp_protect(pending).await,
                ControlState::Full => self.state_full(pending).await,
                ControlState::Fault => self.state_fault(pending).await,
            };
            self.state = after;
            if after == before {
                break;
            }
            pending = None;
        }
    }

    async fn state_init(&mut self, event: Option<Event>) -> ControlState {
        match event {
            None => {
                self.polling_active = false;
                if self.pm_lock {
                    self.power_lock.release();
                    self.pm_lock = false;
                }
                ControlState::Init
            }
            Some(Event::Plugin) => {
                self.polling_active = true;
                if !self.pm_lock {
                    self.power_lock.acquire();
                    self.pm_lock = true;
                }
                let refreshed = self.refresh_protocol().await;
                if let Ok(protocol) = refreshed {
                    self.protocol = protocol;
                }
                if self.temp_protect_lock {
                    ControlState::TempProtect
                } else if refreshed.is_err() {
                    ControlState::Fault
                } else {
                    ControlState::Chg
                }
            }
            _ => ControlState::Init,
        }
    }

    async fn state_chg(&mut self, event: Option<Event>) -> ControlState {
        match event {
            Some(Event::Tick) => self.chg_proc().await,
            Some(Event::Plugout) => {
                self.stop_current_algorithm().await;
                ControlState::Init
            }
            Some(Event::OverTemp) => {
                self.stop_current_algorithm().await;
                ControlState::TempProtect
            }
            _ => ControlState::Chg,
        }
    }

    async fn chg_proc(&mut self) -> ControlState {
        if self.check_battery_full() {
            self.stop_current_algorithm().await;
            return ControlState::Full;
        }

        match self.refresh_protocol().await {
            Ok(protocol) => self.protocol = protocol,
            Err(_) => {
                self.stop_current_algorithm().await;
                return ControlState::Fault;
            }
        }

        let temp = match self.hw.get_battery_temperature().await {
            Ok(t) => t,
            Err(_) => {
                self.stop_current_algorithm().await;
                return ControlState::Fault;
            }
        };
        self.battery_temp = temp;
        if let Some(Event::OverTemp) = self.check_temp_event() {
            self.stop_current_algorithm().await;
            return ControlState::TempProtect;
        }

        self.update_termination_voltage().await;

        let voltage = match self.hw.get_battery_voltage().await {
            Ok(v) => v,
            Err(_) => {
                self.stop_current_algorithm().await;
                return ControlState::Fault;
            }
        };

        let last_row = self.current_last_row();
        let row = PlotSelector::select(
            &self.desc.profile_tables,
            self.battery_temp,
            voltage,
            self.protocol.mask_bit(),
            last_row,
            self.desc.hysteresis,
        );

        let Some(row) = row else {
            self.stop_current_algorithm().await;
            return ControlState::Chg;
        };
        if row.chip_index.is_none() {
            self.stop_current_algorithm().await;
            return ControlState::Chg;
        }

        match self.drive_row(row).await {
            Ok(()) => ControlState::Chg,
            Err(_) => {
                self.stop_current_algorithm().await;
                ControlState::Fault
            }
        }
    }

    /// While actively charging, re-selects the termination-voltage band for the current
    /// battery temperature and, if it changed, pushes the new voltage to the buck chip.
    ///
    /// A no-op when `temp_vterm` is disabled or the temperature falls below the lowest
    /// band (no data to act on).
    async fn update_termination_voltage(&mut self) {
        if !self.desc.temp_vterm.enabled {
            return;
        }
        let Ok(idx) = select_vterm_band(
            &self.desc.temp_vterm,
            self.battery_temp,
            self.last_vterm_band,
            self.desc.hysteresis.temp_rise,
            self.desc.hysteresis.temp_fall,
        ) else {
            return;
        };
        if self.last_vterm_band == Some(idx) {
            return;
        }
        let Some(band) = self.desc.temp_vterm.bands.get(idx) else {
            return;
        };
        if self.hw.set_charger_voltage(self.buck.chip(), band.term_mv).await.is_ok() {
            self.last_vterm_band = Some(idx);
        }
    }

    fn current_last_row(&self) -> Option<ProfileRow> {
        match self.curr_algo {
            Some(AlgorithmKind::Buck) => self.buck.last_row(),
            Some(AlgorithmKind::Pump) => self.pump.last_row(),
            None => None,
        }
    }

    /// Starts, switches to, or updates the algorithm named by `row.chip_index`.
    async fn drive_row(&mut self, row: ProfileRow) -> Result<(), StateMachineError> {
        let Some(kind) = self.desc.algorithm_for(row.chip_index) else {
            return Err(StateMachineError::Algorithm(AlgorithmError::NoProfileMatch));
        };

        if self.curr_algo != Some(kind) {
            self.stop_current_algorithm().await;
            self.enforce_exclusive(row.chip_index).await?;
            self.start_algorithm(kind).await?;
            self.curr_algo = Some(kind);
        }

        self.update_current_algorithm(row).await
    }

    /// Guarantees `enable_charger(j, false)` has completed for every configured chip
    /// other than `chip` before a subsequent `enable_charger(chip, true)`.
    async fn enforce_exclusive(&mut self, chip: ChipIndex) -> Result<(), StateMachineError> {
        let mut others: heapless::Vec<ChipIndex, { crate::config::MAX_CHIPS }> = heapless::Vec::new();
        for other in self.desc.other_chips(chip) {
            let _ = others.push(other);
        }
        for other in others {
            self.hw.enable_charger(other, false).await.map_err(Into::into)?;
        }
        Ok(())
    }

    async fn start_algorithm(&mut self, kind: AlgorithmKind) -> Result<(), StateMachineError> {
        match kind {
            AlgorithmKind::Buck => self.buck.start(&mut self.hw, self.desc.has_supply).await?,
            AlgorithmKind::Pump => {
                self.delay_lock = true;
                let result = self.pump.start(&mut self.hw).await;
                self.delay_lock = false;
                result?
            }
        }
        Ok(())
    }

    async fn update_current_algorithm(&mut self, row: ProfileRow) -> Result<(), StateMachineError> {
        match self.curr_algo {
            Some(AlgorithmKind::Buck) => self.buck.update(&mut self.hw, &row, self.desc.has_supply).await?,
            Some(AlgorithmKind::Pump) => self.pump.update(&mut self.hw, &row).await?,
            None => {}
        }
        Ok(())
    }

    async fn stop_current_algorithm(&mut self) {
        match self.curr_algo.take() {
            Some(AlgorithmKind::Buck) => {
                let _ = self.buck.stop(&mut self.hw, self.desc.has_supply).await;
            }
            Some(AlgorithmKind::Pump) => {
                let _ = self.pump.stop(&mut self.hw).await;
            }
            None => {}
        }
    }

    async fn recover_from_lockout(&mut self) -> ControlState {
        let _ = self.hw.enable_adapter(true).await;
        match self.hw.get_battery_online().await {
            Ok(true) => ControlState::Chg,
            _ => ControlState::Init,
        }
    }

    async fn state_temp_protect(&mut self, event: Option<Event>) -> ControlState {
        match event {
            None => {
                for (chip, _) in self.desc.chip_algorithms.clone() {
                    let _ = self.hw.enable_charger(chip, false).await;
                }
                let _ = self.hw.enable_adapter(false).await;
                self.curr_algo = None;
                ControlState::TempProtect
            }
            Some(Event::OverTempRecovery) => self.recover_from_lockout().await,
            Some(Event::Tick) => {
                if let Ok(temp) = self.hw.get_battery_temperature().await {
                    self.battery_temp = temp;
                }
                if let Some(Event::OverTempRecovery) = self.check_temp_event() {
                    self.recover_from_lockout().await
                } else {
                    ControlState::TempProtect
                }
            }
            _ => ControlState::TempProtect,
        }
    }

    async fn state_full(&mut self, event: Option<Event>) -> ControlState {
        match event {
            None => {
                let _ = self.hw.enable_adapter(false).await;
                self.fullbatt_timer_cnt = 0;
                ControlState::Full
            }
            Some(Event::Tick) => {
                self.fullbatt_timer_cnt += 1;
                if u64::from(self.fullbatt_timer_cnt) * u64::from(self.desc.polling_interval_ms)
                    >= u64::from(self.desc.fullbatt_duration_ms)
                {
                    let _ = self.hw.enable_adapter(true).await;
                    match self.hw.get_battery_online().await {
                        Ok(true) => ControlState::Chg,
                        _ => ControlState::Init,
                    }
                } else {
                    ControlState::Full
                }
            }
            Some(Event::OverTemp) => ControlState::TempProtect,
            Some(Event::Plugout) => {
                let _ = self.hw.enable_adapter(true).await;
                ControlState::Init
            }
            _ => ControlState::Full,
        }
    }

    async fn state_fault(&mut self, event: Option<Event>) -> ControlState {
        match event {
            None => {
                self.fault_timer_cnt = 0;
                self.check_fault_plot().await;
                ControlState::Fault
            }
            Some(Event::Tick) => {
                if self.check_battery_full() {
                    self.stop_current_algorithm().await;
                    return ControlState::Full;
                }
                self.fault_timer_cnt += 1;
                if u64::from(self.fault_timer_cnt) * u64::from(self.desc.polling_interval_ms)
                    >= u64::from(self.desc.fault_duration_ms)
                {
                    self.stop_current_algorithm().await;
                    let _ = self.hw.enable_adapter(true).await;
                    match self.hw.get_battery_online().await {
                        Ok(true) => ControlState::Chg,
                        _ => ControlState::Init,
                    }
                } else {
                    ControlState::Fault
                }
            }
            Some(Event::OverTemp) => {
                self.stop_current_algorithm().await;
                ControlState::TempProtect
            }
            Some(Event::Plugout) => {
                self.stop_current_algorithm().await;
                let _ = self.hw.enable_adapter(true).await;
                ControlState::Init
            }
            _ => ControlState::Fault,
        }
    }

    /// Probes `desc.fault`: if the current reading falls inside it, drive the
    /// fault-profile algorithm; otherwise disable every charger and the adapter.
    ///
    /// Written idempotently so it is safe to re-run on every `FAULT` entry, including a
    /// `FAULT -> FAULT` self-loop.
    async fn check_fault_plot(&mut self) {
        let temp = self.hw.get_battery_temperature().await.unwrap_or(self.battery_temp);
        let voltage = self.hw.get_battery_voltage().await.unwrap_or(0);
        self.battery_temp = temp;

        let fault_row = self.desc.fault;
        if fault_row.contains(temp, voltage) && fault_row.chip_index.index().is_some() {
            if let Some(kind) = self.desc.algorithm_for(fault_row.chip_index) {
                if self.curr_algo != Some(kind) {
                    self.stop_current_algorithm().await;
                    if self.enforce_exclusive(fault_row.chip_index).await.is_ok()
                        && self.start_algorithm(kind).await.is_ok()
                    {
                        self.curr_algo = Some(kind);
                    }
                }
                let _ = self.update_current_algorithm(fault_row).await;
            }
        } else {
            self.stop_current_algorithm().await;
            for (chip, _) in self.desc.chip_algorithms.clone() {
                let _ = self.hw.enable_charger(chip, false).await;
            }
            let _ = self.hw.enable_adapter(false).await;
        }
    }
}
